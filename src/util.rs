use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Three values in `[-1, 1]` derived from a hash of `id`.
pub fn stable_unit_triple(id: &str) -> (f32, f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let channel = |shift: u32| {
        let bits = (hash >> shift) & 0x1f_ffff;
        ((bits as f64 / 0x1f_ffff as f64) as f32 * 2.0) - 1.0
    };
    (channel(0), channel(21), channel(42))
}
