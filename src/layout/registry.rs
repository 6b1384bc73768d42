use std::collections::HashMap;

use glam::Vec3;

/// Opaque token the render boundary hands out for a mounted node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug)]
struct NodeSlot {
    id: String,
    handle: Option<NodeHandle>,
    position: Vec3,
    /// Created the first time the entity is simulated.
    velocity: Option<Vec3>,
}

/// Position and velocity store keyed by entity id.
///
/// Slots live in a contiguous vector; `index_by_id` maps ids onto it. A slot
/// outlives its handle, so an entity that is unmounted and mounted again
/// resumes where it stopped instead of snapping back to its seed position.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    slots: Vec<NodeSlot>,
    index_by_id: HashMap<String, usize>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handle` to `id`. `initial_position` seeds the slot only when the
    /// id has never been seen; returns the handle that was bound before.
    pub fn register(
        &mut self,
        id: &str,
        handle: NodeHandle,
        initial_position: Vec3,
    ) -> Option<NodeHandle> {
        if let Some(&index) = self.index_by_id.get(id) {
            return self.slots[index].handle.replace(handle);
        }

        let position = if initial_position.is_finite() {
            initial_position
        } else {
            log::warn!("node {id} registered with non-finite position; seeding at origin");
            Vec3::ZERO
        };

        log::debug!("node {id} registered as handle {}", handle.raw());
        self.index_by_id.insert(id.to_owned(), self.slots.len());
        self.slots.push(NodeSlot {
            id: id.to_owned(),
            handle: Some(handle),
            position,
            velocity: None,
        });
        None
    }

    /// Releases the handle but keeps position and velocity for a later return.
    pub fn unregister(&mut self, id: &str) -> Option<NodeHandle> {
        let index = *self.index_by_id.get(id)?;
        let released = self.slots[index].handle.take();
        if released.is_some() {
            log::debug!("node {id} unregistered");
        }
        released
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.handle(id).is_some()
    }

    pub fn handle(&self, id: &str) -> Option<NodeHandle> {
        self.slot(id).and_then(|slot| slot.handle)
    }

    /// Current position of a registered node; `None` when no handle is bound.
    pub fn position(&self, id: &str) -> Option<Vec3> {
        self.slot(id)
            .filter(|slot| slot.handle.is_some())
            .map(|slot| slot.position)
    }

    /// Last simulated velocity, kept across unregistration.
    pub fn velocity(&self, id: &str) -> Option<Vec3> {
        self.slot(id).and_then(|slot| slot.velocity)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn registered_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.handle.is_some()).count()
    }

    pub fn iter_registered(&self) -> impl Iterator<Item = (&str, NodeHandle, Vec3)> {
        self.slots.iter().filter_map(|slot| {
            slot.handle
                .map(|handle| (slot.id.as_str(), handle, slot.position))
        })
    }

    /// Forgets every slot whose id fails `keep`, handle or not.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let mut index = 0;
        while index < self.slots.len() {
            if keep(&self.slots[index].id) {
                index += 1;
                continue;
            }

            let removed = self.slots.swap_remove(index);
            self.index_by_id.remove(&removed.id);
            if let Some(moved) = self.slots.get(index) {
                self.index_by_id.insert(moved.id.clone(), index);
            }
        }
    }

    pub(super) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(super) fn state_at(&self, index: usize) -> (Vec3, Vec3) {
        let slot = &self.slots[index];
        (slot.position, slot.velocity.unwrap_or(Vec3::ZERO))
    }

    pub(super) fn ensure_velocity_at(&mut self, index: usize) {
        self.slots[index].velocity.get_or_insert(Vec3::ZERO);
    }

    pub(super) fn write_state_at(&mut self, index: usize, position: Vec3, velocity: Vec3) {
        let slot = &mut self.slots[index];
        slot.position = position;
        slot.velocity = Some(velocity);
    }

    fn slot(&self, id: &str) -> Option<&NodeSlot> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.slots.get(index))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn unknown_and_unregistered_ids_are_absent() {
        let mut nodes = NodeRegistry::new();
        assert_eq!(nodes.position("nobody"), None);

        nodes.register("a", NodeHandle::new(1), Vec3::X);
        assert_eq!(nodes.position("a"), Some(Vec3::X));
        assert_eq!(nodes.unregister("a"), Some(NodeHandle::new(1)));
        assert_eq!(nodes.position("a"), None);
        assert!(!nodes.is_registered("a"));
        assert_eq!(nodes.unregister("a"), None);
    }

    #[test]
    fn re_registration_keeps_stored_position() {
        let mut nodes = NodeRegistry::new();
        nodes.register("a", NodeHandle::new(1), Vec3::X);
        let index = nodes.index_of("a").unwrap();
        nodes.write_state_at(index, Vec3::Y, Vec3::Z);

        nodes.unregister("a");
        let previous = nodes.register("a", NodeHandle::new(2), Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(previous, None);
        assert_eq!(nodes.position("a"), Some(Vec3::Y));
        assert_eq!(nodes.velocity("a"), Some(Vec3::Z));
        assert_eq!(nodes.handle("a"), Some(NodeHandle::new(2)));
    }

    #[test]
    fn velocity_is_created_lazily() {
        let mut nodes = NodeRegistry::new();
        nodes.register("a", NodeHandle::new(1), Vec3::ZERO);
        assert_eq!(nodes.velocity("a"), None);

        let index = nodes.index_of("a").unwrap();
        nodes.ensure_velocity_at(index);
        assert_eq!(nodes.velocity("a"), Some(Vec3::ZERO));
    }

    #[test]
    fn non_finite_seed_position_lands_at_origin() {
        let mut nodes = NodeRegistry::new();
        nodes.register("a", NodeHandle::new(1), Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(nodes.position("a"), Some(Vec3::ZERO));
    }

    #[test]
    fn retain_fixes_up_moved_indices() {
        let mut nodes = NodeRegistry::new();
        for (raw, id) in ["a", "b", "c", "d"].into_iter().enumerate() {
            nodes.register(id, NodeHandle::new(raw as u64), Vec3::splat(raw as f32));
        }

        nodes.retain(|id| id != "a" && id != "c");

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.position("a"), None);
        assert_eq!(nodes.position("b"), Some(Vec3::splat(1.0)));
        assert_eq!(nodes.position("d"), Some(Vec3::splat(3.0)));
        assert_eq!(nodes.handle("d"), Some(NodeHandle::new(3)));
        assert_eq!(nodes.registered_count(), 2);
    }
}
