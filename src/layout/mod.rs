mod engine;
mod entity;
mod forces;
mod label;
mod registry;
mod relationships;
mod settings;
mod visibility;

pub use engine::{FrameStats, LayoutEngine};
pub use entity::Entity;
pub use label::{LABEL_PALETTE, LabelRegistry, Rgb, SavedLabelSettings, UNLABELLED_COLOR};
pub use registry::NodeHandle;
pub use relationships::TubeMesh;
pub use settings::ForceSettings;
pub use visibility::has_visible_label;
