mod collect;
mod dataset;
mod parse;

pub use collect::{load_dataset, load_force_settings, load_tag_settings, save_tag_settings};
pub use dataset::Dataset;
