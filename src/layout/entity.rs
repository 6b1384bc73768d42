use glam::Vec3;

/// A graph node as the layout sees it. Velocity lives in the node registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: String,
    /// Order matters: it breaks ties when picking a relationship colour.
    pub labels: Vec<String>,
    pub initial_position: Vec3,
}

impl Entity {
    pub fn new<S: Into<String>>(
        id: impl Into<String>,
        labels: impl IntoIterator<Item = S>,
        initial_position: Vec3,
    ) -> Self {
        Self {
            id: id.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            initial_position,
        }
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }

    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}
