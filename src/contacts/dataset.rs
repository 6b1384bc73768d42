use std::collections::HashMap;

use crate::layout::Entity;

use super::parse::normalize_tags;

/// Display-only contact details.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactProfile {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Loaded contacts: layout entities plus their profiles, index-aligned.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    entities: Vec<Entity>,
    profiles: Vec<ContactProfile>,
    index_by_id: HashMap<String, usize>,
}

impl Dataset {
    /// Fails with the offending id when two contacts share one.
    pub(super) fn from_contacts(
        contacts: impl IntoIterator<Item = (Entity, ContactProfile)>,
    ) -> Result<Self, String> {
        let mut dataset = Self::default();
        for (entity, profile) in contacts {
            if dataset.index_by_id.contains_key(&entity.id) {
                return Err(entity.id);
            }
            dataset
                .index_by_id
                .insert(entity.id.clone(), dataset.entities.len());
            dataset.entities.push(entity);
            dataset.profiles.push(profile);
        }
        Ok(dataset)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.index_by_id.get(id).map(|&index| &self.entities[index])
    }

    pub fn profile(&self, id: &str) -> Option<&ContactProfile> {
        self.index_by_id.get(id).map(|&index| &self.profiles[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Entity, &ContactProfile)> {
        self.entities.iter().zip(self.profiles.iter())
    }

    /// Replaces a contact's labels. Returns `false` for an unknown id.
    pub fn set_contact_tags(&mut self, id: &str, tags: impl IntoIterator<Item = String>) -> bool {
        let Some(&index) = self.index_by_id.get(id) else {
            return false;
        };
        self.entities[index].labels = normalize_tags(tags);
        true
    }

    /// Strips `label` from every contact; returns how many carried it.
    pub fn remove_label(&mut self, label: &str) -> usize {
        let mut stripped = 0;
        for entity in &mut self.entities {
            let before = entity.labels.len();
            entity.labels.retain(|name| name != label);
            stripped += before - entity.labels.len();
        }
        stripped
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn contact(id: &str, tags: &[&str]) -> (Entity, ContactProfile) {
        (
            Entity::new(id, tags.iter().copied(), Vec3::ZERO),
            ContactProfile {
                name: id.to_uppercase(),
                ..ContactProfile::default()
            },
        )
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Dataset::from_contacts([contact("a", &[]), contact("a", &["x"])]);
        assert_eq!(result.err().as_deref(), Some("a"));
    }

    #[test]
    fn looks_up_aligned_profiles() {
        let dataset = Dataset::from_contacts([contact("a", &["x"]), contact("b", &[])]).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.profile("b").map(|profile| profile.name.as_str()), Some("B"));
        assert_eq!(dataset.entity("a").map(|entity| entity.labels.len()), Some(1));
        assert!(dataset.profile("zzz").is_none());
    }

    #[test]
    fn set_contact_tags_normalizes() {
        let mut dataset = Dataset::from_contacts([contact("a", &["x"])]).unwrap();
        let updated = dataset.set_contact_tags("a", ["y ".to_owned(), "y".to_owned(), "z".to_owned()]);
        assert!(updated);
        assert_eq!(dataset.entity("a").unwrap().labels, ["y", "z"]);
        assert!(!dataset.set_contact_tags("missing", Vec::new()));
    }

    #[test]
    fn remove_label_strips_every_contact() {
        let mut dataset =
            Dataset::from_contacts([contact("a", &["x", "y"]), contact("b", &["x"]), contact("c", &["y"])])
                .unwrap();
        assert_eq!(dataset.remove_label("x"), 2);
        assert_eq!(dataset.entity("a").unwrap().labels, ["y"]);
        assert!(dataset.entity("b").unwrap().labels.is_empty());
        assert_eq!(dataset.remove_label("x"), 0);
    }
}
