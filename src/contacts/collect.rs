use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use glam::Vec3;

use crate::layout::{Entity, ForceSettings, SavedLabelSettings};
use crate::util::stable_unit_triple;

use super::dataset::{ContactProfile, Dataset};
use super::parse::{RawContact, normalize_tags, parse_contacts};

/// Half-width of the cube that unplaced contacts are seeded into.
const SEED_EXTENT: f32 = 5.0;

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read contacts from {}", path.display()))?;
    let contacts = parse_contacts(&raw)
        .with_context(|| format!("failed to parse contacts in {}", path.display()))?;

    let dataset = build_dataset(contacts)?;
    log::info!(
        "loaded {} contacts from {}",
        dataset.len(),
        path.display()
    );
    Ok(dataset)
}

fn build_dataset(contacts: Vec<RawContact>) -> Result<Dataset> {
    let entries = contacts.into_iter().enumerate().map(|(index, contact)| {
        let id = contact
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("contact_{index}"));
        let position = contact
            .position
            .map(Vec3::from_array)
            .filter(|position| position.is_finite())
            .unwrap_or_else(|| seed_position(&id));
        let profile = ContactProfile {
            name: contact
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_owned()),
            email: contact.email,
            phone: contact.phone,
        };

        (
            Entity::new(id, normalize_tags(contact.tags), position),
            profile,
        )
    });

    Dataset::from_contacts(entries).map_err(|id| anyhow!("duplicate contact id {id:?}"))
}

/// Deterministic starting point inside the seed cube, derived from the id.
fn seed_position(id: &str) -> Vec3 {
    let (x, y, z) = stable_unit_triple(id);
    Vec3::new(x, y, z) * SEED_EXTENT
}

/// Saved label colour/visibility. A missing file is an empty map.
pub fn load_tag_settings(path: &Path) -> Result<SavedLabelSettings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Ok(SavedLabelSettings::new());
        }
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read tag settings from {}", path.display()));
        }
    };

    serde_json::from_str(&raw)
        .with_context(|| format!("invalid tag settings JSON in {}", path.display()))
}

pub fn save_tag_settings(path: &Path, settings: &SavedLabelSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings).context("failed to encode tag settings")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write tag settings to {}", path.display()))?;
    log::debug!("saved {} tag settings to {}", settings.len(), path.display());
    Ok(())
}

pub fn load_force_settings(path: &Path) -> Result<ForceSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read force settings from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid force settings JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::layout::{LabelRegistry, Rgb};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "relation-graph-{}-{name}",
            std::process::id()
        ))
    }

    #[test]
    fn fills_missing_ids_names_and_positions() {
        let contacts = vec![
            RawContact {
                tags: vec!["x".to_owned()],
                ..RawContact::default()
            },
            RawContact {
                id: Some("b".to_owned()),
                name: Some("Bea".to_owned()),
                position: Some([1.0, 2.0, 3.0]),
                ..RawContact::default()
            },
        ];

        let dataset = build_dataset(contacts).unwrap();
        let first = dataset.entity("contact_0").unwrap();
        assert_eq!(dataset.profile("contact_0").unwrap().name, "Unknown");
        assert!(first.initial_position.abs().max_element() <= SEED_EXTENT);
        assert_eq!(first.initial_position, seed_position("contact_0"));
        assert_eq!(
            dataset.entity("b").unwrap().initial_position,
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn duplicate_ids_fail() {
        let contacts = vec![
            RawContact {
                id: Some("same".to_owned()),
                ..RawContact::default()
            },
            RawContact {
                id: Some("same".to_owned()),
                ..RawContact::default()
            },
        ];
        let error = build_dataset(contacts).unwrap_err();
        assert!(error.to_string().contains("same"));
    }

    #[test]
    fn tag_settings_survive_save_and_load() {
        let path = scratch_path("tags.json");
        let _ = fs::remove_file(&path);
        assert!(load_tag_settings(&path).unwrap().is_empty());

        let mut labels = LabelRegistry::new();
        labels.add("family", Rgb::new(0x10, 0xb9, 0x81));
        labels.toggle("family");
        save_tag_settings(&path, &labels.settings()).unwrap();

        let loaded = load_tag_settings(&path).unwrap();
        assert_eq!(loaded, labels.settings());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_dataset_reports_path_on_failure() {
        let path = scratch_path("broken.json");
        fs::write(&path, "{\"contacts\": 7}").unwrap();
        let error = load_dataset(&path).unwrap_err();
        assert!(format!("{error:#}").contains("broken.json"));
        let _ = fs::remove_file(&path);
    }
}
