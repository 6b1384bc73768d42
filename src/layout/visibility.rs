use super::entity::Entity;
use super::label::LabelRegistry;
use super::registry::NodeRegistry;

/// Entities with a bound render handle and at least one visible label, in
/// input order. Entities still waiting for a handle are skipped silently.
pub fn active_set<'a>(
    entities: &'a [Entity],
    labels: &LabelRegistry,
    nodes: &NodeRegistry,
) -> Vec<&'a Entity> {
    entities
        .iter()
        .filter(|entity| nodes.is_registered(&entity.id) && has_visible_label(entity, labels))
        .collect()
}

pub fn has_visible_label(entity: &Entity, labels: &LabelRegistry) -> bool {
    entity.labels.iter().any(|name| labels.is_visible(name))
}

/// Labels carried by both entities and visible in the registry, in `first`'s order.
pub fn shared_visible_labels<'a>(
    first: &'a Entity,
    second: &Entity,
    labels: &LabelRegistry,
) -> Vec<&'a str> {
    first
        .labels
        .iter()
        .filter(|name| second.has_label(name) && labels.is_visible(name))
        .map(String::as_str)
        .collect()
}

pub fn first_shared_visible_label<'a>(
    first: &'a Entity,
    second: &Entity,
    labels: &LabelRegistry,
) -> Option<&'a str> {
    first
        .labels
        .iter()
        .find(|name| second.has_label(name) && labels.is_visible(name))
        .map(String::as_str)
}
