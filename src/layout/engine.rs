use super::entity::Entity;
use super::forces::ForceEngine;
use super::label::LabelRegistry;
use super::registry::NodeRegistry;
use super::relationships::{DrawableMap, RelationshipLayer};
use super::settings::ForceSettings;
use super::visibility::active_set;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub active: usize,
    pub relationships: usize,
    pub color_groups: usize,
    pub moving: bool,
}

/// Runs one frame of the layout: filter, step, then rebuild relationship
/// geometry from the freshly integrated positions.
#[derive(Default)]
pub struct LayoutEngine {
    nodes: NodeRegistry,
    forces: ForceEngine,
    relationships: RelationshipLayer,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            nodes: NodeRegistry::new(),
            forces: ForceEngine::new(),
            relationships: RelationshipLayer::new(),
        }
    }

    pub fn frame(
        &mut self,
        entities: &[Entity],
        labels: &LabelRegistry,
        settings: &ForceSettings,
        dt: f32,
    ) -> FrameStats {
        let active = active_set(entities, labels, &self.nodes);
        let moving = self
            .forces
            .step(&mut self.nodes, &active, labels, settings, dt);
        self.relationships
            .rebuild(&active, labels, settings, &self.nodes);

        FrameStats {
            active: active.len(),
            relationships: self.relationships.relationship_count(),
            color_groups: self.relationships.color_groups(),
            moving,
        }
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    /// Registration access for the render boundary.
    pub fn nodes_mut(&mut self) -> &mut NodeRegistry {
        &mut self.nodes
    }

    pub fn drawables(&self) -> &DrawableMap {
        self.relationships.drawables()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::layout::label::Rgb;
    use crate::layout::registry::NodeHandle;

    #[test]
    fn frame_runs_filter_step_and_rebuild_in_order() {
        let entities = vec![
            Entity::new("a", ["x"], Vec3::ZERO),
            Entity::new("b", ["x"], Vec3::new(6.0, 0.0, 0.0)),
            Entity::new("c", ["y"], Vec3::new(0.0, 4.0, 0.0)),
            Entity::new("pending", ["x"], Vec3::new(0.0, 0.0, 4.0)),
        ];
        let mut labels = LabelRegistry::new();
        labels.add("x", Rgb::new(1, 1, 1));
        labels.add("y", Rgb::new(2, 2, 2));
        labels.set_visible("y", false);

        let mut engine = LayoutEngine::new();
        for (raw, entity) in entities.iter().take(3).enumerate() {
            engine
                .nodes_mut()
                .register(&entity.id, NodeHandle::new(raw as u64), entity.initial_position);
        }

        let stats = engine.frame(&entities, &labels, &ForceSettings::default(), 1.0 / 60.0);

        assert_eq!(stats.active, 2);
        assert_eq!(stats.relationships, 1);
        assert_eq!(stats.color_groups, 1);
        assert!(stats.moving);

        let segment = &engine.drawables()[&Rgb::new(1, 1, 1)].segments[0];
        assert_eq!(Some(segment.end), engine.nodes().position("b"));
        assert_ne!(segment.end, Vec3::new(6.0, 0.0, 0.0));

        assert_eq!(engine.nodes().position("c"), Some(Vec3::new(0.0, 4.0, 0.0)));
        assert_eq!(engine.nodes().velocity("c"), None);
        assert_eq!(engine.nodes().position("pending"), None);
    }
}
