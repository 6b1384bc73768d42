use std::collections::BTreeMap;

use glam::{Quat, Vec3};

use super::entity::Entity;
use super::label::{LabelRegistry, Rgb};
use super::registry::NodeRegistry;
use super::settings::ForceSettings;
use super::visibility::shared_visible_labels;

/// Tube radius of a drawn relationship, matching the node sphere radius.
pub const CONNECTION_RADIUS: f32 = 0.3;
pub const CONNECTION_RADIAL_SEGMENTS: u32 = 8;
pub const CONNECTION_OPACITY: f32 = 0.15;

/// Two active entities sharing at least one visible label.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship<'a> {
    pub first: &'a Entity,
    pub second: &'a Entity,
    /// Shared visible labels in `first`'s label order; never empty.
    pub shared_labels: Vec<&'a str>,
}

impl Relationship<'_> {
    pub fn primary_label(&self) -> &str {
        self.shared_labels[0]
    }
}

/// Every related pair in the active set, in pair order `(i, j)` with `i < j`.
pub fn relationships<'a>(active: &[&'a Entity], labels: &LabelRegistry) -> Vec<Relationship<'a>> {
    let mut found = Vec::new();
    for (i, &first) in active.iter().enumerate() {
        for &second in &active[(i + 1)..] {
            let shared_labels = shared_visible_labels(first, second, labels);
            if !shared_labels.is_empty() {
                found.push(Relationship {
                    first,
                    second,
                    shared_labels,
                });
            }
        }
    }
    found
}

/// A tube between two node positions, oriented along local +Y.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSegment {
    pub first_id: String,
    pub second_id: String,
    pub start: Vec3,
    pub end: Vec3,
    pub midpoint: Vec3,
    pub length: f32,
    /// Rotates +Y onto the start→end direction. Identity for zero-length segments.
    pub rotation: Quat,
    pub radius: f32,
}

impl ConnectionSegment {
    fn between(first_id: &str, second_id: &str, start: Vec3, end: Vec3) -> Self {
        let delta = end - start;
        let length = delta.length();
        let rotation = if length > 0.0 {
            Quat::from_rotation_arc(Vec3::Y, delta / length)
        } else {
            Quat::IDENTITY
        };

        Self {
            first_id: first_id.to_owned(),
            second_id: second_id.to_owned(),
            start,
            end,
            midpoint: (start + end) * 0.5,
            length,
            rotation,
            radius: CONNECTION_RADIUS,
        }
    }
}

/// Open-ended tubes merged into one indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TubeMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl TubeMesh {
    fn push_segment(&mut self, segment: &ConnectionSegment) {
        if segment.length <= 0.0 {
            return;
        }

        let rings = CONNECTION_RADIAL_SEGMENTS;
        let base = self.positions.len() as u32;
        let half = segment.length * 0.5;
        for y in [-half, half] {
            for k in 0..rings {
                let angle = (k as f32 / rings as f32) * std::f32::consts::TAU;
                let radial = Vec3::new(angle.cos(), 0.0, angle.sin());
                let local = radial * segment.radius + Vec3::Y * y;
                self.positions
                    .push(segment.midpoint + segment.rotation * local);
                self.normals.push(segment.rotation * radial);
            }
        }

        for k in 0..rings {
            let next = (k + 1) % rings;
            let bottom = base + k;
            let bottom_next = base + next;
            let top = base + rings + k;
            let top_next = base + rings + next;
            self.indices
                .extend_from_slice(&[bottom, top, bottom_next, bottom_next, top, top_next]);
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// All relationships of one colour, merged into a single primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedDrawable {
    pub color: Rgb,
    pub opacity: f32,
    pub segments: Vec<ConnectionSegment>,
    pub mesh: TubeMesh,
}

impl MergedDrawable {
    fn new(color: Rgb) -> Self {
        Self {
            color,
            opacity: CONNECTION_OPACITY,
            segments: Vec::new(),
            mesh: TubeMesh::default(),
        }
    }

    fn push(&mut self, segment: ConnectionSegment) {
        self.mesh.push_segment(&segment);
        self.segments.push(segment);
    }
}

pub type DrawableMap = BTreeMap<Rgb, MergedDrawable>;

/// Groups every relationship by the colour of its first shared visible label
/// and merges each group into one drawable, using current registry positions.
/// Empty when `show_relationships` is off.
pub fn build_drawables(
    active: &[&Entity],
    labels: &LabelRegistry,
    settings: &ForceSettings,
    nodes: &NodeRegistry,
) -> DrawableMap {
    let mut drawables = DrawableMap::new();
    if !settings.show_relationships {
        return drawables;
    }

    for relationship in relationships(active, labels) {
        let Some(color) = labels.color_of(relationship.primary_label()) else {
            continue;
        };
        let (Some(start), Some(end)) = (
            nodes.position(&relationship.first.id),
            nodes.position(&relationship.second.id),
        ) else {
            continue;
        };

        drawables
            .entry(color)
            .or_insert_with(|| MergedDrawable::new(color))
            .push(ConnectionSegment::between(
                &relationship.first.id,
                &relationship.second.id,
                start,
                end,
            ));
    }

    drawables
}

/// The current frame's relationship drawables. Each rebuild drops the previous
/// frame's geometry before building the next.
#[derive(Default)]
pub struct RelationshipLayer {
    drawables: DrawableMap,
    relationship_count: usize,
}

impl RelationshipLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(
        &mut self,
        active: &[&Entity],
        labels: &LabelRegistry,
        settings: &ForceSettings,
        nodes: &NodeRegistry,
    ) {
        self.clear();
        self.drawables = build_drawables(active, labels, settings, nodes);
        self.relationship_count = self
            .drawables
            .values()
            .map(|drawable| drawable.segments.len())
            .sum();
    }

    pub fn clear(&mut self) {
        self.drawables.clear();
        self.relationship_count = 0;
    }

    pub fn drawables(&self) -> &DrawableMap {
        &self.drawables
    }

    pub fn relationship_count(&self) -> usize {
        self.relationship_count
    }

    pub fn color_groups(&self) -> usize {
        self.drawables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::registry::NodeHandle;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn registered(entities: &[Entity]) -> NodeRegistry {
        let mut nodes = NodeRegistry::new();
        for (raw, entity) in entities.iter().enumerate() {
            nodes.register(&entity.id, NodeHandle::new(raw as u64), entity.initial_position);
        }
        nodes
    }

    fn pair_ids(drawables: &DrawableMap) -> Vec<(String, String)> {
        drawables
            .values()
            .flat_map(|drawable| drawable.segments.iter())
            .map(|segment| (segment.first_id.clone(), segment.second_id.clone()))
            .collect()
    }

    #[test]
    fn visibility_gates_relationships() {
        let entities = vec![
            Entity::new("a", ["x"], Vec3::ZERO),
            Entity::new("b", ["x"], Vec3::X),
            Entity::new("c", ["y"], Vec3::Y),
        ];
        let nodes = registered(&entities);
        let mut labels = LabelRegistry::new();
        labels.add("x", RED);
        labels.add("y", BLUE);
        labels.set_visible("y", false);
        let active = entities.iter().collect::<Vec<_>>();
        let settings = ForceSettings::default();

        let drawables = build_drawables(&active, &labels, &settings, &nodes);
        assert_eq!(pair_ids(&drawables), [("a".to_owned(), "b".to_owned())]);

        labels.toggle("y");
        let drawables = build_drawables(&active, &labels, &settings, &nodes);
        assert_eq!(pair_ids(&drawables), [("a".to_owned(), "b".to_owned())]);
    }

    #[test]
    fn colour_comes_from_first_shared_label_of_first_entity() {
        let entities = vec![
            Entity::new("a", ["y", "x"], Vec3::ZERO),
            Entity::new("b", ["x", "y"], Vec3::X),
        ];
        let nodes = registered(&entities);
        let mut labels = LabelRegistry::new();
        labels.add("x", RED);
        labels.add("y", BLUE);
        let active = entities.iter().collect::<Vec<_>>();

        let found = relationships(&active, &labels);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].shared_labels, ["y", "x"]);

        let drawables = build_drawables(&active, &labels, &ForceSettings::default(), &nodes);
        assert_eq!(drawables.keys().copied().collect::<Vec<_>>(), [BLUE]);
    }

    #[test]
    fn groups_share_one_merged_mesh_per_colour() {
        let entities = vec![
            Entity::new("a", ["x"], Vec3::ZERO),
            Entity::new("b", ["x"], Vec3::new(2.0, 0.0, 0.0)),
            Entity::new("c", ["x", "y"], Vec3::new(0.0, 2.0, 0.0)),
            Entity::new("d", ["y"], Vec3::new(0.0, 0.0, 2.0)),
        ];
        let nodes = registered(&entities);
        let mut labels = LabelRegistry::new();
        labels.add("x", RED);
        labels.add("y", BLUE);
        let active = entities.iter().collect::<Vec<_>>();

        let drawables = build_drawables(&active, &labels, &ForceSettings::default(), &nodes);

        assert_eq!(drawables.len(), 2);
        let red = &drawables[&RED];
        let blue = &drawables[&BLUE];
        assert_eq!(red.segments.len(), 3);
        assert_eq!(blue.segments.len(), 1);

        let rings = CONNECTION_RADIAL_SEGMENTS as usize;
        assert_eq!(red.mesh.positions.len(), 3 * 2 * rings);
        assert_eq!(red.mesh.triangle_count(), 3 * 2 * rings);
        assert!(red
            .mesh
            .indices
            .iter()
            .all(|&index| (index as usize) < red.mesh.positions.len()));
    }

    #[test]
    fn segment_geometry_follows_endpoints() {
        let start = Vec3::new(1.0, 1.0, 1.0);
        let end = Vec3::new(1.0, 1.0, 5.0);
        let segment = ConnectionSegment::between("a", "b", start, end);

        assert_eq!(segment.midpoint, Vec3::new(1.0, 1.0, 3.0));
        assert!((segment.length - 4.0).abs() < 1.0e-6);
        assert!((segment.rotation * Vec3::Y - Vec3::Z).length() < 1.0e-5);

        let mut mesh = TubeMesh::default();
        mesh.push_segment(&segment);
        for position in &mesh.positions {
            let along = position.z - 3.0;
            assert!((along.abs() - 2.0).abs() < 1.0e-4);
            let radial = Vec3::new(position.x - 1.0, position.y - 1.0, 0.0).length();
            assert!((radial - CONNECTION_RADIUS).abs() < 1.0e-4);
        }
    }

    #[test]
    fn zero_length_segment_keeps_relationship_without_geometry() {
        let entities = vec![
            Entity::new("a", ["x"], Vec3::ONE),
            Entity::new("b", ["x"], Vec3::ONE),
        ];
        let nodes = registered(&entities);
        let mut labels = LabelRegistry::new();
        labels.add("x", RED);
        let active = entities.iter().collect::<Vec<_>>();

        let drawables = build_drawables(&active, &labels, &ForceSettings::default(), &nodes);
        let red = &drawables[&RED];
        assert_eq!(red.segments.len(), 1);
        assert_eq!(red.segments[0].rotation, Quat::IDENTITY);
        assert!(red.mesh.positions.is_empty());
    }

    #[test]
    fn layer_drops_previous_frame() {
        let entities = vec![
            Entity::new("a", ["x"], Vec3::ZERO),
            Entity::new("b", ["x"], Vec3::X),
        ];
        let nodes = registered(&entities);
        let mut labels = LabelRegistry::new();
        labels.add("x", RED);
        let active = entities.iter().collect::<Vec<_>>();
        let mut settings = ForceSettings::default();
        let mut layer = RelationshipLayer::new();

        layer.rebuild(&active, &labels, &settings, &nodes);
        assert_eq!(layer.relationship_count(), 1);
        assert_eq!(layer.color_groups(), 1);

        settings.show_relationships = false;
        layer.rebuild(&active, &labels, &settings, &nodes);
        assert!(layer.drawables().is_empty());
        assert_eq!(layer.relationship_count(), 0);

        settings.show_relationships = true;
        labels.set_color("x", BLUE);
        layer.rebuild(&active, &labels, &settings, &nodes);
        assert_eq!(layer.drawables().keys().copied().collect::<Vec<_>>(), [BLUE]);
    }
}
