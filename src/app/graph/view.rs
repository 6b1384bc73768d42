use std::collections::HashSet;

use eframe::egui::epaint::{Vertex, WHITE_UV};
use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use glam::Vec3;

use crate::layout::{TubeMesh, UNLABELLED_COLOR};

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, rgb_color, with_opacity,
};
use super::super::{ProjectedNode, ViewModel};

/// World-space radius of a contact sphere.
const NODE_RADIUS: f32 = 0.3;

pub(in crate::app) fn fuzzy_match_score(
    matcher: &SkimMatcherV2,
    text: &str,
    query: &str,
) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    /// Ids whose contact name fuzzy-matches the search box.
    pub(in crate::app) fn search_matches(&self) -> Option<HashSet<String>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .dataset
            .iter()
            .filter(|(_, profile)| fuzzy_match_score(&matcher, &profile.name, query).is_some())
            .map(|(entity, _)| entity.id.clone())
            .collect();
        Some(matches)
    }

    fn node_color(&self, id: &str) -> Color32 {
        let color = self
            .dataset
            .entity(id)
            .and_then(|entity| entity.first_label())
            .and_then(|label| self.labels.color_of(label))
            .unwrap_or(UNLABELLED_COLOR);
        rgb_color(color)
    }

    /// Paints a merged tube mesh, shading each vertex by how squarely its
    /// normal faces the camera. Triangles touching the near plane are dropped.
    fn paint_tube_mesh(&self, painter: &Painter, rect: Rect, mesh: &TubeMesh, color: Color32) {
        if mesh.triangle_count() == 0 {
            return;
        }

        let toward_eye = (self.camera.eye() - self.camera.target).normalize_or_zero();
        let [r, g, b, a] = color.to_array();
        let mut shape = egui::Mesh::default();
        let mut projected = Vec::with_capacity(mesh.positions.len());

        for (position, normal) in mesh.positions.iter().zip(&mesh.normals) {
            let screen = self.camera.project(rect, *position);
            projected.push(screen.is_some());

            let shade = 0.55 + 0.45 * normal.dot(toward_eye).abs();
            let channel = |value: u8| (value as f32 * shade) as u8;
            shape.vertices.push(Vertex {
                pos: screen.map_or(Pos2::ZERO, |screen| screen.position),
                uv: WHITE_UV,
                color: Color32::from_rgba_premultiplied(channel(r), channel(g), channel(b), a),
            });
        }

        for triangle in mesh.indices.chunks_exact(3) {
            if triangle.iter().all(|&index| projected[index as usize]) {
                shape.indices.extend_from_slice(triangle);
            }
        }
        painter.add(egui::Shape::mesh(shape));
    }

    fn project_nodes(&mut self, rect: Rect) {
        let projected = &mut self.view_scratch.projected;
        projected.clear();

        for (id, _handle, position) in self.engine.nodes().iter_registered() {
            let Some(screen) = self.camera.project(rect, position) else {
                continue;
            };
            let radius = (NODE_RADIUS * screen.scale).clamp(2.0, 40.0);
            if !circle_visible(rect, screen.position, radius) {
                continue;
            }

            projected.push(ProjectedNode {
                id: id.to_owned(),
                position: screen.position,
                radius,
                depth: screen.depth,
            });
        }

        // Far to near so closer discs paint over farther ones.
        projected.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        self.sync_mounted();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_camera_input(ui, rect, &response);

        if self.dataset.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No contacts loaded.",
                FontId::proportional(16.0),
                Color32::from_gray(200),
            );
            return;
        }

        let dt = if self.live_physics {
            ui.ctx()
                .input(|input| input.stable_dt)
                .clamp(1.0 / 240.0, 1.0 / 20.0)
        } else {
            0.0
        };
        self.stats = self
            .engine
            .frame(self.dataset.entities(), &self.labels, &self.forces, dt);

        if self.stats.moving || response.dragged() {
            ui.ctx().request_repaint();
        }

        let bound = self.camera.project(rect, Vec3::ZERO).map(|origin| {
            (
                origin.position,
                origin.scale * self.forces.max_bound_radius,
            )
        });
        draw_background(&painter, rect, bound);

        let selected = self.selected.as_deref();
        for drawable in self.engine.drawables().values() {
            let base = rgb_color(drawable.color);
            self.paint_tube_mesh(
                &painter,
                rect,
                &drawable.mesh,
                with_opacity(base, drawable.opacity),
            );

            let Some(selected) = selected else {
                continue;
            };
            let strong = with_opacity(base, (drawable.opacity * 4.0).min(0.9));
            for segment in drawable
                .segments
                .iter()
                .filter(|segment| segment.first_id == selected || segment.second_id == selected)
            {
                let (Some(start), Some(end)) = (
                    self.camera.project(rect, segment.start),
                    self.camera.project(rect, segment.end),
                ) else {
                    continue;
                };
                let width = (segment.radius * (start.scale + end.scale)).clamp(0.6, 24.0);
                painter.line_segment([start.position, end.position], Stroke::new(width, strong));
            }
        }

        self.project_nodes(rect);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = self.hovered_index(pointer);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let search_matches = self.search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        let selected_color = Color32::from_rgb(245, 206, 93);

        for (index, node) in self.view_scratch.projected.iter().enumerate() {
            let is_selected = self.selected.as_deref() == Some(node.id.as_str());
            let is_hovered = hovered == Some(index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&node.id));

            let base_color = self.node_color(&node.id);
            let color = if is_selected {
                blend_color(base_color, selected_color, 0.75)
            } else if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.35)
            } else if is_match {
                blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.68)
            } else if search_active {
                dim_color(base_color, 0.38)
            } else {
                base_color
            };

            painter.circle_filled(node.position, node.radius, color);
            painter.circle_stroke(
                node.position,
                node.radius,
                Stroke::new(
                    if is_selected { 2.2 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );

            if is_selected || is_hovered || is_match || node.radius > 14.0 {
                let name = self
                    .dataset
                    .profile(&node.id)
                    .map_or(node.id.as_str(), |profile| profile.name.as_str());
                painter.text(
                    node.position + vec2(node.radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    name,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = hovered
            && let Some(node) = self.view_scratch.projected.get(index)
            && let Some((entity, profile)) = self
                .dataset
                .entity(&node.id)
                .zip(self.dataset.profile(&node.id))
        {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}", profile.name, entity.labels.join(", ")),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let clicked = hovered
                .and_then(|index| self.view_scratch.projected.get(index))
                .map(|node| node.id.clone());
            self.set_selected(clicked);
        }
    }
}
