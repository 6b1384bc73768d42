use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_camera_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if response.dragged_by(egui::PointerButton::Primary) {
            self.camera.orbit(response.drag_delta());
        }

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.camera.pan(response.drag_delta(), rect);
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                self.camera.zoom(scroll);
            }
        }
    }

    /// Topmost projected node under the pointer.
    pub(in crate::app) fn hovered_index(&self, pointer: Option<Pos2>) -> Option<usize> {
        let pointer = pointer?;
        self.view_scratch
            .projected
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.position.distance(pointer) <= node.radius)
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected != selected {
            log::debug!("selection changed to {selected:?}");
            self.selected = selected;
        }
    }

    /// Points the camera at the contact's current position, if mounted.
    pub(in crate::app) fn focus_on(&mut self, id: &str) -> bool {
        let Some(position) = self.engine.nodes().position(id) else {
            return false;
        };
        self.camera.focus(position);
        true
    }
}
