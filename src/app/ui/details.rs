use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;
use super::super::render_utils::rgb_color;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Contact Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a contact from the graph or the contact list.");
            return;
        };

        let (Some(entity), Some(profile)) = (
            self.dataset.entity(&selected_id),
            self.dataset.profile(&selected_id),
        ) else {
            ui.label("Selected contact is no longer loaded.");
            return;
        };

        let current = entity.labels.clone();
        ui.label(RichText::new(profile.name.as_str()).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Email: {}", profile.email.as_deref().unwrap_or("-")));
        ui.label(format!("Phone: {}", profile.phone.as_deref().unwrap_or("-")));

        match self.engine.nodes().position(&selected_id) {
            Some(position) => {
                ui.label(format!(
                    "Position: ({:.2}, {:.2}, {:.2})",
                    position.x, position.y, position.z
                ));
            }
            None => {
                ui.label("Not in the layout: none of its labels are visible.");
            }
        }
        if let Some(velocity) = self.engine.nodes().velocity(&selected_id) {
            ui.label(format!("Speed: {:.3}", velocity.length()));
        }

        ui.separator();
        ui.label(RichText::new("Labels").strong());

        let mut edited = None;
        for label in self.labels.iter() {
            let mut carried = current.contains(&label.name);
            let text = RichText::new(label.name.as_str()).color(rgb_color(label.color));
            if ui.checkbox(&mut carried, text).changed() {
                let mut labels = current.clone();
                if carried {
                    labels.push(label.name.clone());
                } else {
                    labels.retain(|name| name != &label.name);
                }
                edited = Some(labels);
            }
        }

        if let Some(labels) = edited {
            self.dataset.set_contact_tags(&selected_id, labels);
            self.refresh_labels();
            self.persist_labels();
        }

        ui.separator();
        ui.horizontal(|ui| {
            let focus = ui.add_enabled(
                self.engine.nodes().is_registered(&selected_id),
                egui::Button::new("Focus"),
            );
            if focus.clicked() {
                self.focus_on(&selected_id);
            }
            if ui.button("Clear selection").clicked() {
                self.set_selected(None);
            }
        });
    }
}
