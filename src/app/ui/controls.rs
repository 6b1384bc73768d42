use std::ops::RangeInclusive;

use eframe::egui::{self, Align, Key, Layout, Response, RichText, Ui};
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::layout::{LABEL_PALETTE, Rgb};

use super::super::ViewModel;
use super::super::graph::fuzzy_match_score;
use super::super::render_utils::rgb_color;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Arrow keys nudge a focused slider, speeding up while held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let step = ((max - min) / 200.0).max(0.0005);
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);

    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn force_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let (min, max) = (*range.start(), *range.end());
    let response = ui
        .add(egui::Slider::new(&mut *value, range).text(text))
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    let changed = response.changed();
    changed | apply_slider_arrow_acceleration(ui, &response, value, min, max)
}

enum LabelAction {
    Toggle(String),
    Recolor(String, Rgb),
    Remove(String),
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Layout");
        ui.add_space(4.0);

        egui::CollapsingHeader::new("Forces")
            .default_open(true)
            .show(ui, |ui| self.draw_force_controls(ui));

        ui.separator();
        egui::CollapsingHeader::new("Labels")
            .default_open(true)
            .show(ui, |ui| self.draw_label_legend(ui));

        ui.separator();
        egui::CollapsingHeader::new("Contacts")
            .default_open(true)
            .show(ui, |ui| self.draw_contact_list(ui));
    }

    fn draw_force_controls(&mut self, ui: &mut Ui) {
        let forces = &mut self.forces;
        let mut changed = false;

        changed |= force_slider(
            ui,
            &mut forces.spring_constant,
            0.5..=5.0,
            "Spring",
            "Pull between contacts that share a visible label.",
        );
        changed |= force_slider(
            ui,
            &mut forces.repulsion_coefficient,
            0.0..=0.3,
            "Repulsion",
            "Push between contacts with nothing visible in common.",
        );
        changed |= force_slider(
            ui,
            &mut forces.ideal_distance,
            0.5..=4.0,
            "Ideal distance",
            "Rest length of the spring between related contacts.",
        );
        changed |= force_slider(
            ui,
            &mut forces.center_strength,
            0.0..=1.0,
            "Centering",
            "Pull of every contact toward the origin.",
        );
        changed |= force_slider(
            ui,
            &mut forces.damping,
            0.8..=0.99,
            "Damping",
            "Share of velocity kept after each step.",
        );
        changed |= force_slider(
            ui,
            &mut forces.max_velocity,
            1.0..=15.0,
            "Max velocity",
            "Speed cap applied after integration.",
        );
        changed |= force_slider(
            ui,
            &mut forces.max_bound_radius,
            2.0..=30.0,
            "Bound radius",
            "Contacts never leave this sphere around the origin.",
        );

        if changed {
            *forces = forces.sanitized();
        }

        ui.horizontal(|ui| {
            if ui.button("Reset forces").clicked() {
                self.forces = self.default_forces;
            }
            ui.checkbox(&mut self.forces.show_relationships, "Show relationships")
                .on_hover_text("Draw a tube between every pair of related contacts.");
        });
        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep stepping the layout while viewing the graph.");
    }

    fn draw_label_legend(&mut self, ui: &mut Ui) {
        let mut action = None;

        if self.labels.is_empty() {
            ui.label("No labels yet.");
        }

        for label in self.labels.iter() {
            ui.horizontal(|ui| {
                if ui.checkbox(&mut label.visible.clone(), "").clicked() {
                    action = Some(LabelAction::Toggle(label.name.clone()));
                }

                let mut srgb = label.color.to_array();
                if egui::color_picker::color_edit_button_srgb(ui, &mut srgb).changed() {
                    action = Some(LabelAction::Recolor(label.name.clone(), Rgb::from(srgb)));
                }

                let name = RichText::new(label.name.as_str()).color(rgb_color(label.color));
                ui.label(if label.visible { name } else { name.weak() });

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui
                        .small_button("x")
                        .on_hover_text("Remove the label from every contact.")
                        .clicked()
                    {
                        action = Some(LabelAction::Remove(label.name.clone()));
                    }
                    ui.label(label.count.to_string());
                });
            });
        }

        if let Some(action) = action {
            self.apply_label_action(action);
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let mut srgb = self.new_label_color.to_array();
            if egui::color_picker::color_edit_button_srgb(ui, &mut srgb).changed() {
                self.new_label_color = Rgb::from(srgb);
            }
            ui.add(
                egui::TextEdit::singleline(&mut self.new_label_name)
                    .hint_text("new label")
                    .desired_width(140.0),
            );
            if ui.button("Add").clicked() {
                self.add_label();
            }
        });
    }

    fn apply_label_action(&mut self, action: LabelAction) {
        match action {
            LabelAction::Toggle(name) => {
                self.labels.toggle(&name);
            }
            LabelAction::Recolor(name, color) => {
                self.labels.set_color(&name, color);
            }
            LabelAction::Remove(name) => {
                let stripped = self.dataset.remove_label(&name);
                self.labels.remove(&name);
                self.saved_tags.remove(&name);
                log::info!("removed label {name} from {stripped} contacts");
            }
        }
        self.persist_labels();
    }

    fn add_label(&mut self) {
        let name = self.new_label_name.trim().to_owned();
        if !self.labels.add(&name, self.new_label_color) {
            self.status = Some(format!("label {name:?} is blank or already exists"));
            return;
        }

        self.new_label_name.clear();
        self.new_label_color = LABEL_PALETTE[self.labels.len() % LABEL_PALETTE.len()];
        self.persist_labels();
    }

    fn draw_contact_list(&mut self, ui: &mut Ui) {
        ui.label("Search contacts")
            .on_hover_text("Fuzzy-highlight contacts by name.");
        ui.text_edit_singleline(&mut self.search);
        ui.add_space(4.0);

        let matcher = SkimMatcherV2::default();
        let query = self.search.trim();
        let mut rows = self
            .dataset
            .iter()
            .filter_map(|(entity, profile)| {
                let score = if query.is_empty() {
                    0
                } else {
                    fuzzy_match_score(&matcher, &profile.name, query)?
                };
                Some((score, entity.id.as_str(), profile.name.as_str()))
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.2.cmp(b.2)));

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("contact_list_scroll")
            .max_height(260.0)
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, rows.len(), |ui, row_range| {
                for &(_, id, name) in &rows[row_range] {
                    let is_selected = self.selected.as_deref() == Some(id);
                    let text = if self.engine.nodes().is_registered(id) {
                        RichText::new(name)
                    } else {
                        RichText::new(name).weak()
                    };
                    if ui.selectable_label(is_selected, text).clicked() {
                        clicked = Some(id.to_owned());
                    }
                }
            });

        if let Some(id) = clicked {
            self.focus_on(&id);
            self.set_selected(Some(id));
        }
    }
}
