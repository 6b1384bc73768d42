use std::path::PathBuf;

use eframe::egui::{self, Align, Context, Layout};

use crate::contacts::save_tag_settings;
use crate::layout::{
    ForceSettings, FrameStats, LABEL_PALETTE, LabelRegistry, LayoutEngine, SavedLabelSettings,
};

use super::super::camera::OrbitCamera;
use super::super::{DataSource, LoadedData, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(
        data: LoadedData,
        tag_settings_path: PathBuf,
        forces: ForceSettings,
    ) -> Self {
        let LoadedData {
            dataset,
            saved_tags,
        } = data;
        let mut labels = LabelRegistry::new();
        labels.refresh_from_entities(dataset.entities(), &saved_tags);
        let forces = forces.sanitized();

        Self {
            new_label_color: LABEL_PALETTE[labels.len() % LABEL_PALETTE.len()],
            dataset,
            labels,
            saved_tags,
            tag_settings_path,
            forces,
            default_forces: forces,
            engine: LayoutEngine::new(),
            next_handle: 0,
            camera: OrbitCamera::default(),
            live_physics: true,
            search: String::new(),
            selected: None,
            new_label_name: String::new(),
            stats: FrameStats::default(),
            status: None,
            view_scratch: ViewScratch::default(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &DataSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("relation-graph");
                    ui.separator();
                    ui.label(format!("contacts: {}", source.contacts_path.display()));
                    ui.label(format!("loaded: {}", self.dataset.len()));
                    ui.label(format!(
                        "mounted: {}/{}",
                        self.engine.nodes().registered_count(),
                        self.engine.nodes().len()
                    ));
                    ui.label(format!(
                        "labels: {}/{}",
                        self.labels.visible_count(),
                        self.labels.len()
                    ));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload contacts"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "active: {}  |  relationships: {}  |  colour groups: {}",
                            self.stats.active,
                            self.stats.relationships,
                            self.stats.color_groups
                        ));
                        if let Some(status) = &self.status {
                            ui.colored_label(ui.visuals().warn_fg_color, status);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    /// Swaps in a freshly loaded dataset, keeping layout state for contacts
    /// that are still present.
    pub(in crate::app) fn apply_reload(&mut self, data: LoadedData) {
        self.dataset = data.dataset;
        self.saved_tags = data.saved_tags;
        self.prune_unknown_nodes();
        self.labels
            .refresh_from_entities(self.dataset.entities(), &self.saved_tags);

        if let Some(selected) = &self.selected
            && !self.dataset.contains(selected)
        {
            self.selected = None;
        }
        self.status = None;
    }

    /// Recounts labels after contact labels changed. Labels nobody carries
    /// yet survive with a zero count.
    pub(in crate::app) fn refresh_labels(&mut self) {
        let current = self.labels.settings();
        let unused = self
            .labels
            .iter()
            .filter(|label| label.count == 0)
            .map(|label| (label.name.clone(), label.color, label.visible))
            .collect::<Vec<_>>();

        self.saved_tags.extend(current);
        self.labels
            .refresh_from_entities(self.dataset.entities(), &self.saved_tags);

        for (name, color, visible) in unused {
            if self.labels.add(&name, color) {
                self.labels.set_visible(&name, visible);
            }
        }
    }

    /// Writes label colour/visibility next to the dataset. Failures are
    /// reported in the top bar rather than interrupting the session.
    pub(in crate::app) fn persist_labels(&mut self) {
        let mut settings: SavedLabelSettings = self.saved_tags.clone();
        settings.extend(self.labels.settings());

        match save_tag_settings(&self.tag_settings_path, &settings) {
            Ok(()) => {
                self.saved_tags = settings;
                self.status = None;
            }
            Err(error) => {
                log::warn!("{error:#}");
                self.status = Some(format!("{error:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::contacts::{load_dataset, load_tag_settings};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "relation-graph-view-{}-{name}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn loaded(dir: &Path, file: &str, raw: &str) -> LoadedData {
        let path = dir.join(file);
        fs::write(&path, raw).unwrap();
        LoadedData {
            dataset: load_dataset(&path).unwrap(),
            saved_tags: SavedLabelSettings::new(),
        }
    }

    fn model(dir: &Path) -> ViewModel {
        let data = loaded(
            dir,
            "contacts.json",
            r#"[{"id": "a", "name": "Ada", "tags": ["x", "y"]},
                {"id": "b", "name": "Bo", "tags": ["x"]}]"#,
        );
        ViewModel::new(data, dir.join("tags.json"), ForceSettings::default())
    }

    fn count(model: &ViewModel, name: &str) -> Option<usize> {
        model.labels.get(name).map(|label| label.count)
    }

    #[test]
    fn hand_added_labels_survive_recount() {
        let dir = scratch_dir("recount");
        let mut model = model(&dir);
        assert!(model.labels.add("z", LABEL_PALETTE[5]));

        model.dataset.set_contact_tags("b", ["y".to_owned()]);
        model.refresh_labels();

        assert_eq!(count(&model, "x"), Some(1));
        assert_eq!(count(&model, "y"), Some(2));
        assert_eq!(count(&model, "z"), Some(0));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn persisted_label_settings_reload() {
        let dir = scratch_dir("persist");
        let mut model = model(&dir);
        model.labels.toggle("y");

        model.persist_labels();

        assert!(model.status.is_none());
        let saved = load_tag_settings(&dir.join("tags.json")).unwrap();
        assert_eq!(saved.get("y").map(|settings| settings.visible), Some(false));
        assert_eq!(saved.get("x").map(|settings| settings.visible), Some(true));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn reload_prunes_departed_contacts() {
        let dir = scratch_dir("reload");
        let mut model = model(&dir);
        model.sync_mounted();
        model.selected = Some("b".to_owned());
        assert_eq!(model.engine.nodes().registered_count(), 2);

        let next = loaded(
            &dir,
            "next.json",
            r#"[{"id": "a", "name": "Ada", "tags": ["y"]}]"#,
        );
        model.apply_reload(next);

        assert_eq!(model.engine.nodes().len(), 1);
        assert!(model.engine.nodes().is_registered("a"));
        assert_eq!(model.selected, None);
        assert_eq!(count(&model, "x"), None);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn hidden_labels_unmount_contacts() {
        let dir = scratch_dir("mount");
        let mut model = model(&dir);
        model.sync_mounted();

        model.labels.toggle("x");
        model.sync_mounted();

        assert!(model.engine.nodes().is_registered("a"));
        assert!(!model.engine.nodes().is_registered("b"));
        let _ = fs::remove_dir_all(dir);
    }
}
