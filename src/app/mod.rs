use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Result;
use eframe::egui::{self, Context};

use crate::contacts::{Dataset, load_dataset, load_tag_settings};
use crate::layout::{
    ForceSettings, FrameStats, LabelRegistry, LayoutEngine, Rgb, SavedLabelSettings,
};

mod camera;
mod graph;
mod render_utils;
mod ui;

use camera::OrbitCamera;

/// Where the viewer reads contacts from and keeps label choices.
#[derive(Clone, Debug)]
pub struct DataSource {
    pub contacts_path: PathBuf,
    pub tag_settings_path: PathBuf,
}

pub struct RelationGraphApp {
    source: DataSource,
    forces: ForceSettings,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedData, String>>>,
}

struct LoadedData {
    dataset: Dataset,
    saved_tags: SavedLabelSettings,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedData, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset: Dataset,
    labels: LabelRegistry,
    saved_tags: SavedLabelSettings,
    tag_settings_path: PathBuf,
    forces: ForceSettings,
    default_forces: ForceSettings,
    engine: LayoutEngine,
    next_handle: u64,
    camera: OrbitCamera,
    live_physics: bool,
    search: String,
    selected: Option<String>,
    new_label_name: String,
    new_label_color: Rgb,
    stats: FrameStats,
    status: Option<String>,
    view_scratch: ViewScratch,
}

#[derive(Default)]
struct ViewScratch {
    projected: Vec<ProjectedNode>,
}

struct ProjectedNode {
    id: String,
    position: egui::Pos2,
    radius: f32,
    depth: f32,
}

fn load(source: &DataSource) -> Result<LoadedData> {
    let dataset = load_dataset(&source.contacts_path)?;
    let saved_tags = load_tag_settings(&source.tag_settings_path)?;
    Ok(LoadedData {
        dataset,
        saved_tags,
    })
}

impl RelationGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: DataSource,
        forces: ForceSettings,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            forces,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: DataSource) -> Receiver<Result<LoadedData, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load(&source).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                log::error!("{error}");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: DataSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, data: LoadedData) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            data,
            self.source.tag_settings_path.clone(),
            self.forces,
        )))
    }
}

impl eframe::App for RelationGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(result);
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading contacts...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load contacts");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(data)) => model.apply_reload(data),
                        Ok(Err(error)) => transition = Some(Err(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.source.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(data) => self.ready(data),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
