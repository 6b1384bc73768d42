mod app;
mod contacts;
mod layout;
mod util;

use std::path::PathBuf;

use clap::Parser;

use crate::layout::ForceSettings;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Contacts JSON: a bare array, `{"contacts": [...]}` or a People API export.
    #[arg(long, default_value = "data/sample_contacts.json")]
    contacts: PathBuf,

    /// Saved label colours and visibility. Defaults to
    /// `relation_tag_settings.json` beside the contacts file.
    #[arg(long)]
    tag_settings: Option<PathBuf>,

    /// Force settings JSON overriding the built-in defaults.
    #[arg(long)]
    forces: Option<PathBuf>,
}

impl Args {
    fn data_source(&self) -> app::DataSource {
        let tag_settings_path = self.tag_settings.clone().unwrap_or_else(|| {
            self.contacts
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join("relation_tag_settings.json")
        });
        app::DataSource {
            contacts_path: self.contacts.clone(),
            tag_settings_path,
        }
    }

    fn force_settings(&self) -> ForceSettings {
        let Some(path) = &self.forces else {
            return ForceSettings::default();
        };
        match contacts::load_force_settings(path) {
            Ok(settings) => settings.sanitized(),
            Err(error) => {
                log::warn!("{error:#}; using default forces");
                ForceSettings::default()
            }
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let source = args.data_source();
    let forces = args.force_settings();
    log::info!(
        "contacts from {}, label settings at {}",
        source.contacts_path.display(),
        source.tag_settings_path.display()
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "relation-graph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::RelationGraphApp::new(
                cc,
                source,
                forces,
            )))
        }),
    )
}
