mod app;
mod catalog;
mod hierarchy;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog::DataFormat;
use hierarchy::MissingFieldPolicy;

/// Force-directed explorer for a flat song catalog.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Catalog file: a JSON array of objects or a CSV file with a header row.
    #[arg(long, default_value = "data/songs.json")]
    data: PathBuf,

    #[arg(long, value_enum, default_value_t = DataFormat::Auto)]
    format: DataFormat,

    /// Field to group by; repeat for nested levels. Defaults to the first field in the file.
    #[arg(long = "group-by", value_name = "FIELD")]
    group_by: Vec<String>,

    /// Only use the first N records.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Field used to label songs in the diagram.
    #[arg(long, value_name = "FIELD")]
    label_field: Option<String>,

    #[arg(long, default_value = "catalog")]
    root_label: String,

    /// Fail the grouping when a record lacks a group-by field instead of grouping it under "".
    #[arg(long)]
    strict_fields: bool,
}

impl Args {
    fn into_config(self) -> app::ViewerConfig {
        app::ViewerConfig {
            data_path: self.data,
            format: self.format,
            group_by: self.group_by,
            limit: self.limit,
            label_field: self.label_field,
            root_label: self.root_label,
            missing_fields: if self.strict_fields {
                MissingFieldPolicy::Strict
            } else {
                MissingFieldPolicy::Tolerant
            },
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    tracing::info!(
        data = %config.data_path.display(),
        group_by = ?config.group_by,
        limit = ?config.limit,
        "starting songweb"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "songweb",
        options,
        Box::new(move |cc| Ok(Box::new(app::SongwebApp::new(cc, config)))),
    )
}
