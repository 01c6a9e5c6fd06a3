use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;

use super::parse::{parse_csv_records, parse_json_records};
use super::record::Catalog;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DataFormat {
    #[default]
    Auto,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug)]
enum SourceKind {
    Json,
    Csv,
}

impl DataFormat {
    fn resolve(self, path: &Path) -> Result<SourceKind> {
        match self {
            Self::Json => return Ok(SourceKind::Json),
            Self::Csv => return Ok(SourceKind::Csv),
            Self::Auto => {}
        }

        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(SourceKind::Json),
            Some("csv") => Ok(SourceKind::Csv),
            _ => bail!(
                "cannot infer catalog format from {}; pass --format json or --format csv",
                path.display()
            ),
        }
    }
}

pub fn load_catalog(path: &Path, format: DataFormat) -> Result<Catalog> {
    let kind = format.resolve(path)?;
    tracing::info!(path = %path.display(), ?kind, "loading catalog");

    let records = match kind {
        SourceKind::Json => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_json_records(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        SourceKind::Csv => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            parse_csv_records(BufReader::new(file))
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
    };

    let catalog = Catalog::new(path.to_path_buf(), records);
    tracing::info!(
        path = %path.display(),
        records = catalog.record_count(),
        fields = catalog.schema.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"title": "Kesariya", "musicDirector": "Pritam", "year": 2022}}]"#
        )
        .unwrap();

        let catalog = load_catalog(file.path(), DataFormat::Auto).unwrap();
        assert_eq!(catalog.record_count(), 1);
        assert_eq!(catalog.schema, vec!["title", "musicDirector", "year"]);
        assert_eq!(catalog.records[0].get("year"), Some("2022"));
    }

    #[test]
    fn loads_csv_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".CSV").tempfile().unwrap();
        writeln!(file, "Producer,Album_Name,Track_Name").unwrap();
        writeln!(file, "Pritam,Aashiqui 2,Tum Hi Ho").unwrap();

        let catalog = load_catalog(file.path(), DataFormat::Auto).unwrap();
        assert_eq!(catalog.records[0].get("Track_Name"), Some("Tum Hi Ho"));
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "title\nChaleya").unwrap();

        assert!(load_catalog(file.path(), DataFormat::Auto).is_err());
        let catalog = load_catalog(file.path(), DataFormat::Csv).unwrap();
        assert_eq!(catalog.records[0].get("title"), Some("Chaleya"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = load_catalog(Path::new("/nonexistent/songs.json"), DataFormat::Auto)
            .unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/songs.json"));
    }
}
