use std::io::Read;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::record::Record;

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    Null,
    Nested(Value),
}

impl RawField {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(number) => Some(number.to_string()),
            Self::Flag(flag) => Some(flag.to_string()),
            Self::Null => None,
            Self::Nested(value) => Some(value.to_string()),
        }
    }
}

pub(super) fn parse_json_records(raw: &str) -> Result<Vec<Record>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in catalog")?;
    let entries = parsed
        .as_array()
        .ok_or_else(|| anyhow!("catalog JSON must be an array of records"))?;

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let object = entry
            .as_object()
            .ok_or_else(|| anyhow!("catalog entry {index} is not an object"))?;

        let mut record = Record::new();
        for (name, value) in object {
            let field = RawField::deserialize(value)
                .with_context(|| format!("invalid value for '{name}' in entry {index}"))?;
            if let Some(text) = field.into_text() {
                record.insert(name.trim(), &text);
            }
        }
        records.push(record);
    }

    Ok(records)
}

pub(super) fn parse_csv_records(reader: impl Read) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("failed to parse CSV row {}", index + 1))?;
        let record = headers
            .iter()
            .zip(row.iter())
            .collect::<Record>();
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalars_become_text_and_null_is_missing() {
        let raw = r#"[
            {"title": " Tum Hi Ho ", "year": 2013, "remix": false, "language": null},
            {"title": "Kesariya", "musicDirector": "Pritam", "tags": ["love"]}
        ]"#;

        let records = parse_json_records(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("title"), Some("Tum Hi Ho"));
        assert_eq!(records[0].get("year"), Some("2013"));
        assert_eq!(records[0].get("remix"), Some("false"));
        assert_eq!(records[0].get("language"), None);
        assert_eq!(records[1].get("musicDirector"), Some("Pritam"));
        assert_eq!(records[1].get("tags"), Some(r#"["love"]"#));
    }

    #[test]
    fn json_keeps_field_order() {
        let records = parse_json_records(r#"[{"z": "1", "a": "2", "m": "3"}]"#).unwrap();
        let names = records[0].fields().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn json_rejects_non_array_and_non_object_entries() {
        let error = parse_json_records(r#"{"title": "x"}"#).unwrap_err();
        assert!(error.to_string().contains("array"));

        let error = parse_json_records(r#"[{"title": "x"}, 3]"#).unwrap_err();
        assert!(error.to_string().contains("entry 1"));

        assert!(parse_json_records("[{").is_err());
    }

    #[test]
    fn csv_trims_headers_and_tolerates_ragged_rows() {
        let raw = " Producer , Album_Name ,Track_Name\n\
                   Pritam ,  Aashiqui 2 , Tum Hi Ho\n\
                   Mithoon,Aashiqui 2\n";

        let records = parse_csv_records(raw.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Producer"), Some("Pritam"));
        assert_eq!(records[0].get("Album_Name"), Some("Aashiqui 2"));
        assert_eq!(records[0].get("Track_Name"), Some("Tum Hi Ho"));
        assert_eq!(records[1].get("Producer"), Some("Mithoon"));
        assert_eq!(records[1].get("Track_Name"), None);
    }

    #[test]
    fn csv_header_only_is_empty() {
        let records = parse_csv_records("title,director\n".as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
