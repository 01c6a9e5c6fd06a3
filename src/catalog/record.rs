use std::path::PathBuf;

/// One catalog entry. Fields keep the order they were read in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to the trimmed `value`, replacing an earlier value for the same field.
    pub fn insert(&mut self, name: impl Into<String>, value: &str) {
        let name = name.into();
        let value = value.trim().to_owned();
        if let Some(slot) = self.fields.iter_mut().find(|(field, _)| *field == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value.as_ref());
        }
        record
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    pub source: PathBuf,
    pub schema: Vec<String>,
    pub records: Vec<Record>,
}

impl Catalog {
    pub fn new(source: PathBuf, records: Vec<Record>) -> Self {
        let mut schema: Vec<String> = Vec::new();
        for record in &records {
            for (field, _) in record.fields() {
                if !schema.iter().any(|known| known == field) {
                    schema.push(field.to_owned());
                }
            }
        }

        Self {
            source,
            schema,
            records,
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.schema.iter().any(|known| known == field)
    }

    /// First schema field that is not used for grouping, falling back to the first field.
    pub fn default_label_field(&self, group_keys: &[String]) -> Option<String> {
        self.schema
            .iter()
            .find(|field| !group_keys.contains(field))
            .or_else(|| self.schema.first())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_trims_and_replaces() {
        let mut record = Record::new();
        record.insert("title", "  Tum Hi Ho ");
        record.insert("year", "2013");
        record.insert("title", "Channa Mereya");

        assert_eq!(record.get("title"), Some("Channa Mereya"));
        assert_eq!(record.get("year"), Some("2013"));
        assert_eq!(record.get("album"), None);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn schema_is_first_seen_order_across_records() {
        let records = vec![
            Record::from_iter([("title", "a"), ("director", "x")]),
            Record::from_iter([("title", "b"), ("language", "Hindi"), ("director", "y")]),
        ];
        let catalog = Catalog::new(PathBuf::from("songs.json"), records);

        assert_eq!(catalog.schema, vec!["title", "director", "language"]);
        assert_eq!(catalog.record_count(), 2);
        assert!(catalog.has_field("language"));
        assert_eq!(
            catalog.default_label_field(&["title".to_owned()]).as_deref(),
            Some("director")
        );
    }
}
