/// Text shown for a field value; blank values get a visible placeholder.
pub fn display_value(value: &str) -> &str {
    if value.is_empty() { "(empty)" } else { value }
}

/// Field name as a caption: `release_year` becomes `Release year`.
pub fn field_caption(field: &str) -> String {
    let spaced = field.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn count_label(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_get_a_placeholder() {
        assert_eq!(display_value(""), "(empty)");
        assert_eq!(display_value("Nolan"), "Nolan");
    }

    #[test]
    fn captions_are_spaced_and_capitalised() {
        assert_eq!(field_caption("release_year"), "Release year");
        assert_eq!(field_caption("producer"), "Producer");
        assert_eq!(field_caption("_"), "");
    }

    #[test]
    fn counts_pick_the_right_noun() {
        assert_eq!(count_label(1, "song", "songs"), "1 song");
        assert_eq!(count_label(0, "song", "songs"), "0 songs");
        assert_eq!(count_label(12, "song", "songs"), "12 songs");
    }
}
