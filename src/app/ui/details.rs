use eframe::egui::{self, RichText, Ui};

use crate::util::{count_label, display_value, field_caption};

use super::super::highlight::path_from_top;
use super::super::{NodeKind, ViewModel};

const CHILD_ROW_HEIGHT: f32 = 20.0;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(6.0);

        let Some(selected) = self.selected else {
            ui.label("Click a node in the diagram to inspect it.");
            return;
        };
        let Some(cache) = self.graph_cache.as_ref() else {
            return;
        };
        let Some(node) = cache.nodes.get(selected) else {
            ui.label("The selected node is no longer part of the diagram.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        match &node.kind {
            NodeKind::Root { record_count } => {
                ui.label(count_label(*record_count, "song", "songs"));
            }
            NodeKind::Cluster { field, child_count } => {
                ui.label(format!("{}: {}", field_caption(field), node.label));
                ui.label(count_label(*child_count, "child", "children"));
            }
            NodeKind::Leaf { record } => {
                ui.small(format!("record #{}", record + 1));
            }
        }

        let leaf_path = match node.kind {
            NodeKind::Leaf { record } => self.leaf_path_text(record, &node.label),
            _ => None,
        };
        let path_text = leaf_path.unwrap_or_else(|| {
            let path = path_from_top(cache, selected)
                .into_iter()
                .filter_map(|index| cache.nodes.get(index).map(|node| node.label.as_str()))
                .collect::<Vec<_>>();
            if cache.root_index.is_none() {
                format!("{} / {}", self.root_label, path.join(" / "))
            } else {
                path.join(" / ")
            }
        });
        ui.separator();
        ui.label(RichText::new("Path").strong());
        ui.label(path_text);

        if let NodeKind::Leaf { record } = node.kind
            && let Some(record) = self.catalog.records.get(record)
        {
            ui.separator();
            ui.label(RichText::new(format!("Fields ({})", record.len())).strong());
            egui::Grid::new("selected_fields")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (name, value) in record.fields() {
                        ui.label(field_caption(name));
                        ui.label(display_value(value));
                        ui.end_row();
                    }
                });
        }

        let children = cache.children.get(selected).cloned().unwrap_or_default();
        if children.is_empty() {
            return;
        }

        ui.separator();
        ui.label(RichText::new("Children").strong());
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("selected_children")
            .max_height(360.0)
            .auto_shrink([false, true])
            .show_rows(ui, CHILD_ROW_HEIGHT, children.len(), |ui, row_range| {
                for &child in &children[row_range] {
                    let Some(child_node) = cache.nodes.get(child) else {
                        continue;
                    };
                    let text = match child_node.kind {
                        NodeKind::Cluster { child_count, .. } => {
                            format!("{}  ({child_count})", child_node.label)
                        }
                        _ => child_node.label.clone(),
                    };
                    if ui.link(text).clicked() {
                        clicked = Some(child);
                    }
                }
            });

        if let Some(child) = clicked {
            self.selected = Some(child);
        }
    }

    /// Root label, group values and leaf label for catalog record `record`.
    fn leaf_path_text(&self, record: usize, leaf_label: &str) -> Option<String> {
        let tree = self.tree.as_ref()?;
        let path = tree.leaf_paths().into_iter().find(|path| path.index == record)?;
        let mut parts = Vec::with_capacity(path.labels.len() + 2);
        parts.push(tree.root_label.as_str());
        parts.extend(path.labels.iter().map(|label| display_value(label)));
        parts.push(leaf_label);
        Some(parts.join(" / "))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::app::ViewerConfig;
    use crate::catalog::{Catalog, DataFormat, Record};
    use crate::hierarchy::MissingFieldPolicy;

    fn model(group_by: &[&str]) -> ViewModel {
        let catalog = Catalog::new(
            PathBuf::from("songs.csv"),
            vec![
                Record::from_iter([("producer", "A"), ("album", "X"), ("track", "t1")]),
                Record::from_iter([("producer", "B"), ("album", ""), ("track", "t2")]),
            ],
        );
        let config = ViewerConfig {
            data_path: PathBuf::from("songs.csv"),
            format: DataFormat::Csv,
            group_by: group_by.iter().map(|key| key.to_string()).collect(),
            limit: None,
            label_field: Some("track".to_owned()),
            root_label: "catalog".to_owned(),
            missing_fields: MissingFieldPolicy::Tolerant,
        };
        let mut model = ViewModel::new(catalog, &config);
        model.rebuild_render_graph();
        model
    }

    #[test]
    fn leaf_path_lists_every_group_value() {
        let model = model(&["producer", "album"]);
        assert_eq!(model.leaf_path_text(0, "t1").as_deref(), Some("catalog / A / X / t1"));
        assert_eq!(
            model.leaf_path_text(1, "t2").as_deref(),
            Some("catalog / B / (empty) / t2")
        );
    }

    #[test]
    fn leaf_path_includes_the_hidden_root() {
        let model = model(&["producer"]);
        assert_eq!(model.leaf_path_text(1, "t2").as_deref(), Some("catalog / B / t2"));
        assert_eq!(model.leaf_path_text(7, "t8"), None);
    }
}
