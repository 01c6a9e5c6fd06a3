use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::catalog::Catalog;
use crate::hierarchy::BuildOptions;
use crate::util::count_label;

use super::super::graph::DiagramInteractions;
use super::super::{DiagramKind, ViewModel, ViewerConfig};

const DEFAULT_TOP_SONGS: usize = 100;

impl ViewModel {
    pub(in crate::app) fn new(catalog: Catalog, config: &ViewerConfig) -> Self {
        let mut unique_keys: Vec<&String> = Vec::with_capacity(config.group_by.len());
        for key in &config.group_by {
            if !unique_keys.contains(&key) {
                unique_keys.push(key);
            }
        }
        let mut keys = unique_keys.into_iter();
        let primary_key = keys
            .next()
            .cloned()
            .or_else(|| catalog.schema.first().cloned())
            .unwrap_or_default();
        let secondary_key = keys.next().cloned();
        let extra_keys = keys.cloned().collect::<Vec<_>>();

        for key in config.group_by.iter() {
            if !catalog.has_field(key) {
                tracing::warn!(field = %key, "group-by field is not present in any record");
            }
        }

        let mut group_keys = vec![primary_key.clone()];
        group_keys.extend(secondary_key.iter().cloned());
        let label_field = config
            .label_field
            .clone()
            .or_else(|| catalog.default_label_field(&group_keys))
            .unwrap_or_default();

        let limit_input = config
            .limit
            .unwrap_or_else(|| DEFAULT_TOP_SONGS.min(catalog.record_count()).max(1));

        Self {
            catalog,
            primary_key,
            secondary_key,
            extra_keys,
            limit_enabled: config.limit.is_some(),
            limit_input,
            applied_limit: config.limit,
            label_field,
            root_label: config.root_label.clone(),
            missing_fields: config.missing_fields,
            tree: None,
            build_error: None,
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            physics_link: 1.0,
            physics_charge: 1.0,
            physics_center: 1.0,
            physics_collision: 1.0,
            show_quadtree_overlay: false,
            show_legend: true,
            graph_dirty: true,
            render_graph_revision: 0,
            graph_cache: None,
            search_match_cache: None,
            interactions: DiagramInteractions::new(DiagramKind::Clusters),
            hovered: None,
            dragging: None,
            tooltip: Default::default(),
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    /// Keeps the user's grouping and tuning across a data reload.
    pub(in crate::app) fn carry_settings_from(&mut self, previous: &ViewModel) {
        self.primary_key = previous.primary_key.clone();
        self.secondary_key = previous.secondary_key.clone();
        self.extra_keys = previous.extra_keys.clone();
        self.limit_enabled = previous.limit_enabled;
        self.limit_input = previous.limit_input;
        self.applied_limit = previous.applied_limit;
        self.label_field = previous.label_field.clone();
        self.search = previous.search.clone();
        self.live_physics = previous.live_physics;
        self.physics_link = previous.physics_link;
        self.physics_charge = previous.physics_charge;
        self.physics_center = previous.physics_center;
        self.physics_collision = previous.physics_collision;
        self.show_quadtree_overlay = previous.show_quadtree_overlay;
        self.show_legend = previous.show_legend;
        self.graph_dirty = true;
    }

    pub(in crate::app) fn build_options(&self) -> BuildOptions {
        BuildOptions {
            limit: self.applied_limit,
            missing_fields: self.missing_fields,
            root_label: self.root_label.clone(),
        }
    }

    fn summary_text(&self) -> Option<String> {
        let tree = self.tree.as_ref()?;
        let cache = self.graph_cache.as_ref()?;
        Some(format!(
            "{} in {} / visible {} nodes, {} links",
            count_label(tree.leaf_count(), "song", "songs"),
            count_label(tree.cluster_count(), "cluster", "clusters"),
            self.visible_node_count.min(cache.nodes.len()),
            self.visible_edge_count.min(cache.edges.len()),
        ))
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("songweb");
                    ui.separator();
                    ui.label(format!("source: {}", self.catalog.source.display()));
                    ui.label(count_label(self.catalog.record_count(), "record", "records"));
                    ui.label(format!("fields: {}", self.catalog.schema.len()));
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Rebuild").clicked() {
                        self.graph_dirty = true;
                    }
                    if is_reloading {
                        ui.spinner();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(summary) = self.summary_text() {
                            ui.label(summary);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::catalog::{DataFormat, Record};
    use crate::hierarchy::MissingFieldPolicy;

    fn song(director: &str, year: &str, title: &str) -> Record {
        Record::from_iter([("director", director), ("year", year), ("title", title)])
    }

    fn catalog() -> Catalog {
        Catalog::new(
            PathBuf::from("songs.json"),
            vec![
                song("Nolan", "2010", "Inception"),
                song("Nolan", "2014", "Interstellar"),
                song("Villeneuve", "2016", "Arrival"),
            ],
        )
    }

    fn config(group_by: &[&str]) -> ViewerConfig {
        ViewerConfig {
            data_path: PathBuf::from("songs.json"),
            format: DataFormat::Auto,
            group_by: group_by.iter().map(|key| key.to_string()).collect(),
            limit: None,
            label_field: None,
            root_label: "catalog".to_owned(),
            missing_fields: MissingFieldPolicy::Tolerant,
        }
    }

    #[test]
    fn defaults_come_from_the_schema() {
        let model = ViewModel::new(catalog(), &config(&[]));
        assert_eq!(model.primary_key, "director");
        assert_eq!(model.secondary_key, None);
        assert_eq!(model.label_field, "year");
        assert_eq!(model.group_keys(), vec!["director".to_owned()]);
        assert!(!model.limit_enabled);
        assert_eq!(model.limit_input, 3);
    }

    #[test]
    fn command_line_keys_fill_both_dropdowns_and_the_rest() {
        let model = ViewModel::new(catalog(), &config(&["year", "director", "title"]));
        assert_eq!(model.primary_key, "year");
        assert_eq!(model.secondary_key.as_deref(), Some("director"));
        assert_eq!(model.extra_keys, vec!["title".to_owned()]);
        assert_eq!(model.label_field, "title");
        assert_eq!(model.group_keys(), vec!["year", "director", "title"]);
    }

    #[test]
    fn repeated_command_line_keys_are_used_once() {
        let model = ViewModel::new(catalog(), &config(&["director", "director", "year"]));
        assert_eq!(model.primary_key, "director");
        assert_eq!(model.secondary_key.as_deref(), Some("year"));
        assert!(model.extra_keys.is_empty());
        assert_eq!(model.group_keys(), vec!["director", "year"]);
    }

    #[test]
    fn extra_keys_survive_a_secondary_equal_to_the_primary() {
        let mut model = ViewModel::new(catalog(), &config(&["year", "director", "title"]));
        model.primary_key = "director".to_owned();
        assert_eq!(model.group_keys(), vec!["director", "title"]);
    }

    #[test]
    fn empty_catalog_builds_an_empty_diagram() {
        let empty = Catalog::new(PathBuf::from("songs.json"), Vec::new());
        let mut model = ViewModel::new(empty, &config(&[]));
        model.rebuild_render_graph();

        assert!(model.build_error.is_none());
        assert_eq!(model.graph_cache.as_ref().map(|cache| cache.nodes.len()), Some(0));
        assert!(model.tree.as_ref().is_some_and(|tree| tree.children.is_empty()));
    }

    #[test]
    fn first_frame_builds_the_diagram() {
        let mut model = ViewModel::new(catalog(), &config(&["director"]));
        model.rebuild_render_graph();

        let cache = model.graph_cache.as_ref().unwrap();
        assert_eq!(cache.diagram, DiagramKind::Clusters);
        assert_eq!(cache.nodes.len(), 5);
        assert_eq!(model.zoom, 1.0);
        assert!(model.build_error.is_none());
    }

    #[test]
    fn failed_rebuild_keeps_the_previous_diagram() {
        let mut strict = config(&["director"]);
        strict.missing_fields = MissingFieldPolicy::Strict;
        let mut model = ViewModel::new(catalog(), &strict);
        model.rebuild_render_graph();
        let revision = model.render_graph_revision;

        model.primary_key = "genre".to_owned();
        model.rebuild_render_graph();

        assert_eq!(model.render_graph_revision, revision);
        assert!(model.graph_cache.is_some());
        assert!(
            model
                .build_error
                .as_deref()
                .is_some_and(|error| error.contains("genre"))
        );
    }

    #[test]
    fn reload_keeps_grouping_and_tuning() {
        let mut previous = ViewModel::new(catalog(), &config(&["director"]));
        previous.secondary_key = Some("year".to_owned());
        previous.applied_limit = Some(2);
        previous.physics_charge = 2.0;

        let mut next = ViewModel::new(catalog(), &config(&[]));
        next.carry_settings_from(&previous);

        assert_eq!(next.group_keys(), vec!["director", "year"]);
        assert_eq!(next.build_options().limit, Some(2));
        assert_eq!(next.physics_charge, 2.0);
        assert!(next.graph_dirty);
    }

    #[test]
    fn switching_to_two_keys_zooms_out_for_the_tree() {
        let mut model = ViewModel::new(catalog(), &config(&["director"]));
        model.rebuild_render_graph();
        model.secondary_key = Some("year".to_owned());
        model.rebuild_render_graph();

        assert_eq!(model.graph_cache.as_ref().unwrap().diagram, DiagramKind::Tree);
        assert_eq!(model.zoom, 0.5);
    }
}
