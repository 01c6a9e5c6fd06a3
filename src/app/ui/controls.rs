use eframe::egui::{self, Color32, RichText, Ui};

use crate::util::field_caption;

use super::super::ViewModel;

const MAX_FORCE_SCALE: f32 = 3.0;

fn force_slider(ui: &mut Ui, value: &mut f32, text: &str, hint: &str) -> bool {
    ui.add(
        egui::Slider::new(value, 0.0..=MAX_FORCE_SCALE)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hint)
    .changed()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_grouping_controls(ui);
        ui.separator();
        self.draw_limit_controls(ui);
        ui.separator();

        ui.label("Search")
            .on_hover_text("Fuzzy-highlight songs and clusters without changing the diagram.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Matches labels and every field of a song.");

        ui.separator();
        self.draw_physics_controls(ui);

        if let Some(error) = &self.build_error {
            ui.separator();
            ui.label(
                RichText::new("Last rebuild failed")
                    .strong()
                    .color(Color32::from_rgb(214, 39, 40)),
            );
            ui.label(error.as_str());
            ui.small("The previous diagram is still shown.");
        }
    }

    fn draw_grouping_controls(&mut self, ui: &mut Ui) {
        let mut changed = false;
        let schema = self.catalog.schema.clone();

        ui.label("Group by");
        egui::ComboBox::from_id_salt("group_by")
            .selected_text(field_caption(&self.primary_key))
            .show_ui(ui, |ui| {
                for field in &schema {
                    changed |= ui
                        .selectable_value(
                            &mut self.primary_key,
                            field.clone(),
                            field_caption(field),
                        )
                        .changed();
                }
            });

        ui.label("Then by");
        let then_text = self
            .secondary_key
            .as_deref()
            .map(field_caption)
            .unwrap_or_else(|| "None".to_owned());
        egui::ComboBox::from_id_salt("then_by")
            .selected_text(then_text)
            .show_ui(ui, |ui| {
                changed |= ui
                    .selectable_value(&mut self.secondary_key, None, "None")
                    .changed();
                for field in schema.iter().filter(|field| **field != self.primary_key) {
                    changed |= ui
                        .selectable_value(
                            &mut self.secondary_key,
                            Some(field.clone()),
                            field_caption(field),
                        )
                        .changed();
                }
            });

        if !self.extra_keys.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label(format!(
                    "Also by: {}",
                    self.extra_keys
                        .iter()
                        .map(|key| field_caption(key))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
                if ui.small_button("Clear").clicked() {
                    self.extra_keys.clear();
                    changed = true;
                }
            });
        }

        ui.label("Leaf label");
        egui::ComboBox::from_id_salt("label_field")
            .selected_text(field_caption(&self.label_field))
            .show_ui(ui, |ui| {
                for field in &schema {
                    changed |= ui
                        .selectable_value(
                            &mut self.label_field,
                            field.clone(),
                            field_caption(field),
                        )
                        .changed();
                }
            });

        if changed {
            tracing::debug!(keys = ?self.group_keys(), "grouping changed");
            self.graph_dirty = true;
        }
    }

    fn draw_limit_controls(&mut self, ui: &mut Ui) {
        let record_count = self.catalog.record_count().max(1);

        ui.checkbox(&mut self.limit_enabled, "Top songs only")
            .on_hover_text("Keep only the first N songs of the file before grouping.");
        ui.horizontal(|ui| {
            ui.add_enabled_ui(self.limit_enabled, |ui| {
                ui.label("Top songs");
                ui.add(egui::DragValue::new(&mut self.limit_input).range(0..=record_count));
            });
            if ui.button("Update").clicked() {
                self.applied_limit = self.limit_enabled.then_some(self.limit_input);
                self.graph_dirty = true;
            }
        });

        if let Some(limit) = self.applied_limit {
            ui.small(format!(
                "Showing the first {limit} of {} songs.",
                self.catalog.record_count()
            ));
        }
    }

    fn draw_physics_controls(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.live_physics, "Live physics")
            .on_hover_text("Keep the force simulation running.");
        ui.checkbox(&mut self.show_legend, "Show legend")
            .on_hover_text("Level colors for multi-level diagrams.");
        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree")
            .on_hover_text("Draw the Barnes-Hut cells used for charge.");

        ui.collapsing("Physics tuning", |ui| {
            let mut changed = false;
            changed |= force_slider(
                ui,
                &mut self.physics_link,
                "Link",
                "How strongly linked nodes pull toward their rest length.",
            );
            changed |= force_slider(
                ui,
                &mut self.physics_charge,
                "Charge",
                "How strongly nodes push each other away.",
            );
            changed |= force_slider(
                ui,
                &mut self.physics_center,
                "Centering",
                "How strongly the layout is pulled back to the middle.",
            );
            changed |= force_slider(
                ui,
                &mut self.physics_collision,
                "Collision",
                "Scale of the no-overlap radius in tree diagrams.",
            );

            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    self.physics_link = 1.0;
                    self.physics_charge = 1.0;
                    self.physics_center = 1.0;
                    self.physics_collision = 1.0;
                    changed = true;
                }
                if ui.button("Reheat").clicked() {
                    changed = true;
                }
            });

            if changed && let Some(cache) = self.graph_cache.as_mut() {
                cache.simulation.reheat();
            }
        });
    }
}
