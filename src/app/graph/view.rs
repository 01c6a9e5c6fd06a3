use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::hierarchy::palette_color;

use super::super::highlight::build_highlight_state;
use super::super::physics::{quadtree_cells, step_physics};
use super::super::render_utils::{
    blend_color, dim_color, draw_background, edge_visible, to_color32, world_to_screen,
};
use super::super::ui::{draw_tooltip, tooltip_text};
use super::super::{
    DiagramKind, NodeKind, PhysicsTuning, RenderGraph, SearchMatchCache, ViewModel,
};

const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(92, 92, 92, 153);
const SELECTED_RING: Color32 = Color32::from_rgb(214, 39, 40);
const LABEL_COLOR: Color32 = Color32::from_rgb(34, 38, 46);
const TOOLTIP_FADE_IN: f32 = 0.2;
const TOOLTIP_FADE_OUT: f32 = 0.5;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    fn physics_tuning(&self) -> PhysicsTuning {
        PhysicsTuning {
            link_scale: self.physics_link,
            charge_scale: self.physics_charge,
            center_scale: self.physics_center,
            collision_scale: self.physics_collision,
        }
    }

    fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for render_node in &cache.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, render_node.world_pos));
            scratch
                .screen_radii
                .push((render_node.radius() * zoom).max(1.5));
        }

        Self::visible_indices_into(
            rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
        scratch.visible_mask.clear();
        scratch.visible_mask.resize(cache.nodes.len(), false);
        for &index in &scratch.visible_indices {
            scratch.visible_mask[index] = true;
        }
    }

    /// Indices of nodes whose label, or any field of their song, fuzzy-matches the search box.
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.render_graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let cache = self.graph_cache.as_ref()?;
        let matcher = SkimMatcherV2::default();
        let matches = cache
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                if fuzzy_match_score(&matcher, &node.label, query).is_some() {
                    return true;
                }
                match node.kind {
                    NodeKind::Leaf { record } => {
                        self.catalog.records.get(record).is_some_and(|record| {
                            record.fields().any(|(_, value)| {
                                fuzzy_match_score(&matcher, value, query).is_some()
                            })
                        })
                    }
                    _ => false,
                }
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);
        tracing::debug!(query, matches = matches.len(), "search matches refreshed");

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        let placeholder = match &self.graph_cache {
            None => Some("No diagram yet. Pick a field to group by."),
            Some(cache) if cache.nodes.is_empty() => Some("No songs to show."),
            Some(_) => None,
        };
        if let Some(text) = placeholder {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(14.0),
                LABEL_COLOR,
            );
            return;
        }

        let tuning = self.physics_tuning();
        let mut physics_moving = false;
        if self.live_physics
            && let Some(cache) = self.graph_cache.as_mut()
        {
            physics_moving = step_physics(cache, tuning);
        }

        let (pan, zoom) = (self.pan, self.zoom);
        let hovered = self.graph_cache.as_mut().and_then(|cache| {
            Self::update_screen_space(rect, pan, zoom, cache);
            Self::hovered_index(
                ui,
                &cache.view_scratch.visible_indices,
                &cache.view_scratch.screen_positions,
                &cache.view_scratch.screen_radii,
            )
        });
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        self.handle_graph_input(ui, rect, &response, hovered);
        if response.clicked_by(egui::PointerButton::Primary) {
            self.selected = hovered;
        }

        let search_matches = self.cached_search_matches();
        let search_active = search_matches.is_some();
        let show_quadtree_overlay = self.show_quadtree_overlay;
        let (pan, zoom) = (self.pan, self.zoom);
        let selected = self.selected;
        let hovered_now = self.hovered;

        let Some(cache) = self.graph_cache.as_mut() else {
            return;
        };
        let highlight = selected
            .filter(|&index| index < cache.nodes.len())
            .map(|index| build_highlight_state(cache, index));

        // Pan, zoom and drags above may have moved things since hit testing.
        Self::update_screen_space(rect, pan, zoom, cache);
        self.visible_node_count = cache.view_scratch.visible_indices.len();

        if show_quadtree_overlay {
            quadtree_cells(
                &cache.nodes,
                &mut cache.view_scratch.quadtree_positions,
                &mut cache.view_scratch.quadtree_cells,
            );
            for cell in &cache.view_scratch.quadtree_cells {
                let min = world_to_screen(rect, pan, zoom, cell.min);
                let max = world_to_screen(rect, pan, zoom, cell.min + vec2(cell.side, cell.side));
                let alpha = if cell.is_leaf { 110 } else { 55 };
                let width = (1.4 - cell.depth as f32 * 0.09).clamp(0.45, 1.4);
                painter.rect_stroke(
                    Rect::from_two_pos(min, max),
                    0.0,
                    Stroke::new(width, Color32::from_rgba_unmultiplied(31, 119, 180, alpha)),
                    egui::StrokeKind::Middle,
                );
            }
        }

        let mut visible_edge_count = 0usize;
        for &(parent, child) in &cache.edges {
            let start = cache.view_scratch.screen_positions[parent];
            let end = cache.view_scratch.screen_positions[child];
            let either_visible =
                cache.view_scratch.visible_mask[parent] || cache.view_scratch.visible_mask[child];
            if !either_visible && !edge_visible(rect, start, end, 2.0) {
                continue;
            }

            let base_width = match cache.diagram {
                DiagramKind::Tree if cache.nodes[child].is_leaf() => 1.0,
                _ => 2.0,
            };
            let highlighted = highlight
                .as_ref()
                .is_some_and(|state| state.contains_edge((parent, child)));
            let stroke = if highlighted {
                Stroke::new(base_width + 1.5, SELECTED_RING)
            } else if highlight.is_some() || search_active {
                Stroke::new(base_width, dim_color(LINK_COLOR, 0.35))
            } else {
                Stroke::new(base_width, LINK_COLOR)
            };
            painter.line_segment([start, end], stroke);
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        let mut animating = false;
        for &index in &cache.view_scratch.visible_indices {
            let render_node = &cache.nodes[index];
            let position = cache.view_scratch.screen_positions[index];
            let radius = cache.view_scratch.screen_radii[index];

            let is_selected = selected == Some(index);
            let is_hovered = hovered_now == Some(index);
            let in_highlight = highlight
                .as_ref()
                .is_some_and(|state| state.contains_node(index));
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let fill = render_node.current_fill();
            let fill = if render_node.fill_override.is_some() || in_highlight || is_match {
                fill
            } else if highlight.is_some() || search_active {
                dim_color(fill, 0.3)
            } else {
                fill
            };
            painter.circle_filled(position, radius, fill);
            painter.circle_stroke(position, radius, Stroke::new(1.5, Color32::WHITE));

            let selection_mix = ui
                .ctx()
                .animate_bool(ui.make_persistent_id(("node-selection", index)), is_selected);
            if selection_mix > 0.0 {
                if selection_mix < 1.0 {
                    animating = true;
                }
                painter.circle_stroke(
                    position,
                    radius + 2.0 + (1.0 - selection_mix) * 6.0,
                    Stroke::new(
                        2.0,
                        blend_color(Color32::TRANSPARENT, SELECTED_RING, selection_mix),
                    ),
                );
            }
            if is_match && !is_selected {
                painter.circle_stroke(
                    position,
                    radius + 2.0,
                    Stroke::new(1.5, to_color32(palette_color(9))),
                );
            }

            let show_label = match (cache.diagram, render_node.is_leaf()) {
                (_, false) | (DiagramKind::Clusters, true) => true,
                (DiagramKind::Tree, true) => is_hovered || is_selected,
            };
            if show_label {
                painter.text(
                    position + vec2(radius + 4.0, 0.0),
                    Align2::LEFT_CENTER,
                    &render_node.label,
                    FontId::proportional(11.0),
                    LABEL_COLOR,
                );
            }
        }

        if let Some(node) = self.tooltip.node {
            let duration = if self.tooltip.visible {
                TOOLTIP_FADE_IN
            } else {
                TOOLTIP_FADE_OUT
            };
            let fade = ui.ctx().animate_bool_with_time(
                ui.make_persistent_id("node-tooltip"),
                self.tooltip.visible,
                duration,
            );
            if fade > 0.0 && fade < 1.0 {
                animating = true;
            }
            if fade <= 0.0 && !self.tooltip.visible {
                self.tooltip.node = None;
            } else {
                let text = tooltip_text(cache, &self.catalog.records, node);
                draw_tooltip(&painter, self.tooltip.anchor, text, fade);
            }
        }

        if cache.diagram == DiagramKind::Tree && self.show_legend {
            let keys = self.tree.as_ref().map(|tree| tree.keys.as_slice()).unwrap_or_default();
            Self::draw_legend(&painter, rect, &self.root_label, keys);
        }

        if physics_moving || animating || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }
    }

    /// Level names with their depth colors, top-left of the canvas.
    fn draw_legend(painter: &egui::Painter, rect: Rect, root_label: &str, keys: &[String]) {
        let levels = std::iter::once(root_label)
            .chain(keys.iter().map(String::as_str))
            .chain(std::iter::once("song"));
        let mut cursor = rect.left_top() + vec2(14.0, 16.0);
        for (depth, level) in levels.enumerate() {
            painter.circle_filled(cursor, 6.0, to_color32(palette_color(depth)));
            painter.text(
                cursor + vec2(12.0, 0.0),
                Align2::LEFT_CENTER,
                level,
                FontId::proportional(12.0),
                LABEL_COLOR,
            );
            cursor.y += 18.0;
        }
    }
}
