use eframe::egui::{self, Color32, Pos2, Rect, Ui, Vec2};

use super::super::render_utils::{HOVER_FILL, circle_visible, screen_to_world};
use super::super::{DiagramKind, RenderNode, ViewModel};

const TOOLTIP_OFFSET: Vec2 = Vec2::new(5.0, -28.0);

/// Pointer event targeting one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct NodeEvent {
    pub(in crate::app) node: usize,
    /// Pointer in screen space.
    pub(in crate::app) pointer: Pos2,
    /// Pointer in world space.
    pub(in crate::app) world: Vec2,
    pub(in crate::app) node_world: Vec2,
    /// 0 for the root.
    pub(in crate::app) depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ZoomEvent {
    pub(in crate::app) pointer: Pos2,
    pub(in crate::app) canvas_center: Pos2,
    /// Wheel delta in points, positive to zoom in.
    pub(in crate::app) scroll: f32,
    pub(in crate::app) pan: Vec2,
    pub(in crate::app) zoom: f32,
}

/// Side effect requested by an interaction handler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum Effect {
    /// `None` restores the node's own fill.
    SetFill { node: usize, fill: Option<Color32> },
    /// `None` restores the node's own radius.
    SetRadius { node: usize, radius: Option<f32> },
    Pin { node: usize, at: Vec2 },
    Unpin { node: usize },
    SetAlphaTarget(f32),
    RestartSimulation,
    ShowTooltip { node: usize, at: Pos2 },
    HideTooltip,
    SetTransform { pan: Vec2, zoom: f32 },
}

pub(in crate::app) trait InteractionHandler {
    fn on_hover_start(&mut self, event: NodeEvent) -> Vec<Effect>;
    fn on_hover_end(&mut self, node: usize) -> Vec<Effect>;
    fn on_drag_start(&mut self, event: NodeEvent) -> Vec<Effect>;
    fn on_drag_move(&mut self, event: NodeEvent) -> Vec<Effect>;
    fn on_drag_end(&mut self, node: usize) -> Vec<Effect>;
    fn on_zoom(&mut self, event: ZoomEvent) -> Vec<Effect>;
}

/// Hover, drag and zoom behaviour for one diagram. Recreated with every rebuild.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct DiagramInteractions {
    diagram: DiagramKind,
    active_drags: usize,
}

impl DiagramInteractions {
    pub(in crate::app) fn new(diagram: DiagramKind) -> Self {
        Self {
            diagram,
            active_drags: 0,
        }
    }
}

impl InteractionHandler for DiagramInteractions {
    fn on_hover_start(&mut self, event: NodeEvent) -> Vec<Effect> {
        let mut effects = vec![Effect::SetFill {
            node: event.node,
            fill: Some(HOVER_FILL),
        }];
        if let Some(radius) = self.diagram.hover_radius(event.depth) {
            effects.push(Effect::SetRadius {
                node: event.node,
                radius: Some(radius),
            });
        }
        effects.push(Effect::ShowTooltip {
            node: event.node,
            at: event.pointer + TOOLTIP_OFFSET,
        });
        effects
    }

    fn on_hover_end(&mut self, node: usize) -> Vec<Effect> {
        vec![
            Effect::SetFill { node, fill: None },
            Effect::SetRadius { node, radius: None },
            Effect::HideTooltip,
        ]
    }

    fn on_drag_start(&mut self, event: NodeEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.active_drags == 0 {
            effects.push(Effect::SetAlphaTarget(0.3));
            effects.push(Effect::RestartSimulation);
        }
        self.active_drags += 1;
        effects.push(Effect::Pin {
            node: event.node,
            at: event.node_world,
        });
        effects
    }

    fn on_drag_move(&mut self, event: NodeEvent) -> Vec<Effect> {
        vec![Effect::Pin {
            node: event.node,
            at: event.world,
        }]
    }

    fn on_drag_end(&mut self, node: usize) -> Vec<Effect> {
        self.active_drags = self.active_drags.saturating_sub(1);
        let mut effects = Vec::new();
        if self.active_drags == 0 {
            effects.push(Effect::SetAlphaTarget(0.0));
        }
        effects.push(Effect::Unpin { node });
        effects
    }

    fn on_zoom(&mut self, event: ZoomEvent) -> Vec<Effect> {
        let (min_zoom, max_zoom) = self.diagram.zoom_extent();
        let factor = 2.0_f32.powf(event.scroll * 0.002);
        let zoom = (event.zoom * factor).clamp(min_zoom, max_zoom);
        if (zoom - event.zoom).abs() <= f32::EPSILON {
            return Vec::new();
        }

        // Keep the world point under the pointer fixed.
        let world_before = (event.pointer - event.canvas_center - event.pan) / event.zoom;
        let pan = event.pointer - event.canvas_center - world_before * zoom;
        vec![Effect::SetTransform { pan, zoom }]
    }
}

impl ViewModel {
    fn node_mut(&mut self, index: usize) -> Option<&mut RenderNode> {
        self.graph_cache.as_mut()?.nodes.get_mut(index)
    }

    pub(in crate::app) fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SetFill { node, fill } => {
                    if let Some(node) = self.node_mut(node) {
                        node.fill_override = fill;
                    }
                }
                Effect::SetRadius { node, radius } => {
                    if let Some(node) = self.node_mut(node) {
                        node.radius_override = radius;
                    }
                }
                Effect::Pin { node, at } => {
                    if let Some(node) = self.node_mut(node) {
                        node.pinned = Some(at);
                    }
                }
                Effect::Unpin { node } => {
                    if let Some(node) = self.node_mut(node) {
                        node.pinned = None;
                    }
                }
                Effect::SetAlphaTarget(target) => {
                    if let Some(cache) = self.graph_cache.as_mut() {
                        cache.simulation.set_alpha_target(target);
                    }
                }
                Effect::RestartSimulation => {
                    if let Some(cache) = self.graph_cache.as_mut() {
                        cache.simulation.restart();
                    }
                }
                Effect::ShowTooltip { node, at } => {
                    self.tooltip.node = Some(node);
                    self.tooltip.anchor = at;
                    self.tooltip.visible = true;
                }
                Effect::HideTooltip => self.tooltip.visible = false,
                Effect::SetTransform { pan, zoom } => {
                    self.pan = pan;
                    self.zoom = zoom;
                }
            }
        }
    }

    /// Translates this frame's pointer input into handler calls.
    pub(in crate::app) fn handle_graph_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        hovered: Option<usize>,
    ) {
        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let pointer = ui
                    .input(|input| input.pointer.hover_pos())
                    .unwrap_or_else(|| rect.center());
                let effects = self.interactions.on_zoom(ZoomEvent {
                    pointer,
                    canvas_center: rect.center(),
                    scroll,
                    pan: self.pan,
                    zoom: self.zoom,
                });
                self.apply_effects(effects);
            }
        }

        let pointer = response
            .interact_pointer_pos()
            .or_else(|| ui.input(|input| input.pointer.hover_pos()));

        if self.dragging.is_none() && hovered != self.hovered {
            if let Some(previous) = self.hovered.take() {
                let effects = self.interactions.on_hover_end(previous);
                self.apply_effects(effects);
            }
            if let (Some(node), Some(pointer)) = (hovered, pointer)
                && let Some(event) = self.node_event(rect, node, pointer)
            {
                let effects = self.interactions.on_hover_start(event);
                self.apply_effects(effects);
                self.hovered = Some(node);
            }
        } else if let (Some(node), Some(pointer)) = (self.hovered, pointer)
            && self.dragging.is_none()
        {
            self.tooltip.node = Some(node);
            self.tooltip.anchor = pointer + TOOLTIP_OFFSET;
        }

        if response.drag_started_by(egui::PointerButton::Primary)
            && let (Some(node), Some(pointer)) = (hovered, pointer)
            && let Some(event) = self.node_event(rect, node, pointer)
        {
            let effects = self.interactions.on_drag_start(event);
            self.apply_effects(effects);
            self.dragging = Some(node);
        }

        if let Some(node) = self.dragging {
            if response.drag_stopped() {
                let effects = self.interactions.on_drag_end(node);
                self.apply_effects(effects);
                self.dragging = None;
            } else if let Some(pointer) = pointer
                && let Some(event) = self.node_event(rect, node, pointer)
            {
                let effects = self.interactions.on_drag_move(event);
                self.apply_effects(effects);
            }
        } else if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn node_event(&self, rect: Rect, node: usize, pointer: Pos2) -> Option<NodeEvent> {
        let cache = self.graph_cache.as_ref()?;
        let render_node = cache.nodes.get(node)?;
        Some(NodeEvent {
            node,
            pointer,
            world: screen_to_world(rect, self.pan, self.zoom, pointer),
            node_world: render_node.world_pos,
            depth: render_node.depth,
        })
    }

    pub(in crate::app) fn visible_indices_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        out: &mut Vec<usize>,
    ) {
        out.clear();
        out.extend((0..screen_positions.len()).filter(|&index| {
            circle_visible(rect, screen_positions[index], screen_radii[index])
        }));
    }

    /// Closest visible node under the pointer.
    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
