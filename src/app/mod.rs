use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Color32, Context, Pos2, Vec2};

use crate::catalog::{Catalog, DataFormat, load_catalog};
use crate::hierarchy::{MissingFieldPolicy, Tree};

mod graph;
mod highlight;
mod physics;
mod render_utils;
mod ui;

use graph::DiagramInteractions;
use physics::{ForceSettings, Simulation};

/// Startup settings resolved from the command line.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub data_path: PathBuf,
    pub format: DataFormat,
    pub group_by: Vec<String>,
    pub limit: Option<usize>,
    pub label_field: Option<String>,
    pub root_label: String,
    pub missing_fields: MissingFieldPolicy,
}

pub struct SongwebApp {
    config: ViewerConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Catalog, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Catalog, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    catalog: Catalog,
    primary_key: String,
    secondary_key: Option<String>,
    /// Keys past the second, only settable from the command line.
    extra_keys: Vec<String>,
    limit_enabled: bool,
    limit_input: usize,
    applied_limit: Option<usize>,
    label_field: String,
    root_label: String,
    missing_fields: MissingFieldPolicy,
    tree: Option<Tree>,
    build_error: Option<String>,
    search: String,
    selected: Option<usize>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    physics_link: f32,
    physics_charge: f32,
    physics_center: f32,
    physics_collision: f32,
    show_quadtree_overlay: bool,
    show_legend: bool,
    graph_dirty: bool,
    render_graph_revision: u64,
    graph_cache: Option<RenderGraph>,
    search_match_cache: Option<SearchMatchCache>,
    interactions: DiagramInteractions,
    hovered: Option<usize>,
    dragging: Option<usize>,
    tooltip: TooltipState,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Clone, Copy, Default)]
struct TooltipState {
    node: Option<usize>,
    anchor: Pos2,
    visible: bool,
}

/// Layout family picked from the number of group keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DiagramKind {
    /// One key: clusters float freely, the root is not drawn.
    Clusters,
    /// Two or more keys: a force-directed tree hanging off the root.
    Tree,
}

impl DiagramKind {
    fn for_tree(tree: &Tree) -> Self {
        if tree.is_flat() {
            Self::Clusters
        } else {
            Self::Tree
        }
    }

    fn zoom_extent(self) -> (f32, f32) {
        match self {
            Self::Clusters => (0.75, 5.0),
            Self::Tree => (0.05, 5.0),
        }
    }

    fn initial_zoom(self) -> f32 {
        match self {
            Self::Clusters => 1.0,
            Self::Tree => 0.5,
        }
    }

    fn node_radius(self, kind: &NodeKind, depth: usize) -> f32 {
        match (self, kind) {
            (Self::Clusters, NodeKind::Leaf { .. }) => 10.0,
            (Self::Clusters, _) => 20.0,
            (Self::Tree, _) => match depth {
                1 => 20.0,
                2 => 15.0,
                _ => 8.0,
            },
        }
    }

    /// Radius a hovered node grows to. Cluster diagrams keep sizes on hover.
    fn hover_radius(self, depth: usize) -> Option<f32> {
        match self {
            Self::Clusters => None,
            Self::Tree => Some(match depth {
                1 => 24.0,
                2 => 18.0,
                _ => 10.0,
            }),
        }
    }
}

struct RenderGraph {
    diagram: DiagramKind,
    nodes: Vec<RenderNode>,
    /// `(parent, child)` pairs.
    edges: Vec<(usize, usize)>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    root_index: Option<usize>,
    forces: ForceSettings,
    simulation: Simulation,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

struct PhysicsScratch {
    impulses: Vec<Vec2>,
    positions: Vec<Vec2>,
    link_counts: Vec<usize>,
}

struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    visible_mask: Vec<bool>,
    quadtree_positions: Vec<Vec2>,
    quadtree_cells: Vec<physics::QuadtreeCell>,
}

#[derive(Clone, Debug, PartialEq)]
enum NodeKind {
    Root { record_count: usize },
    Cluster { field: String, child_count: usize },
    Leaf { record: usize },
}

struct RenderNode {
    kind: NodeKind,
    label: String,
    depth: usize,
    world_pos: Vec2,
    velocity: Vec2,
    pinned: Option<Vec2>,
    base_radius: f32,
    fill: Color32,
    fill_override: Option<Color32>,
    radius_override: Option<f32>,
}

impl RenderNode {
    fn radius(&self) -> f32 {
        self.radius_override.unwrap_or(self.base_radius)
    }

    fn current_fill(&self) -> Color32 {
        self.fill_override.unwrap_or(self.fill)
    }

    fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

struct HighlightState {
    path_nodes: HashSet<usize>,
    path_edges: HashSet<(usize, usize)>,
    child_nodes: HashSet<usize>,
    child_edges: HashSet<(usize, usize)>,
}

#[derive(Clone, Copy)]
struct PhysicsTuning {
    link_scale: f32,
    charge_scale: f32,
    center_scale: f32,
    collision_scale: f32,
}

impl SongwebApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ViewerConfig) -> Self {
        let state = Self::start_load(&config);
        Self {
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(config: &ViewerConfig) -> Receiver<Result<Catalog, String>> {
        let (tx, rx) = mpsc::channel();
        let path = config.data_path.clone();
        let format = config.format;

        thread::spawn(move || {
            let result = load_catalog(&path, format).map_err(|error| {
                tracing::error!(path = %path.display(), "failed to load catalog: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: &ViewerConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }
}

impl eframe::App for SongwebApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(catalog) => {
                                AppState::Ready(Box::new(ViewModel::new(catalog, &self.config)))
                            }
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading song catalog...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the song catalog");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.config));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(&self.config));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(catalog) => {
                                    let mut next = ViewModel::new(catalog, &self.config);
                                    next.carry_settings_from(model);
                                    AppState::Ready(Box::new(next))
                                }
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
