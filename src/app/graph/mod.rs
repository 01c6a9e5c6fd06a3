mod build;
mod interaction;
mod view;

pub(in crate::app) use build::render_graph_for_tree;
pub(in crate::app) use interaction::DiagramInteractions;
