//! Reshapes flat catalog records into a rooted cluster tree.

mod build;
mod error;
mod palette;
mod tree;

pub use build::{BuildOptions, MissingFieldPolicy, build};
pub use palette::{Rgb, palette_color};
pub use tree::{ClusterChildren, ClusterNode, Tree};
