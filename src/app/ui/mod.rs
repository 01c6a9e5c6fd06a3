mod controls;
mod details;
mod panels;
mod tooltip;

pub(in crate::app) use tooltip::{draw_tooltip, tooltip_text};
