//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, tab bar, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling
//! - `screens`: per-route and per-tab content

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
