//! Reusable UI components

mod loading;
mod log_pane;
mod status_bar;

pub use loading::*;
pub use log_pane::*;
pub use status_bar::*;
