//! GUI module - User interface components

mod app;
mod control_panel;
mod data_view;

pub use app::VhiApp;
pub use control_panel::{FilterPanel, PanelAction};
pub use data_view::DataView;
