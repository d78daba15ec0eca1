pub mod app;
pub mod controls_panel;
pub mod overlay_view;

pub use app::App;
