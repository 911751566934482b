pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod exercises;
pub mod state;

pub use app::build_app;
pub use state::AppState;
