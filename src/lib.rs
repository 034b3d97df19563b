pub mod app;
pub mod calc;
pub mod config;
pub mod errors;
pub mod form;
pub mod format;
pub mod handlers;
pub mod history;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::ServerConfig;
pub use state::AppState;
pub use storage::{FileStore, HistoryRepository};
