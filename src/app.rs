use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, patch, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/form", post(handlers::submit_form))
        .route("/history/:index/delete", post(handlers::delete_history_page))
        .route("/history/:index/toggle", post(handlers::toggle_history))
        .route("/api/session", get(handlers::get_session))
        .route("/api/form/field", post(handlers::set_field))
        .route("/api/form/materials", post(handlers::add_material))
        .route(
            "/api/form/materials/:index",
            patch(handlers::update_material).delete(handlers::remove_material),
        )
        .route("/api/form/reset", post(handlers::reset_form))
        .route("/api/calculate", post(handlers::calculate))
        .route("/api/save", post(handlers::save))
        .route("/api/history", get(handlers::get_history))
        .route("/api/history/:index", delete(handlers::delete_history))
        .with_state(state)
}
