use crate::calc::{preview, CalculationResult};
use crate::errors::AppError;
use crate::form::GatheringForm;
use crate::history::HistoryEntry;
use crate::models::{FieldUpdate, FormAction, FormSubmission, MaterialUpdate, SessionResponse};
use crate::session::Session;
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form, Json,
};
use chrono::Utc;
use tracing::debug;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.lock().await;
    let notice = session.take_notice();
    Html(render_index(&session, notice.as_ref()))
}

pub async fn submit_form(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let submission = FormSubmission::parse(pairs).map_err(AppError::bad_request)?;
    let mut session = state.session.lock().await;
    submission.apply_to(&mut session.form);

    match submission.action {
        Some(FormAction::Calculate) => {
            if let Err(err) = session.calculate() {
                debug!("calculation rejected: {err}");
            }
        }
        Some(FormAction::AddMaterial) => session.form.add_material(),
        Some(FormAction::RemoveMaterial(index)) => session.form.remove_material(index),
        Some(FormAction::Save) => {
            session.save(&state.repository, Utc::now()).await?;
        }
        Some(FormAction::Reset) => session.form.reset(),
        None => {}
    }

    Ok(Redirect::to("/"))
}

pub async fn delete_history_page(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Redirect, AppError> {
    let mut session = state.session.lock().await;
    session.delete_entry(&state.repository, index).await?;
    Ok(Redirect::to("/"))
}

pub async fn toggle_history(State(state): State<AppState>, Path(index): Path<usize>) -> Redirect {
    state.session.lock().await.toggle_expanded(index);
    Redirect::to("/")
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(to_response(&session))
}

pub async fn set_field(
    State(state): State<AppState>,
    Json(payload): Json<FieldUpdate>,
) -> Json<GatheringForm> {
    let mut session = state.session.lock().await;
    session.form.set_field(payload.field, &payload.value);
    Json(session.form.clone())
}

pub async fn add_material(State(state): State<AppState>) -> Json<GatheringForm> {
    let mut session = state.session.lock().await;
    session.form.add_material();
    Json(session.form.clone())
}

pub async fn update_material(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(payload): Json<MaterialUpdate>,
) -> Json<GatheringForm> {
    let mut session = state.session.lock().await;
    session
        .form
        .update_material(index, payload.field, &payload.value);
    Json(session.form.clone())
}

pub async fn remove_material(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Json<GatheringForm> {
    let mut session = state.session.lock().await;
    session.form.remove_material(index);
    Json(session.form.clone())
}

pub async fn reset_form(State(state): State<AppState>) -> Json<GatheringForm> {
    let mut session = state.session.lock().await;
    session.form.reset();
    Json(session.form.clone())
}

pub async fn calculate(State(state): State<AppState>) -> Result<Json<CalculationResult>, AppError> {
    let mut session = state.session.lock().await;
    let outcome = session.calculate().cloned();
    // the API reports the error itself
    session.take_notice();
    Ok(Json(outcome?))
}

pub async fn save(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let mut session = state.session.lock().await;
    session.save(&state.repository, Utc::now()).await?;
    session.take_notice();
    Ok(Json(session.history.clone()))
}

pub async fn get_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    let session = state.session.lock().await;
    Json(session.history.clone())
}

pub async fn delete_history(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let mut session = state.session.lock().await;
    session.delete_entry(&state.repository, index).await?;
    session.take_notice();
    Ok(Json(session.history.clone()))
}

fn to_response(session: &Session) -> SessionResponse {
    SessionResponse {
        form: session.form.clone(),
        result: session.result().cloned(),
        history: session.history.clone(),
        preview: preview(&session.form),
    }
}
