use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Router,
    Json,
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::state::AppState;
use crate::translate::interface::TranslationOutcome;
use crate::translate::{TranslationRequest, TranslationResult};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/translate", post(translate))
}

fn missing_text() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Missing \"text\" field"})),
    )
}

/// Failures inside the translator still answer 200; only a missing `text` is a 400.
async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TranslationResult>, (StatusCode, Json<Value>)> {
    let Json(body) = payload.map_err(|rejection| {
        debug!("Rejected translate request: {}", rejection.body_text());
        missing_text()
    })?;

    let outcome = match TranslationRequest::from_body(&body).ok_or_else(missing_text)? {
        Ok(request) => state.translator.translate(&request.text).await,
        Err(reason) => {
            debug!("Unusable text value: {}", reason);
            TranslationOutcome::Failed(reason)
        }
    };
    Ok(Json(outcome.into_result()))
}
