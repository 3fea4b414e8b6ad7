use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use domain::DataConsentRequest;
use serde::Serialize;

use crate::{auth_middleware::CurrentUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/user/preferences/data_consent", post(update_data_consent))
}

#[derive(Serialize)]
struct ConsentResponse {
    msg: &'static str,
    consent_status: bool,
}

async fn update_data_consent(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<DataConsentRequest>,
) -> Result<Json<ConsentResponse>, StatusCode> {
    let updated = state
        .user_repo
        .set_data_consent(user.claims().user_id, payload.consent)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !updated {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(ConsentResponse {
        msg: "Data consent preference updated successfully.",
        consent_status: payload.consent,
    }))
}
