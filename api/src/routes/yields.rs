use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use domain::{Recommendation, RiskTolerance, YieldOpportunity};
use serde::Deserialize;

use crate::{auth_middleware::CurrentUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/yields/opportunities", get(opportunities))
        .route("/yields/recommendations", get(recommendations))
}

#[derive(Debug, Deserialize)]
struct OpportunityQuery {
    asset: Option<String>,
}

async fn opportunities(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<OpportunityQuery>,
) -> Json<Vec<YieldOpportunity>> {
    Json(state.yields.aggregate_all(params.asset.as_deref()).await)
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    risk_tolerance: Option<String>,
}

async fn recommendations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<Vec<Recommendation>>, StatusCode> {
    let account = state
        .user_repo
        .find_by_id(user.claims().user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !account.is_premium_user {
        return Err(StatusCode::FORBIDDEN);
    }

    // Absent tolerance defaults to medium; anything unrecognized is rejected.
    let tolerance = match params.risk_tolerance.as_deref() {
        None => RiskTolerance::Medium,
        Some(raw) => RiskTolerance::parse(raw).ok_or(StatusCode::BAD_REQUEST)?,
    };

    let holdings = state
        .holding_repo
        .list_by_user(account.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(state.yields.recommend(&holdings, tolerance).await))
}
