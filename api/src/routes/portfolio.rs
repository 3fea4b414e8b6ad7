use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use domain::{
    CreateHoldingRequest, PortfolioResponse, UpdateHoldingRequest, UserAccount, ValuedHolding,
};
use uuid::Uuid;
use valuation::value_portfolio;

use crate::{
    auth_middleware::CurrentUser,
    repositories::{HoldingChanges, NewHolding},
    services::analytics,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(get_portfolio))
        .route("/portfolio/holdings", post(add_holding))
        .route(
            "/portfolio/holdings/:holding_id",
            put(update_holding).delete(delete_holding),
        )
}

async fn load_account(state: &AppState, user_id: Uuid) -> Result<UserAccount, StatusCode> {
    state
        .user_repo
        .find_by_id(user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_portfolio(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<PortfolioResponse>, StatusCode> {
    let account = load_account(&state, user.claims().user_id).await?;
    let holdings = state
        .holding_repo
        .list_by_user(account.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let valuation = value_portfolio(&holdings, state.oracle.as_ref()).await;
    let premium_analytics = account
        .is_premium_user
        .then(analytics::premium_analytics);

    Ok(Json(PortfolioResponse {
        holdings: valuation.items,
        total_portfolio_value_usd: valuation.total_usd,
        is_premium_user: account.is_premium_user,
        premium_analytics,
    }))
}

async fn add_holding(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateHoldingRequest>,
) -> Result<(StatusCode, Json<ValuedHolding>), StatusCode> {
    let account = load_account(&state, user.claims().user_id).await?;

    // Freemium gate: non-premium accounts are capped.
    if !account.is_premium_user {
        let count = state
            .holding_repo
            .count_by_user(account.id)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if count >= state.config.free_tier_holding_limit as i64 {
            return Err(StatusCode::FORBIDDEN);
        }
    }

    let asset_id = payload.asset_id.trim().to_lowercase();
    let symbol = payload.symbol.trim().to_uppercase();
    if asset_id.is_empty() || symbol.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !payload.quantity.is_finite() || payload.quantity <= 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    if let Some(price) = payload.average_buy_price {
        if !price.is_finite() || price < 0.0 {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let holding = state
        .holding_repo
        .insert(NewHolding {
            user_id: account.id,
            asset_id,
            symbol,
            quantity: payload.quantity,
            average_buy_price: payload.average_buy_price,
            exchange_wallet: payload.exchange_wallet,
            notes: payload.notes,
        })
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let valued = value_single(&state, holding).await;
    Ok((StatusCode::CREATED, Json(valued)))
}

async fn update_holding(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(holding_id): Path<Uuid>,
    Json(payload): Json<UpdateHoldingRequest>,
) -> Result<Json<ValuedHolding>, StatusCode> {
    if let Some(quantity) = payload.quantity {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if let Some(Some(price)) = payload.average_buy_price {
        if !price.is_finite() || price < 0.0 {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let updated = state
        .holding_repo
        .update(
            user.claims().user_id,
            holding_id,
            HoldingChanges {
                quantity: payload.quantity,
                average_buy_price: payload.average_buy_price,
                exchange_wallet: payload.exchange_wallet,
                notes: payload.notes,
            },
        )
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(holding) = updated else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(value_single(&state, holding).await))
}

async fn delete_holding(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(holding_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .holding_repo
        .delete(user.claims().user_id, holding_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

// Price a single holding for the create/update responses; a one-element
// batch through the same valuation path.
async fn value_single(state: &AppState, holding: domain::Holding) -> ValuedHolding {
    let mut valuation = value_portfolio(std::slice::from_ref(&holding), state.oracle.as_ref()).await;
    valuation.items.remove(0)
}
