pub mod error;
pub mod price_plans;
pub mod readings;

use axum::{
    routing::{get, post},
    Router,
};
use pricing_core::CostEngine;

pub use error::ApiError;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct AppState {
    pub engine: CostEngine,
}

pub fn router(engine: CostEngine) -> Router {
    Router::new()
        .route("/readings/store", post(readings::store_readings))
        .route("/readings/read/:smart_meter_id", get(readings::read_readings))
        .route("/readings/last-week-cost/:smart_meter_id", get(readings::last_week_cost))
        .route("/price-plans/comparisons", get(price_plans::compare_all))
        .route("/price-plans/recommendations", get(price_plans::recommend_cheapest))
        .with_state(AppState { engine })
}
