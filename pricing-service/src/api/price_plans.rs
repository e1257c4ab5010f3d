use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use bigdecimal::BigDecimal;
use pricing_core::AccountDirectory;
use serde::{Deserialize, Serialize};

use super::{error::page_window, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ComparisonParams {
    #[serde(rename = "smart-meter-id")]
    pub smart_meter_id: String,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    /// Number of plans to recommend; defaults to `limit`.
    pub top: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePlanComparisons {
    pub price_plan_id: Option<String>,
    pub price_plan_comparisons: BTreeMap<String, BigDecimal>,
}

pub async fn compare_all(
    State(state): State<AppState>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<PricePlanComparisons>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "compare_all").increment(1);

    let (offset, limit) = page_window(params.offset, params.limit)?;
    let costs = state
        .engine
        .cost_for_each_plan(&params.smart_meter_id, offset, limit)?;

    Ok(Json(PricePlanComparisons {
        price_plan_id: state.engine.accounts().lookup_plan_name(&params.smart_meter_id),
        price_plan_comparisons: costs.into_iter().map(|c| (c.plan_name, c.cost)).collect(),
    }))
}

/// Cheapest plans first, each as a single-entry `{plan: cost}` object.
pub async fn recommend_cheapest(
    State(state): State<AppState>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<Vec<BTreeMap<String, BigDecimal>>>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "recommend_cheapest").increment(1);

    let (offset, limit) = page_window(params.offset, params.limit)?;
    let top_n = match params.top {
        Some(top) => usize::try_from(top)
            .map_err(|_| ApiError::InvalidInput(format!("top must be non-negative, got {top}")))?,
        None => limit,
    };

    let ranked = state
        .engine
        .rank_cheapest(&params.smart_meter_id, offset, limit, top_n)?;

    Ok(Json(
        ranked
            .into_iter()
            .map(|c| BTreeMap::from([(c.plan_name, c.cost)]))
            .collect(),
    ))
}
