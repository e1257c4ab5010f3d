use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use pricing_core::{Interval, Reading};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{error::page_window, ApiError, AppState};
use crate::transform::validate_meter_readings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricityReading {
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub reading: BigDecimal,
}

impl From<ElectricityReading> for Reading {
    fn from(r: ElectricityReading) -> Self {
        Reading::new(r.time, r.reading)
    }
}

impl From<Reading> for ElectricityReading {
    fn from(r: Reading) -> Self {
        Self {
            time: r.ts,
            reading: r.value,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReadings {
    pub smart_meter_id: Option<String>,
    pub electricity_readings: Option<Vec<ElectricityReading>>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn store_readings(
    State(state): State<AppState>,
    Json(payload): Json<MeterReadings>,
) -> Result<StatusCode, ApiError> {
    metrics::counter!("http_requests_total", "route" => "store_readings").increment(1);

    let readings: Option<Vec<Reading>> = payload
        .electricity_readings
        .map(|batch| batch.into_iter().map(Reading::from).collect());

    let (meter_id, readings) = match validate_meter_readings(payload.smart_meter_id, readings) {
        Ok(parts) => parts,
        Err(e) => {
            metrics::counter!("readings_rejected_total", "path" => "http").increment(1);
            return Err(e.into());
        }
    };

    let count = readings.len();
    let series_len = state.engine.store().append(&meter_id, readings);

    metrics::counter!("readings_ingested_total", "path" => "http").increment(count as u64);
    metrics::histogram!("store_series_length").record(series_len as f64);
    tracing::debug!(meter_id = %meter_id, count, series_len, "stored readings");

    Ok(StatusCode::OK)
}

pub async fn read_readings(
    State(state): State<AppState>,
    Path(smart_meter_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ElectricityReading>>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "read_readings").increment(1);

    let (offset, limit) = page_window(params.offset, params.limit)?;
    let readings = state.engine.store().page(&smart_meter_id, offset, limit)?;

    Ok(Json(readings.into_iter().map(ElectricityReading::from).collect()))
}

/// Cost of last calendar week's readings under the meter's own plan.
pub async fn last_week_cost(
    State(state): State<AppState>,
    Path(smart_meter_id): Path<String>,
) -> Result<Json<BigDecimal>, ApiError> {
    metrics::counter!("http_requests_total", "route" => "last_week_cost").increment(1);

    let interval = Interval::previous_week_from_now();
    let cost = state
        .engine
        .cost_for_own_plan_over_interval(&smart_meter_id, interval)?;

    Ok(Json(cost))
}
