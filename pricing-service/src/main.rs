use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use pricing_core::{CostEngine, ReadingStore};
use pricing_service::{api, backfill, config::AppConfig, metrics_server, observability, seed};
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let catalog = cfg.price_plan_catalog().context("invalid price plan catalog")?;
    let accounts = cfg.account_directory();
    let store = Arc::new(ReadingStore::with_shards(cfg.store.shards));
    tracing::info!(
        plans = catalog.len(),
        accounts = accounts.len(),
        shards = store.shard_count(),
        "pricing catalog loaded"
    );

    if cfg.seed.readings_per_meter > 0 {
        seed::seed_meters(
            &store,
            accounts.meter_ids(),
            cfg.seed.readings_per_meter,
            OffsetDateTime::now_utc(),
            &mut rand::thread_rng(),
        );
    }

    if let Some(path) = &cfg.seed.backfill_csv {
        backfill::backfill_csv(path, store.clone(), cfg.seed.backfill_batch_size).await?;
    }

    let engine = CostEngine::new(store, Arc::new(catalog), Arc::new(accounts));

    let addr: SocketAddr = cfg
        .http
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid http.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pricing service listening");

    axum::serve(listener, api::router(engine).into_make_service()).await?;

    Ok(())
}
