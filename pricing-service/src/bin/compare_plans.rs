use anyhow::{bail, Context, Result};
use pricing_core::{CostEngine, ReadingStore};
use pricing_service::{backfill, config::AppConfig, observability};
use std::{env, path::Path, sync::Arc};

/// Ranks every catalog plan for one meter's readings from a CSV file.
///
/// Usage:
///   compare_plans <csv_file_path> <smart_meter_id> [top_n]
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: compare_plans <csv_file_path> <smart_meter_id> [top_n]");
    }
    let file_path = Path::new(&args[1]);
    let meter_id = &args[2];

    // PRICING_CONFIG selects the catalog; accounts and seeding are ignored here.
    let cfg = AppConfig::load()?;
    let catalog = cfg.price_plan_catalog().context("invalid price plan catalog")?;
    let top_n = match args.get(3) {
        Some(n) => n.parse().with_context(|| format!("invalid top_n '{n}'"))?,
        None => catalog.len(),
    };

    let store = Arc::new(ReadingStore::with_shards(cfg.store.shards));
    backfill::backfill_csv(file_path, store.clone(), cfg.seed.backfill_batch_size).await?;

    let series_len = store
        .len(meter_id)
        .with_context(|| format!("no readings for meter '{meter_id}' in {}", file_path.display()))?;

    let engine = CostEngine::new(store, Arc::new(catalog), Arc::new(cfg.account_directory()));
    let ranked = engine.rank_cheapest(meter_id, 0, series_len, top_n)?;

    for (rank, plan) in ranked.iter().enumerate() {
        println!("{:>2}. {:<24} {}", rank + 1, plan.plan_name, plan.cost);
    }

    Ok(())
}
