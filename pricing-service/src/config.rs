use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use bigdecimal::BigDecimal;
use pricing_core::{
    pricing::{CatalogError, PeakTimeMultiplier},
    store::DEFAULT_SHARDS,
    InMemoryAccounts, PricePlan, PricePlanCatalog,
};
use serde::Deserialize;
use time::Weekday;

pub const CONFIG_ENV: &str = "PRICING_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "pricing-config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<DayOfWeek> for Weekday {
    fn from(d: DayOfWeek) -> Self {
        match d {
            DayOfWeek::Monday => Weekday::Monday,
            DayOfWeek::Tuesday => Weekday::Tuesday,
            DayOfWeek::Wednesday => Weekday::Wednesday,
            DayOfWeek::Thursday => Weekday::Thursday,
            DayOfWeek::Friday => Weekday::Friday,
            DayOfWeek::Saturday => Weekday::Saturday,
            DayOfWeek::Sunday => Weekday::Sunday,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub shards: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { shards: DEFAULT_SHARDS }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeakMultiplierConfig {
    pub day: DayOfWeek,
    pub multiplier: BigDecimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricePlanConfig {
    pub name: String,
    pub supplier: String,
    pub unit_rate: BigDecimal,
    #[serde(default)]
    pub peak_multipliers: Vec<PeakMultiplierConfig>,
}

impl From<&PricePlanConfig> for PricePlan {
    fn from(c: &PricePlanConfig) -> Self {
        let multipliers = c
            .peak_multipliers
            .iter()
            .map(|m| PeakTimeMultiplier::new(m.day.into(), m.multiplier.clone()))
            .collect();

        PricePlan::new(c.name.clone(), c.supplier.clone(), c.unit_rate.clone(), multipliers)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Random readings generated per account meter at startup; 0 disables.
    pub readings_per_meter: usize,
    /// CSV file (smart_meter_id,time,reading) loaded into the store at startup.
    pub backfill_csv: Option<PathBuf>,
    pub backfill_batch_size: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            readings_per_meter: 20,
            backfill_csv: None,
            backfill_batch_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub metrics: Option<MetricsConfig>,
    #[serde(default = "default_price_plans")]
    pub price_plans: Vec<PricePlanConfig>,
    #[serde(default = "default_accounts")]
    pub accounts: HashMap<String, String>,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            store: StoreConfig::default(),
            metrics: None,
            price_plans: default_price_plans(),
            accounts: default_accounts(),
            seed: SeedConfig::default(),
        }
    }
}

fn default_price_plans() -> Vec<PricePlanConfig> {
    let plan = |name: &str, supplier: &str, rate: u32| PricePlanConfig {
        name: name.to_string(),
        supplier: supplier.to_string(),
        unit_rate: BigDecimal::from(rate),
        peak_multipliers: Vec::new(),
    };

    vec![
        plan("price-plan-0", "Dr Evil's Dark Energy", 10),
        plan("price-plan-1", "The Green Eco", 2),
        plan("price-plan-2", "Power for Everyone", 1),
    ]
}

fn default_accounts() -> HashMap<String, String> {
    [
        ("smart-meter-0", "price-plan-0"),
        ("smart-meter-1", "price-plan-1"),
        ("smart-meter-2", "price-plan-0"),
        ("smart-meter-3", "price-plan-2"),
        ("smart-meter-4", "price-plan-1"),
    ]
    .into_iter()
    .map(|(meter, plan)| (meter.to_string(), plan.to_string()))
    .collect()
}

impl AppConfig {
    /// Reads the file named by `PRICING_CONFIG`, else `pricing-config.toml` if
    /// present, else falls back to the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => {
                tracing::info!("no {DEFAULT_CONFIG_PATH} found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn price_plan_catalog(&self) -> Result<PricePlanCatalog, CatalogError> {
        PricePlanCatalog::new(self.price_plans.iter().map(PricePlan::from).collect())
    }

    pub fn account_directory(&self) -> InMemoryAccounts {
        InMemoryAccounts::new(self.accounts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();

        assert_eq!(cfg.http.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.store.shards, DEFAULT_SHARDS);
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.price_plans.len(), 3);
        assert_eq!(cfg.accounts.get("smart-meter-3").map(String::as_str), Some("price-plan-2"));
        assert_eq!(cfg.seed.readings_per_meter, 20);
    }

    #[test]
    fn parses_plans_with_peak_multipliers() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [http]
            bind_addr = "127.0.0.1:9000"

            [metrics]
            bind_addr = "127.0.0.1:9100"

            [[price_plans]]
            name = "peak-wednesday"
            supplier = "Acme"
            unit_rate = "0.25"
            peak_multipliers = [{ day = "wednesday", multiplier = 10 }]

            [accounts]
            "meter-a" = "peak-wednesday"

            [seed]
            readings_per_meter = 0
            "#,
        )
        .unwrap();

        let catalog = cfg.price_plan_catalog().unwrap();
        let plan = catalog.by_name("peak-wednesday").unwrap();
        assert_eq!(plan.peak_multipliers[0].day, Weekday::Wednesday);
        assert_eq!(plan.effective_rate(time::macros::datetime!(2017-08-30 12:00)), "2.5".parse::<BigDecimal>().unwrap());
        assert_eq!(cfg.accounts.len(), 1);
        assert_eq!(cfg.seed.readings_per_meter, 0);
        assert_eq!(cfg.seed.backfill_batch_size, 1000);
    }

    #[test]
    fn duplicate_peak_day_fails_catalog_build() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [[price_plans]]
            name = "bad"
            supplier = "Acme"
            unit_rate = 1
            peak_multipliers = [
                { day = "monday", multiplier = 2 },
                { day = "monday", multiplier = 3 },
            ]
            "#,
        )
        .unwrap();

        assert!(matches!(cfg.price_plan_catalog(), Err(CatalogError::InvalidInput { .. })));
    }
}
