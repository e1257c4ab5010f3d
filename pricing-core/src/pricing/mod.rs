pub mod cost;
pub mod engine;
pub mod price_plan;

pub use cost::{cost, CostError};
pub use engine::{CostEngine, EngineError, PlanCost};
pub use price_plan::{CatalogError, PeakTimeMultiplier, PricePlan, PricePlanCatalog};
