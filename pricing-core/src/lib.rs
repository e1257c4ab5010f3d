pub mod accounts;
pub mod domain;
pub mod pricing;
pub mod store;

pub use accounts::{AccountDirectory, InMemoryAccounts};
pub use domain::{Interval, MeterReading, Reading};
pub use pricing::{CostEngine, PlanCost, PricePlan, PricePlanCatalog};
pub use store::ReadingStore;
