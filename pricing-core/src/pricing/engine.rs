use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::{
    accounts::AccountDirectory,
    domain::Interval,
    pricing::{cost, CostError, PricePlanCatalog},
    store::{ReadingStore, StoreError},
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Cost(#[from] CostError),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::NotFound(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCost {
    pub plan_name: String,
    pub cost: BigDecimal,
}

/// Prices stored readings against the catalog.
#[derive(Clone)]
pub struct CostEngine {
    store: Arc<ReadingStore>,
    catalog: Arc<PricePlanCatalog>,
    accounts: Arc<dyn AccountDirectory>,
}

impl CostEngine {
    pub fn new(
        store: Arc<ReadingStore>,
        catalog: Arc<PricePlanCatalog>,
        accounts: Arc<dyn AccountDirectory>,
    ) -> Self {
        Self {
            store,
            catalog,
            accounts,
        }
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn accounts(&self) -> &dyn AccountDirectory {
        self.accounts.as_ref()
    }

    /// Cost of one page of the meter's readings under every plan, in catalog
    /// order.
    pub fn cost_for_each_plan(
        &self,
        meter_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PlanCost>, EngineError> {
        let readings = self.store.page(meter_id, offset, limit)?;

        self.catalog
            .all()
            .iter()
            .map(|plan| -> Result<PlanCost, EngineError> {
                Ok(PlanCost {
                    plan_name: plan.name.clone(),
                    cost: cost(&readings, plan)?,
                })
            })
            .collect()
    }

    /// Cost of the meter's readings inside `interval` under its own plan.
    pub fn cost_for_own_plan_over_interval(
        &self,
        meter_id: &str,
        interval: Interval,
    ) -> Result<BigDecimal, EngineError> {
        let plan_name = self
            .accounts
            .lookup_plan_name(meter_id)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| EngineError::NotFound(format!("no price plan for meter '{meter_id}'")))?;

        let plan = self
            .catalog
            .by_name(&plan_name)
            .ok_or_else(|| EngineError::NotFound(format!("price plan '{plan_name}' is not in the catalog")))?;

        let readings = self.store.range(meter_id, interval.start, interval.end)?;
        if readings.is_empty() {
            return Err(EngineError::NotFound(format!(
                "no readings for meter '{meter_id}' between {} and {}",
                interval.start, interval.end
            )));
        }

        Ok(cost(&readings, plan)?)
    }

    /// Cheapest `top_n` plans for one page of readings, ascending by cost.
    /// Equal costs keep catalog order.
    pub fn rank_cheapest(
        &self,
        meter_id: &str,
        offset: usize,
        limit: usize,
        top_n: usize,
    ) -> Result<Vec<PlanCost>, EngineError> {
        let mut costs = self.cost_for_each_plan(meter_id, offset, limit)?;
        costs.sort_by(|a, b| a.cost.cmp(&b.cost));
        costs.truncate(top_n);

        Ok(costs)
    }
}
