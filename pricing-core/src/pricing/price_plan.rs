use std::collections::HashSet;

use bigdecimal::{BigDecimal, Zero};
use time::{PrimitiveDateTime, Weekday};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid price plan '{plan}': {reason}")]
    InvalidInput { plan: String, reason: String },
}

/// Rate multiplier applied for the whole of one day of the week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakTimeMultiplier {
    pub day: Weekday,
    pub multiplier: BigDecimal,
}

impl PeakTimeMultiplier {
    pub fn new(day: Weekday, multiplier: BigDecimal) -> Self {
        Self { day, multiplier }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePlan {
    pub name: String,
    pub supplier: String,
    pub unit_rate: BigDecimal,
    pub peak_multipliers: Vec<PeakTimeMultiplier>,
}

impl PricePlan {
    pub fn new(
        name: impl Into<String>,
        supplier: impl Into<String>,
        unit_rate: BigDecimal,
        peak_multipliers: Vec<PeakTimeMultiplier>,
    ) -> Self {
        Self {
            name: name.into(),
            supplier: supplier.into(),
            unit_rate,
            peak_multipliers,
        }
    }

    /// Unit rate in effect at `at`, read on the caller's calendar.
    ///
    /// If several multipliers name the same weekday the first one wins.
    pub fn effective_rate(&self, at: PrimitiveDateTime) -> BigDecimal {
        let weekday = at.weekday();

        match self.peak_multipliers.iter().find(|m| m.day == weekday) {
            Some(peak) => &self.unit_rate * &peak.multiplier,
            None => self.unit_rate.clone(),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::InvalidInput {
            plan: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be blank".to_string()));
        }
        if self.unit_rate <= BigDecimal::zero() {
            return Err(invalid(format!("unit rate must be positive, got {}", self.unit_rate)));
        }

        let mut days = HashSet::new();
        for peak in &self.peak_multipliers {
            if !days.insert(peak.day) {
                return Err(invalid(format!("more than one multiplier for {}", peak.day)));
            }
        }

        Ok(())
    }
}

/// Immutable set of price plans, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct PricePlanCatalog {
    plans: Vec<PricePlan>,
}

impl PricePlanCatalog {
    pub fn new(plans: Vec<PricePlan>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for plan in &plans {
            plan.validate()?;
            if !names.insert(plan.name.as_str()) {
                return Err(CatalogError::InvalidInput {
                    plan: plan.name.clone(),
                    reason: "duplicate plan name".to_string(),
                });
            }
        }

        Ok(Self { plans })
    }

    pub fn all(&self) -> &[PricePlan] {
        &self.plans
    }

    pub fn by_name(&self, name: &str) -> Option<&PricePlan> {
        self.plans.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
