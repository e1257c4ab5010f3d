use std::collections::HashMap;

/// Maps a smart meter to the name of the price plan its account is on.
pub trait AccountDirectory: Send + Sync {
    fn lookup_plan_name(&self, meter_id: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAccounts {
    plans_by_meter: HashMap<String, String>,
}

impl InMemoryAccounts {
    pub fn new(plans_by_meter: HashMap<String, String>) -> Self {
        Self { plans_by_meter }
    }

    pub fn len(&self) -> usize {
        self.plans_by_meter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans_by_meter.is_empty()
    }

    /// Meter ids in ascending order.
    pub fn meter_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.plans_by_meter.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<(String, String)> for InMemoryAccounts {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl AccountDirectory for InMemoryAccounts {
    fn lookup_plan_name(&self, meter_id: &str) -> Option<String> {
        self.plans_by_meter.get(meter_id).cloned()
    }
}
