use serde::{Deserialize, Serialize};

use crate::updaters::activity_start_policy::ActivityStartStrategy;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StateParams {
    /// Activity rows allocated upfront, index 0 included.
    pub activity_count: usize,
    pub vehicle_type_count: usize,
    /// Key columns allocated upfront, never fewer than the reserved range.
    pub initial_key_capacity: usize,
    pub activity_start_strategy: ActivityStartStrategy,
}

impl Default for StateParams {
    fn default() -> Self {
        StateParams {
            activity_count: 64,
            vehicle_type_count: 1,
            initial_key_capacity: 40,
            activity_start_strategy: ActivityStartStrategy::AsSoonAsTimeWindowOpens,
        }
    }
}
