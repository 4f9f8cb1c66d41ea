//! Mutable per-adapter state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::batch::BatchQueue;
use crate::types::{CompletionResponse, ModelDescriptor, Usage};

/// Result of [`Adapter::load`](super::Adapter::load).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedModel {
    pub descriptor: ModelDescriptor,
    pub loaded_at: DateTime<Utc>,
    /// Caller metadata from the load options.
    pub metadata: Map<String, Value>,
    /// Outcome of the reachability probe; `None` when no probe ran.
    pub reachable: Option<bool>,
    /// Whether the id was found in the provider's model table.
    pub known: bool,
}

/// Spend recorded for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelSpend {
    pub requests: u64,
    pub cost: f64,
    pub usage: Usage,
}

/// Running totals of completed requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostLedger {
    pub total_cost: f64,
    pub total_requests: u64,
    pub by_model: HashMap<String, ModelSpend>,
}

impl CostLedger {
    pub fn record(&mut self, model: &str, response: &CompletionResponse) {
        self.total_cost += response.cost;
        self.total_requests += 1;
        let spend = self.by_model.entry(model.to_string()).or_default();
        spend.requests += 1;
        spend.cost += response.cost;
        if let Some(usage) = response.usage {
            spend.usage.input_units += usage.input_units;
            spend.usage.output_units += usage.output_units;
            spend.usage.total_units += usage.total_units;
        }
    }

    pub fn model(&self, model: &str) -> Option<&ModelSpend> {
        self.by_model.get(model)
    }
}

#[derive(Debug, Default)]
pub(super) struct AdapterState {
    pub loaded: HashMap<String, LoadedModel>,
    /// Most recently loaded model; the default target of `complete`.
    pub current: Option<String>,
    pub ledger: CostLedger,
    pub queue: BatchQueue,
    pub disposed: bool,
}

impl AdapterState {
    pub fn descriptor(&self, model: &str) -> Option<&ModelDescriptor> {
        self.loaded.get(model).map(|m| &m.descriptor)
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.current = None;
        self.queue = BatchQueue::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_accumulates_per_model() {
        let mut ledger = CostLedger::default();
        let response = CompletionResponse {
            cost: 0.5,
            usage: Some(Usage::new(10, 5)),
            ..Default::default()
        };
        ledger.record("command-r", &response);
        ledger.record("command-r", &response);
        ledger.record("gpt-4o", &CompletionResponse::default());

        assert_eq!(ledger.total_requests, 3);
        assert_eq!(ledger.total_cost, 1.0);
        let spend = ledger.model("command-r").unwrap();
        assert_eq!(spend.requests, 2);
        assert_eq!(spend.usage, Usage::new(20, 10));
    }
}
