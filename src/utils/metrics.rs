use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

pub const RPC_CALLS: &str = "rpc_calls_total";
pub const RPC_FAILURES: &str = "rpc_failures_total";
pub const TOOL_CALLS: &str = "tool_calls_total";
pub const TOOL_FAILURES: &str = "tool_failures_total";

/// Metrics registry (simple, Prometheus-style counters)
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<BTreeMap<String, u64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        *self.counters.lock().entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters.lock().clone()
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.snapshot() {
            let _ = writeln!(out, "# TYPE yalla_{name} counter");
            let _ = writeln!(out, "yalla_{name} {value}");
        }
        out
    }
}

lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}
