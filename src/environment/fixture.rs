use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::Environment;
use crate::dimension::{DimensionValue, FingerprintData};
use crate::error::ProbeFault;

/// Environment backed by a fixed table, with a virtual clock.
///
/// Dimensions absent from the table report [`ProbeFault::Unsupported`].
/// Hung dimensions never settle. `sleep_ms` resolves at once and advances
/// the clock, so timeouts fire immediately and deterministically.
#[derive(Debug, Default)]
pub struct StaticEnvironment {
    values: HashMap<String, Result<DimensionValue, ProbeFault>>,
    hangs: HashSet<String>,
    clock_ms: Cell<f64>,
    tick_ms: f64,
}

impl StaticEnvironment {
    pub fn new(start_ms: f64) -> Self {
        Self {
            clock_ms: Cell::new(start_ms),
            ..Default::default()
        }
    }

    /// Fixture answering every dimension in `data`.
    pub fn from_data(start_ms: f64, data: &FingerprintData) -> Self {
        data.iter()
            .fold(Self::new(start_ms), |env, (name, value)| {
                env.with_value(name, value.clone())
            })
    }

    pub fn with_value(mut self, dimension: &str, value: impl Into<DimensionValue>) -> Self {
        self.values.insert(dimension.to_string(), Ok(value.into()));
        self
    }

    pub fn with_fault(mut self, dimension: &str, fault: ProbeFault) -> Self {
        self.values.insert(dimension.to_string(), Err(fault));
        self
    }

    pub fn with_hang(mut self, dimension: &str) -> Self {
        self.hangs.insert(dimension.to_string());
        self
    }

    /// Advance the clock by `tick_ms` on every `now_ms` read.
    pub fn with_tick(mut self, tick_ms: f64) -> Self {
        self.tick_ms = tick_ms;
        self
    }
}

#[async_trait(?Send)]
impl Environment for StaticEnvironment {
    async fn probe(&self, dimension: &str) -> Result<DimensionValue, ProbeFault> {
        if self.hangs.contains(dimension) {
            return futures::future::pending().await;
        }
        self.values
            .get(dimension)
            .cloned()
            .unwrap_or_else(|| Err(ProbeFault::Unsupported(format!("{} not in fixture", dimension))))
    }

    fn now_ms(&self) -> f64 {
        let now = self.clock_ms.get();
        self.clock_ms.set(now + self.tick_ms);
        now
    }

    async fn sleep_ms(&self, ms: u32) {
        self.clock_ms.set(self.clock_ms.get() + ms as f64);
    }
}
