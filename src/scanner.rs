//! Report assembly.
//!
//! A scan walks `Idle → Collecting → Hashing → DetectingLies → Done`. Only a
//! failing hash primitive leaves that path, into `Failed`.

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::aggregator::compute_three_lock_hashes;
use crate::config::ScanConfig;
use crate::digest::HashPrimitive;
use crate::dimension::{DimensionValue, FingerprintData};
use crate::environment::Environment;
use crate::error::{ProbeFault, Result};
use crate::lies::detect_all_lies;
use crate::report::{whole_ms, FullFingerprintReport};
use crate::schema::{all_dimensions, dimension_count, SCHEMA_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanPhase {
    Idle,
    Collecting,
    Hashing,
    DetectingLies,
    Done,
    Failed,
}

/// Progress of a scan, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    PhaseChanged {
        phase: ScanPhase,
        completed: usize,
        total: usize,
    },
    CollectorCompleted {
        completed: usize,
        total: usize,
        dimension: String,
    },
}

/// Receives scan events. Purely observational.
pub trait ProgressObserver {
    fn on_event(&mut self, event: &ScanEvent);
}

impl<F: FnMut(&ScanEvent)> ProgressObserver for F {
    fn on_event(&mut self, event: &ScanEvent) {
        self(event)
    }
}

impl ProgressObserver for Vec<ScanEvent> {
    fn on_event(&mut self, event: &ScanEvent) {
        self.push(event.clone());
    }
}

/// The shape progress callbacks receive in JS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub phase: ScanPhase,
    pub completed: usize,
    pub total: usize,
    pub current_dimension: Option<String>,
}

impl From<&ScanEvent> for ProgressUpdate {
    fn from(event: &ScanEvent) -> Self {
        match event {
            ScanEvent::PhaseChanged {
                phase,
                completed,
                total,
            } => ProgressUpdate {
                phase: *phase,
                completed: *completed,
                total: *total,
                current_dimension: None,
            },
            ScanEvent::CollectorCompleted {
                completed,
                total,
                dimension,
            } => ProgressUpdate {
                phase: ScanPhase::Collecting,
                completed: *completed,
                total: *total,
                current_dimension: Some(dimension.clone()),
            },
        }
    }
}

/// Runs scans against one environment.
pub struct Scanner<E: Environment> {
    env: E,
    hasher: Box<dyn HashPrimitive>,
    config: ScanConfig,
}

impl<E: Environment> Scanner<E> {
    pub fn new(env: E, hasher: Box<dyn HashPrimitive>, config: ScanConfig) -> Self {
        Self {
            env,
            hasher,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    pub async fn scan(&self) -> Result<FullFingerprintReport> {
        self.scan_with_progress(&mut |_: &ScanEvent| {}).await
    }

    pub async fn scan_with_progress<O>(&self, observer: &mut O) -> Result<FullFingerprintReport>
    where
        O: ProgressObserver + ?Sized,
    {
        let started_at = self.env.now_ms();
        let total = dimension_count();

        log::info!("🔍 Collecting {} dimensions", total);
        observer.on_event(&ScanEvent::PhaseChanged {
            phase: ScanPhase::Collecting,
            completed: 0,
            total,
        });
        let data = self.collect(total, observer).await;
        log::info!(
            "✅ Collected {} dimensions ({} available)",
            data.len(),
            data.available_count()
        );

        observer.on_event(&ScanEvent::PhaseChanged {
            phase: ScanPhase::Hashing,
            completed: total,
            total,
        });
        let hashes = match compute_three_lock_hashes(&data, self.hasher.as_ref()).await {
            Ok(hashes) => hashes,
            Err(e) => {
                log::error!("❌ Hashing with {} failed: {}", self.hasher.name(), e);
                observer.on_event(&ScanEvent::PhaseChanged {
                    phase: ScanPhase::Failed,
                    completed: total,
                    total,
                });
                return Err(e);
            }
        };
        log::info!("🔒 Gold lock {}", hashes.gold);

        observer.on_event(&ScanEvent::PhaseChanged {
            phase: ScanPhase::DetectingLies,
            completed: total,
            total,
        });
        let lies = detect_all_lies(&data, started_at);

        let report = FullFingerprintReport {
            schema_version: SCHEMA_VERSION,
            timestamp: whole_ms(started_at),
            duration_ms: whole_ms(self.env.now_ms() - started_at),
            dimensions: data,
            hashes,
            lies,
        };
        observer.on_event(&ScanEvent::PhaseChanged {
            phase: ScanPhase::Done,
            completed: total,
            total,
        });
        log::info!(
            "✅ Scan done in {}ms, lie score {}",
            report.duration_ms,
            report.lies.lie_score
        );
        Ok(report)
    }

    /// Run every registered collector. Results arrive in registry order
    /// whatever order the probes settle in.
    async fn collect<O>(&self, total: usize, observer: &mut O) -> FingerprintData
    where
        O: ProgressObserver + ?Sized,
    {
        let concurrency = self.config.max_concurrent_collectors.max(1);
        let mut results = stream::iter(all_dimensions())
            .map(|(name, _)| async move { (name, self.run_collector(name).await) })
            .buffered(concurrency);

        let mut data = FingerprintData::new();
        let mut completed = 0;
        while let Some((name, value)) = results.next().await {
            completed += 1;
            data.insert(name, value);
            observer.on_event(&ScanEvent::CollectorCompleted {
                completed,
                total,
                dimension: name.to_string(),
            });
        }
        data
    }

    /// Probe one dimension. Never fails: a fault or timeout becomes
    /// [`DimensionValue::Unavailable`].
    pub async fn run_collector(&self, dimension: &str) -> DimensionValue {
        let outcome = match self.config.collector_timeout() {
            None => self.env.probe(dimension).await,
            Some(ms) => {
                futures::select_biased! {
                    result = self.env.probe(dimension).fuse() => result,
                    _ = self.env.sleep_ms(ms).fuse() => Err(ProbeFault::TimedOut(ms)),
                }
            }
        };

        match outcome {
            Ok(value) => value,
            Err(fault) => {
                log::debug!("⚠️ {} unavailable: {}", dimension, fault);
                DimensionValue::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::NativeSha256;
    use crate::environment::StaticEnvironment;
    use futures::executor::block_on;

    fn scanner(env: StaticEnvironment) -> Scanner<StaticEnvironment> {
        Scanner::new(env, Box::new(NativeSha256), ScanConfig::default())
    }

    #[test]
    fn test_fault_becomes_unavailable() {
        let s = scanner(
            StaticEnvironment::new(0.0).with_fault("cap_usb", ProbeFault::Threw("nope".into())),
        );
        assert_eq!(block_on(s.run_collector("cap_usb")), DimensionValue::Unavailable);
    }

    #[test]
    fn test_hang_times_out() {
        let s = scanner(StaticEnvironment::new(0.0).with_hang("media_drm"));
        assert_eq!(block_on(s.run_collector("media_drm")), DimensionValue::Unavailable);
        // The virtual clock moved by the timeout.
        assert_eq!(s.environment().now_ms(), 5000.0);
    }

    #[test]
    fn test_value_wins_over_timer() {
        let s = scanner(StaticEnvironment::new(0.0).with_value("net_online", true));
        assert_eq!(block_on(s.run_collector("net_online")), DimensionValue::Bool(true));
    }

    #[test]
    fn test_progress_update_shape() {
        let update = ProgressUpdate::from(&ScanEvent::CollectorCompleted {
            completed: 3,
            total: 10,
            dimension: "hw_canvas_hash".into(),
        });
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["phase"], "collecting");
        assert_eq!(json["currentDimension"], "hw_canvas_hash");

        let update = ProgressUpdate::from(&ScanEvent::PhaseChanged {
            phase: ScanPhase::DetectingLies,
            completed: 10,
            total: 10,
        });
        assert_eq!(serde_json::to_value(&update).unwrap()["phase"], "detecting-lies");
    }
}
