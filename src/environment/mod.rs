//! The environment the collectors read from.
//!
//! Scans never touch `window` directly; they go through an [`Environment`].
//! In the browser that is [`crate::collectors::BrowserEnvironment`]; tests use
//! [`StaticEnvironment`].

use async_trait::async_trait;

use crate::dimension::DimensionValue;
use crate::error::ProbeFault;

mod fixture;

pub use fixture::StaticEnvironment;

#[async_trait(?Send)]
pub trait Environment {
    /// Capture one dimension.
    async fn probe(&self, dimension: &str) -> Result<DimensionValue, ProbeFault>;

    /// Wall clock, epoch milliseconds.
    fn now_ms(&self) -> f64;

    /// Resolve after `ms` milliseconds. Used to bound collectors; an
    /// environment without timers never resolves, which disables the bound.
    async fn sleep_ms(&self, _ms: u32) {
        futures::future::pending::<()>().await
    }
}
