//! Three-Lock aggregation: one composite hash per tier.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_join, sha256, DEFAULT_SEPARATOR};
use crate::digest::HashPrimitive;
use crate::dimension::FingerprintData;
use crate::error::Result;
use crate::schema::LockTier;

/// The three tier hashes, 64-char lowercase hex each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeLockHashes {
    pub gold: String,
    pub silver: String,
    pub bronze: String,
}

impl ThreeLockHashes {
    pub fn get(&self, tier: LockTier) -> &str {
        match tier {
            LockTier::Gold => &self.gold,
            LockTier::Silver => &self.silver,
            LockTier::Bronze => &self.bronze,
        }
    }
}

/// Canonical string hashed for `tier`. Missing dimensions read as
/// unavailable, so the string always has one slot per tier dimension.
pub fn tier_canonical_string(data: &FingerprintData, tier: LockTier) -> String {
    canonical_join(
        tier.dimensions().map(|name| data.value_or_unavailable(name)),
        DEFAULT_SEPARATOR,
    )
}

/// Hash every tier with `hasher`. Fails only if the hash primitive fails.
pub async fn compute_three_lock_hashes(
    data: &FingerprintData,
    hasher: &dyn HashPrimitive,
) -> Result<ThreeLockHashes> {
    Ok(ThreeLockHashes {
        gold: tier_hash(data, LockTier::Gold, hasher).await?,
        silver: tier_hash(data, LockTier::Silver, hasher).await?,
        bronze: tier_hash(data, LockTier::Bronze, hasher).await?,
    })
}

async fn tier_hash(
    data: &FingerprintData,
    tier: LockTier,
    hasher: &dyn HashPrimitive,
) -> Result<String> {
    let canonical = tier_canonical_string(data, tier);
    let hash = hasher.sha256_hex(canonical.as_bytes()).await?;
    log::debug!("{} lock via {}: {}", tier.name(), hasher.name(), hash);
    Ok(hash)
}

/// Synchronous variant over the native digest.
pub fn three_lock_hashes(data: &FingerprintData) -> ThreeLockHashes {
    ThreeLockHashes {
        gold: sha256(&tier_canonical_string(data, LockTier::Gold)),
        silver: sha256(&tier_canonical_string(data, LockTier::Silver)),
        bronze: sha256(&tier_canonical_string(data, LockTier::Bronze)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::NativeSha256;
    use crate::dimension::DimensionValue;
    use crate::schema::{HARDWARE_DIMENSIONS, SYS_PLATFORM};
    use futures::executor::block_on;

    fn sample() -> FingerprintData {
        vec![
            ("hw_canvas_hash", DimensionValue::from("c0ffee")),
            ("hw_hardware_concurrency", DimensionValue::from(8u32)),
            (SYS_PLATFORM, DimensionValue::from("MacIntel")),
            ("cap_webassembly", DimensionValue::from(true)),
            ("net_online", DimensionValue::from(true)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_async_matches_sync() {
        let data = sample();
        let hashes = block_on(compute_three_lock_hashes(&data, &NativeSha256)).unwrap();
        assert_eq!(hashes, three_lock_hashes(&data));
        assert_eq!(hashes.gold.len(), 64);
        assert_ne!(hashes.gold, hashes.silver);
    }

    #[test]
    fn test_slot_per_dimension() {
        let empty = FingerprintData::new();
        let gold = tier_canonical_string(&empty, LockTier::Gold);
        assert_eq!(gold.matches('|').count(), HARDWARE_DIMENSIONS.len() - 1);
    }

    #[test]
    fn test_tier_isolation() {
        let base = sample();
        let before = three_lock_hashes(&base);

        let mut changed: FingerprintData = base
            .iter()
            .filter(|(k, _)| *k != "net_online")
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        changed.insert("net_online", DimensionValue::from(false));
        let after = three_lock_hashes(&changed);

        assert_eq!(before.gold, after.gold);
        assert_eq!(before.silver, after.silver);
        assert_ne!(before.bronze, after.bronze);
    }
}
