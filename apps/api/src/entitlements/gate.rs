//! Entitlement gate — the single decision procedure in front of every
//! feature endpoint.
//!
//! Decision order: admin flag (unconditional bypass) → tier lookup → tier
//! catalog → current-month usage. `check` is a read-only permission probe;
//! `consume` records usage and is called exactly once per delivered
//! resource, at delivery time. Generating a PDF without downloading it
//! never consumes quota.

use std::sync::Arc;

use uuid::Uuid;

use crate::entitlements::store::EntitlementStore;
use crate::entitlements::tiers::{Access, ChargePoint, Feature, Tier, TierCatalog};
use crate::entitlements::usage::{current_month, UsageTracker};
use crate::errors::AppError;

/// A granted permission. `remaining` is `None` for unlimited access
/// (including the admin bypass), otherwise the slots left after this check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    pub remaining: Option<i64>,
}

#[derive(Clone)]
pub struct EntitlementGate {
    store: Arc<dyn EntitlementStore>,
    usage: Arc<dyn UsageTracker>,
    tiers: Arc<TierCatalog>,
}

impl EntitlementGate {
    pub fn new(
        store: Arc<dyn EntitlementStore>,
        usage: Arc<dyn UsageTracker>,
        tiers: Arc<TierCatalog>,
    ) -> Self {
        Self {
            store,
            usage,
            tiers,
        }
    }

    /// Permission probe with no side effects. Denials surface as
    /// `UpgradeRequired` (feature not in tier) or `LimitExceeded` (quota
    /// spent for the month).
    pub async fn check(&self, user_id: Uuid, feature: Feature) -> Result<Entitlement, AppError> {
        if self.store.is_admin(user_id).await? {
            return Ok(Entitlement { remaining: None });
        }

        let tier = self.store.tier(user_id).await?;
        match self.access(tier, feature)? {
            Access::Unavailable => Err(self.upgrade_required(tier, feature)),
            Access::Unlimited => Ok(Entitlement { remaining: None }),
            Access::Limited(cap) => {
                let used = self
                    .usage
                    .usage(user_id, feature, &current_month())
                    .await?;
                if used < i64::from(cap) {
                    Ok(Entitlement {
                        remaining: Some(i64::from(cap) - used),
                    })
                } else {
                    Err(limit_exceeded(tier, feature, cap))
                }
            }
        }
    }

    /// Records one unit of usage for a delivered resource. For capped
    /// features this is an atomic check-and-increment, so concurrent calls
    /// at one remaining slot yield exactly one success. Returns the new
    /// count.
    pub async fn consume(&self, user_id: Uuid, feature: Feature) -> Result<i64, AppError> {
        let month = current_month();

        if self.store.is_admin(user_id).await? {
            // Admins are never limited but their usage is still recorded.
            return self.usage.increment(user_id, feature, &month).await;
        }

        let tier = self.store.tier(user_id).await?;
        match self.access(tier, feature)? {
            Access::Unavailable => Err(self.upgrade_required(tier, feature)),
            Access::Unlimited => self.usage.increment(user_id, feature, &month).await,
            Access::Limited(cap) => self
                .usage
                .increment_below(user_id, feature, &month, cap)
                .await?
                .ok_or_else(|| limit_exceeded(tier, feature, cap)),
        }
    }

    /// Entry-point guard for feature endpoints. Always verifies permission;
    /// for request-charged features it also records the usage up front.
    pub async fn admit(&self, user_id: Uuid, feature: Feature) -> Result<Entitlement, AppError> {
        match feature.charge_point() {
            ChargePoint::Delivery => self.check(user_id, feature).await,
            ChargePoint::Request => {
                self.consume(user_id, feature).await?;
                Ok(Entitlement { remaining: None })
            }
        }
    }

    /// Delivery-side settlement, called once when the deliverable is handed
    /// to the user. No-op for request-charged features (already paid in
    /// `admit`).
    pub async fn settle(&self, user_id: Uuid, feature: Feature) -> Result<(), AppError> {
        match feature.charge_point() {
            ChargePoint::Delivery => {
                self.consume(user_id, feature).await?;
                Ok(())
            }
            ChargePoint::Request => Ok(()),
        }
    }

    fn access(&self, tier: Tier, feature: Feature) -> Result<Access, AppError> {
        Ok(self.tiers.definition(tier)?.access(feature))
    }

    fn upgrade_required(&self, tier: Tier, feature: Feature) -> AppError {
        let required = self
            .tiers
            .required_tier(feature)
            .unwrap_or(Tier::Professional);
        AppError::UpgradeRequired {
            feature: feature.to_string(),
            current_tier: tier.to_string(),
            required_tier: required.to_string(),
        }
    }
}

fn limit_exceeded(tier: Tier, feature: Feature, cap: u32) -> AppError {
    AppError::LimitExceeded {
        feature: feature.to_string(),
        limit: cap,
        tier: tier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// In-memory store for exercising the gate without Postgres.
    #[derive(Default)]
    struct MemStore {
        tiers: Mutex<HashMap<Uuid, Tier>>,
        admins: Mutex<HashSet<Uuid>>,
    }

    #[async_trait]
    impl EntitlementStore for MemStore {
        async fn tier(&self, user_id: Uuid) -> Result<Tier, AppError> {
            self.tiers
                .lock()
                .unwrap()
                .get(&user_id)
                .copied()
                .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
        }

        async fn set_tier(&self, user_id: Uuid, tier: Tier) -> Result<(), AppError> {
            self.tiers.lock().unwrap().insert(user_id, tier);
            Ok(())
        }

        async fn is_admin(&self, user_id: Uuid) -> Result<bool, AppError> {
            Ok(self.admins.lock().unwrap().contains(&user_id))
        }
    }

    /// In-memory tracker. The mutex spans the whole check-then-increment in
    /// `increment_below`, matching the atomicity the Postgres statement
    /// provides.
    #[derive(Default)]
    struct MemTracker {
        counts: Mutex<HashMap<(Uuid, Feature, String), i64>>,
    }

    #[async_trait]
    impl UsageTracker for MemTracker {
        async fn usage(
            &self,
            user_id: Uuid,
            feature: Feature,
            month: &str,
        ) -> Result<i64, AppError> {
            Ok(*self
                .counts
                .lock()
                .unwrap()
                .get(&(user_id, feature, month.to_string()))
                .unwrap_or(&0))
        }

        async fn increment(
            &self,
            user_id: Uuid,
            feature: Feature,
            month: &str,
        ) -> Result<i64, AppError> {
            let mut counts = self.counts.lock().unwrap();
            let count = counts
                .entry((user_id, feature, month.to_string()))
                .or_insert(0);
            *count += 1;
            Ok(*count)
        }

        async fn increment_below(
            &self,
            user_id: Uuid,
            feature: Feature,
            month: &str,
            cap: u32,
        ) -> Result<Option<i64>, AppError> {
            let mut counts = self.counts.lock().unwrap();
            let count = counts
                .entry((user_id, feature, month.to_string()))
                .or_insert(0);
            if *count >= i64::from(cap) {
                return Ok(None);
            }
            *count += 1;
            Ok(Some(*count))
        }
    }

    struct Fixture {
        gate: EntitlementGate,
        store: Arc<MemStore>,
        usage: Arc<MemTracker>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemStore::default());
        let usage = Arc::new(MemTracker::default());
        let gate = EntitlementGate::new(
            store.clone(),
            usage.clone(),
            Arc::new(TierCatalog::default()),
        );
        Fixture { gate, store, usage }
    }

    async fn user_with_tier(f: &Fixture, tier: Tier) -> Uuid {
        let id = Uuid::new_v4();
        f.store.set_tier(id, tier).await.unwrap();
        id
    }

    #[tokio::test]
    async fn free_user_gets_one_pdf_download_then_denied() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Free).await;

        assert_eq!(
            f.gate.check(user, Feature::PdfDownload).await.unwrap(),
            Entitlement { remaining: Some(1) }
        );
        assert_eq!(f.gate.consume(user, Feature::PdfDownload).await.unwrap(), 1);

        let denied = f.gate.consume(user, Feature::PdfDownload).await;
        assert!(matches!(
            denied,
            Err(AppError::LimitExceeded { limit: 1, .. })
        ));
        let denied = f.gate.check(user, Feature::PdfDownload).await;
        assert!(matches!(denied, Err(AppError::LimitExceeded { .. })));
    }

    #[tokio::test]
    async fn check_alone_never_increments() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Free).await;

        for _ in 0..5 {
            f.gate.check(user, Feature::PdfDownload).await.unwrap();
        }
        assert_eq!(
            f.usage
                .usage(user, Feature::PdfDownload, &current_month())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn premium_user_is_unlimited_on_pdf_downloads() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Premium).await;

        for _ in 0..10 {
            f.gate.consume(user, Feature::PdfDownload).await.unwrap();
        }
        let granted = f.gate.check(user, Feature::PdfDownload).await.unwrap();
        assert_eq!(granted.remaining, None);
    }

    #[tokio::test]
    async fn free_user_is_denied_premium_features_with_upgrade_hint() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Free).await;

        let denied = f.gate.check(user, Feature::ResumeAnalysis).await;
        match denied {
            Err(AppError::UpgradeRequired {
                required_tier,
                current_tier,
                ..
            }) => {
                assert_eq!(required_tier, "premium");
                assert_eq!(current_tier, "free");
            }
            other => panic!("expected UpgradeRequired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_bypasses_limits_but_usage_is_still_recorded() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Free).await;
        f.store.admins.lock().unwrap().insert(user);

        for _ in 0..3 {
            f.gate.consume(user, Feature::PdfDownload).await.unwrap();
        }
        assert_eq!(
            f.gate.check(user, Feature::PdfDownload).await.unwrap(),
            Entitlement { remaining: None }
        );
        assert_eq!(
            f.usage
                .usage(user, Feature::PdfDownload, &current_month())
                .await
                .unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let f = fixture();
        let result = f.gate.check(Uuid::new_v4(), Feature::PdfDownload).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn setting_the_same_tier_twice_is_a_noop() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Premium).await;

        f.store.set_tier(user, Tier::Premium).await.unwrap();
        assert_eq!(f.store.tier(user).await.unwrap(), Tier::Premium);

        f.store.set_tier(user, Tier::Professional).await.unwrap();
        assert_eq!(f.store.tier(user).await.unwrap(), Tier::Professional);
    }

    #[tokio::test]
    async fn concurrent_consumes_at_one_slot_yield_exactly_one_success() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Free).await;

        let g1 = f.gate.clone();
        let g2 = f.gate.clone();
        let a = tokio::spawn(async move { g1.consume(user, Feature::PdfDownload).await });
        let b = tokio::spawn(async move { g2.consume(user, Feature::PdfDownload).await });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one of two racing consumes may win");
        assert_eq!(
            f.usage
                .usage(user, Feature::PdfDownload, &current_month())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn admit_does_not_charge_delivery_features_but_settle_does() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Free).await;
        let month = current_month();

        // Regenerating/previewing twice costs nothing.
        f.gate.admit(user, Feature::PdfDownload).await.unwrap();
        f.gate.admit(user, Feature::PdfDownload).await.unwrap();
        assert_eq!(
            f.usage
                .usage(user, Feature::PdfDownload, &month)
                .await
                .unwrap(),
            0
        );

        f.gate.settle(user, Feature::PdfDownload).await.unwrap();
        assert_eq!(
            f.usage
                .usage(user, Feature::PdfDownload, &month)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn usage_is_monotonic_within_a_month() {
        let f = fixture();
        let user = user_with_tier(&f, Tier::Premium).await;
        let month = current_month();

        let mut last = 0;
        for _ in 0..20 {
            f.gate.consume(user, Feature::ResumeAnalysis).await.unwrap();
            let now = f
                .usage
                .usage(user, Feature::ResumeAnalysis, &month)
                .await
                .unwrap();
            assert!(now > last);
            last = now;
        }
    }
}
