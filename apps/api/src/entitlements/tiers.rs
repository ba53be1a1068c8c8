//! Tier catalog — the single declarative table of what each subscription
//! tier may do and how much of it per month. All limit decisions flow
//! through here; endpoints never carry their own tier conditionals.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// A named subscription level. Ordered cheapest-first so the catalog can
/// report the lowest tier that unlocks a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
    Professional,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Premium, Tier::Professional];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Professional => "professional",
        }
    }

    /// Parses a tier name as stored in the `users.tier` column.
    /// An unrecognized name is a configuration bug, not a default.
    pub fn from_db(s: &str) -> Result<Self, AppError> {
        match s {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            "professional" => Ok(Tier::Professional),
            other => Err(AppError::InvalidTier(other.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gated product feature. Serialized snake_case; the same names are used
/// as `usage_tracking.feature` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    ResumeBuilder,
    CompanyResearch,
    PdfDownload,
    ResumeAnalysis,
    CoverLetterAnalysis,
    CoverLetterGeneration,
    LinkedinOptimization,
    InterviewPractice,
    AtsScoring,
    JobCustomization,
    MockInterviewSimulator,
    CareerPathAnalysis,
    SalaryBenchmarking,
    SkillsGapAnalysis,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::ResumeBuilder => "resume_builder",
            Feature::CompanyResearch => "company_research",
            Feature::PdfDownload => "pdf_download",
            Feature::ResumeAnalysis => "resume_analysis",
            Feature::CoverLetterAnalysis => "cover_letter_analysis",
            Feature::CoverLetterGeneration => "cover_letter_generation",
            Feature::LinkedinOptimization => "linkedin_optimization",
            Feature::InterviewPractice => "interview_practice",
            Feature::AtsScoring => "ats_scoring",
            Feature::JobCustomization => "job_customization",
            Feature::MockInterviewSimulator => "mock_interview_simulator",
            Feature::CareerPathAnalysis => "career_path_analysis",
            Feature::SalaryBenchmarking => "salary_benchmarking",
            Feature::SkillsGapAnalysis => "skills_gap_analysis",
        }
    }

    /// When usage for this feature is charged against the quota.
    ///
    /// Product decision pending on whether non-PDF AI features should charge
    /// at request time; until then everything charges on delivery, so
    /// regeneration/preview is always free.
    pub const fn charge_point(self) -> ChargePoint {
        ChargePoint::Delivery
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The moment at which `EntitlementGate::consume` should be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargePoint {
    /// Charge when the request is accepted.
    Request,
    /// Charge only when the deliverable is handed to the user.
    Delivery,
}

/// What a tier allows for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Feature is not part of the tier at all.
    Unavailable,
    /// Available with a monthly cap.
    Limited(u32),
    /// Available without a cap.
    Unlimited,
}

/// Per-tier entitlement definition: which features, which monthly caps.
#[derive(Debug, Clone)]
pub struct TierDefinition {
    pub description: &'static str,
    /// None for the free tier.
    pub monthly_price_cents: Option<u32>,
    features: BTreeSet<Feature>,
    limits: HashMap<Feature, u32>,
}

impl TierDefinition {
    fn new(
        description: &'static str,
        monthly_price_cents: Option<u32>,
        features: &[Feature],
        limits: &[(Feature, u32)],
    ) -> Self {
        Self {
            description,
            monthly_price_cents,
            features: features.iter().copied().collect(),
            limits: limits.iter().copied().collect(),
        }
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn access(&self, feature: Feature) -> Access {
        if !self.features.contains(&feature) {
            return Access::Unavailable;
        }
        match self.limits.get(&feature) {
            Some(cap) => Access::Limited(*cap),
            None => Access::Unlimited,
        }
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }
}

const FREE_FEATURES: &[Feature] = &[
    Feature::ResumeBuilder,
    Feature::CompanyResearch,
    Feature::PdfDownload,
];

const PREMIUM_FEATURES: &[Feature] = &[
    Feature::ResumeBuilder,
    Feature::CompanyResearch,
    Feature::PdfDownload,
    Feature::ResumeAnalysis,
    Feature::CoverLetterAnalysis,
    Feature::CoverLetterGeneration,
    Feature::LinkedinOptimization,
    Feature::InterviewPractice,
    Feature::AtsScoring,
    Feature::JobCustomization,
];

const PROFESSIONAL_FEATURES: &[Feature] = &[
    Feature::ResumeBuilder,
    Feature::CompanyResearch,
    Feature::PdfDownload,
    Feature::ResumeAnalysis,
    Feature::CoverLetterAnalysis,
    Feature::CoverLetterGeneration,
    Feature::LinkedinOptimization,
    Feature::InterviewPractice,
    Feature::AtsScoring,
    Feature::JobCustomization,
    Feature::MockInterviewSimulator,
    Feature::CareerPathAnalysis,
    Feature::SalaryBenchmarking,
    Feature::SkillsGapAnalysis,
];

/// The full tier table. Built once at startup and shared via `AppState`.
///
/// Invariant: every tier name a user row can carry must resolve to a
/// definition here; `definition()` surfaces a missing one as `InvalidTier`.
#[derive(Debug, Clone)]
pub struct TierCatalog {
    definitions: HashMap<Tier, TierDefinition>,
}

impl Default for TierCatalog {
    fn default() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert(
            Tier::Free,
            TierDefinition::new(
                "Basic resume builder + company research",
                None,
                FREE_FEATURES,
                &[(Feature::PdfDownload, 1)],
            ),
        );
        definitions.insert(
            Tier::Premium,
            TierDefinition::new(
                "AI analysis + cover letters + interview prep",
                Some(1900),
                PREMIUM_FEATURES,
                &[],
            ),
        );
        definitions.insert(
            Tier::Professional,
            TierDefinition::new(
                "Everything + AI mock interviews + career analysis",
                Some(3900),
                PROFESSIONAL_FEATURES,
                &[],
            ),
        );
        Self { definitions }
    }
}

impl TierCatalog {
    pub fn definition(&self, tier: Tier) -> Result<&TierDefinition, AppError> {
        self.definitions
            .get(&tier)
            .ok_or_else(|| AppError::InvalidTier(tier.to_string()))
    }

    /// The cheapest tier that includes `feature`, if any does.
    pub fn required_tier(&self, feature: Feature) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .find(|t| {
                self.definitions
                    .get(t)
                    .is_some_and(|d| d.has_feature(feature))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &TierDefinition)> {
        Tier::ALL
            .into_iter()
            .filter_map(|t| self.definitions.get(&t).map(|d| (t, d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_has_a_definition() {
        let catalog = TierCatalog::default();
        for tier in Tier::ALL {
            assert!(catalog.definition(tier).is_ok(), "missing {tier}");
        }
    }

    #[test]
    fn free_tier_caps_pdf_downloads_at_one() {
        let catalog = TierCatalog::default();
        let free = catalog.definition(Tier::Free).unwrap();
        assert_eq!(free.access(Feature::PdfDownload), Access::Limited(1));
    }

    #[test]
    fn paid_tiers_have_unlimited_pdf_downloads() {
        let catalog = TierCatalog::default();
        for tier in [Tier::Premium, Tier::Professional] {
            let def = catalog.definition(tier).unwrap();
            assert_eq!(def.access(Feature::PdfDownload), Access::Unlimited);
        }
    }

    #[test]
    fn analysis_features_are_premium_and_up() {
        let catalog = TierCatalog::default();
        let free = catalog.definition(Tier::Free).unwrap();
        assert_eq!(free.access(Feature::ResumeAnalysis), Access::Unavailable);
        assert_eq!(
            catalog.required_tier(Feature::ResumeAnalysis),
            Some(Tier::Premium)
        );
        assert_eq!(
            catalog.required_tier(Feature::SalaryBenchmarking),
            Some(Tier::Professional)
        );
    }

    #[test]
    fn tier_names_round_trip_through_db_strings() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_db(tier.as_str()).unwrap(), tier);
        }
        assert!(matches!(
            Tier::from_db("platinum"),
            Err(AppError::InvalidTier(_))
        ));
    }

    #[test]
    fn all_features_charge_on_delivery() {
        assert_eq!(Feature::PdfDownload.charge_point(), ChargePoint::Delivery);
        assert_eq!(
            Feature::ResumeAnalysis.charge_point(),
            ChargePoint::Delivery
        );
    }
}
