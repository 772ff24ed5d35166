use std::cmp::Ordering;

use super::{ProfileKind, Recommendation, UserProfile};
use crate::apps::{InstalledApp, SafetyLevel};
use crate::common::format::format_size;
use crate::scanner::SemanticCleanupUnit;

const MAX_PER_SOURCE: usize = 8;
const APP_RISK: f64 = 0.4;
const AFFINITY_BASELINE: f64 = 0.2;

/// Keywords per profile kind that boost a recommendation's affinity
const AFFINITY_SIGNALS: &[(ProfileKind, &[&str], f64)] = &[
    (ProfileKind::IosDeveloper, &["xcode", "deriveddata", "simulator"], 0.45),
    (ProfileKind::WebDeveloper, &["node_modules", ".next", "dist", "webpack"], 0.45),
    (ProfileKind::MlEngineer, &["checkpoint", "tensorboard", "wandb", "model"], 0.48),
    (ProfileKind::Designer, &["figma", "adobe", "sketch", "assets"], 0.42),
    (ProfileKind::VideoCreator, &["final cut", "davinci", "premiere", "render"], 0.42),
    (ProfileKind::DataScientist, &["jupyter", "notebook", "dataset", "cache"], 0.40),
    (ProfileKind::GeneralUser, &["cache", "orphan"], 0.25),
];

/// Turns apps and semantic units into scored, ordered recommendations
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationRanker;

/// Bytes to a [0.05, 1.0] impact score; 10 GiB saturates
pub fn impact_score(bytes: u64) -> f64 {
    let gib = bytes as f64 / 1_073_741_824.0;
    (gib / 10.0).clamp(0.05, 1.0)
}

pub fn risk_score(level: SafetyLevel) -> f64 {
    match level {
        SafetyLevel::Safe => 0.2,
        SafetyLevel::Review => 0.35,
        SafetyLevel::Risky => 0.7,
    }
}

/// How well a recommendation matches the inferred profile, in [0, 1]
pub fn profile_affinity(profile: &UserProfile, rec: &Recommendation) -> f64 {
    let context = format!(
        "{} {} {}",
        rec.title.to_lowercase(),
        rec.path
            .as_ref()
            .map(|p| p.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
        rec.detail.to_lowercase()
    );

    let boost: f64 = profile
        .kinds
        .iter()
        .filter_map(|kind| AFFINITY_SIGNALS.iter().find(|(k, _, _)| k == kind))
        .filter(|(_, keywords, _)| keywords.iter().any(|kw| context.contains(kw)))
        .map(|(_, _, boost)| boost)
        .sum();

    (AFFINITY_BASELINE + boost).min(1.0)
}

pub fn composite_score(profile: &UserProfile, rec: &Recommendation) -> f64 {
    rec.impact * 0.50 + rec.confidence * 0.25 + profile_affinity(profile, rec) * 0.25 - rec.risk * 0.15
}

impl RecommendationRanker {
    pub fn rank(
        &self,
        profile: &UserProfile,
        apps: &[InstalledApp],
        units: &[SemanticCleanupUnit],
    ) -> Vec<Recommendation> {
        let mut largest: Vec<&InstalledApp> = apps.iter().collect();
        largest.sort_by(|a, b| b.true_size().cmp(&a.true_size()).then_with(|| a.id.cmp(&b.id)));

        let app_recs = largest.into_iter().take(MAX_PER_SOURCE).map(|app| Recommendation {
            id: format!("app:{}", app.id),
            title: format!("Review {}", app.display_name),
            detail: format!(
                "Potential reclaim: {}. Includes app support artifacts.",
                format_size(app.true_size())
            ),
            path: Some(app.bundle_path.clone()),
            impact: impact_score(app.true_size()),
            confidence: (profile.confidence + 0.10).min(0.99),
            risk: APP_RISK,
            reversible: true,
        });

        let unit_recs = units.iter().take(MAX_PER_SOURCE).map(|unit| Recommendation {
            id: format!("unit:{}", unit.id()),
            title: format!("Cleanup unit: {}", unit.title),
            detail: format!(
                "{} Estimated reclaim: {} across {} files.",
                unit.reason,
                format_size(unit.total_bytes),
                unit.file_count
            ),
            path: Some(unit.path.clone()),
            impact: impact_score(unit.total_bytes),
            confidence: (profile.confidence + 0.15).min(0.99),
            risk: risk_score(unit.risk),
            reversible: true,
        });

        let mut scored: Vec<(f64, Recommendation)> = app_recs
            .chain(unit_recs)
            .map(|rec| (composite_score(profile, &rec), rec))
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| match sb.total_cmp(sa) {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        });

        scored.into_iter().map(|(_, rec)| rec).collect()
    }
}
