use super::{ProfileEvidence, ProfileKind, UserProfile};
use crate::apps::InstalledApp;
use crate::common::format::format_size;
use crate::scanner::FileMetadata;

/// Setting this to `1` bypasses any external classifier
pub const DISABLE_CLASSIFIER_ENV: &str = "RECLAIM_DISABLE_CLASSIFIER";

/// Corpus substrings that signal a profile, with their weight
const APP_SIGNALS: &[(&[&str], ProfileKind, &str, f64)] = &[
    (&["xcode", "com.apple.dt.xcode"], ProfileKind::IosDeveloper, "Xcode installed", 0.9),
    (&["webstorm", "vscode", "node"], ProfileKind::WebDeveloper, "Web development tooling detected", 0.8),
    (&["python", "jupyter", "tensorflow", "pytorch"], ProfileKind::MlEngineer, "ML tooling detected", 1.0),
    (&["python", "jupyter", "tensorflow", "pytorch"], ProfileKind::DataScientist, "Data science tooling detected", 0.7),
    (&["figma", "adobe", "sketch"], ProfileKind::Designer, "Design applications detected", 0.9),
    (&["final cut", "davinci", "premiere"], ProfileKind::VideoCreator, "Video editing software detected", 0.9),
];

const CHECKPOINT_EXTENSIONS: &[&str] = &["pt", "ckpt", "safetensors", "h5"];
const DESIGN_EXTENSIONS: &[&str] = &["psd", "sketch", "fig"];
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "mxf", "r3d"];
const CHECKPOINT_FRAGMENTS: &[&str] = &["checkpoint", "tensorboard", "wandb", "/runs"];
const WEB_BUILD_FRAGMENTS: &[&str] = &["node_modules", ".next", "dist"];
const DESIGN_ASSET_EXTENSIONS: &[&str] = &["psd", "fig", "sketch", "ai", "xd"];

/// A higher-fidelity classifier consulted before the heuristics.
///
/// Returning `None` (or an unusable profile) falls back to the heuristics.
pub trait ProfileClassifier: Send + Sync {
    fn classify(&self, apps: &[InstalledApp], metadata: &[FileMetadata]) -> Option<UserProfile>;
}

/// Infers user archetypes; never fails.
#[derive(Default)]
pub struct ProfileInferenceEngine {
    classifier: Option<Box<dyn ProfileClassifier>>,
}

struct Scores {
    totals: Vec<(ProfileKind, f64)>,
    evidence: Vec<ProfileEvidence>,
}

impl Scores {
    fn new() -> Self {
        Self {
            totals: Vec::new(),
            evidence: Vec::new(),
        }
    }

    fn add(&mut self, kind: ProfileKind, reason: impl Into<String>, weight: f64) {
        match self.totals.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, total)) => *total += weight,
            None => self.totals.push((kind, weight)),
        }
        self.evidence.push(ProfileEvidence {
            reason: reason.into(),
            weight,
        });
    }
}

impl ProfileInferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: Box<dyn ProfileClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    pub fn infer_profile(&self, apps: &[InstalledApp], metadata: &[FileMetadata]) -> UserProfile {
        let disabled = std::env::var(DISABLE_CLASSIFIER_ENV).map(|v| v == "1").unwrap_or(false);
        if let (Some(classifier), false) = (&self.classifier, disabled) {
            if let Some(profile) = classifier.classify(apps, metadata).and_then(sanitize) {
                return profile;
            }
            tracing::debug!("classifier gave no usable profile, using heuristics");
        }
        infer_heuristically(apps, metadata)
    }
}

/// Clamp an externally produced profile into range, rejecting empty ones
fn sanitize(mut profile: UserProfile) -> Option<UserProfile> {
    if profile.kinds.is_empty() {
        return None;
    }
    profile.kinds.truncate(2);
    profile.confidence = profile.confidence.clamp(0.0, 1.0).max(0.5);
    for evidence in &mut profile.evidence {
        evidence.weight = evidence.weight.clamp(0.0, 1.0);
    }
    Some(profile)
}

fn ext_in(item: &FileMetadata, set: &[&str]) -> bool {
    set.contains(&item.extension.to_lowercase().as_str())
}

fn bytes_where(metadata: &[FileMetadata], pred: impl Fn(&FileMetadata) -> bool) -> u64 {
    metadata.iter().filter(|m| pred(m)).map(|m| m.size_bytes).sum()
}

/// Deterministic keyword and file-pattern scoring
pub fn infer_heuristically(apps: &[InstalledApp], metadata: &[FileMetadata]) -> UserProfile {
    let corpus = apps
        .iter()
        .map(|a| format!("{} {}", a.display_name.to_lowercase(), a.bundle_id.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ");

    let mut scores = Scores::new();

    for (needles, kind, reason, weight) in APP_SIGNALS {
        if needles.iter().any(|n| corpus.contains(n)) {
            scores.add(*kind, *reason, *weight);
        }
    }

    let extension_signal: f64 = metadata
        .iter()
        .map(|m| {
            if ext_in(m, CHECKPOINT_EXTENSIONS) {
                0.15
            } else if ext_in(m, DESIGN_EXTENSIONS) {
                0.12
            } else if ext_in(m, VIDEO_EXTENSIONS) {
                0.10
            } else {
                0.0
            }
        })
        .sum();
    if extension_signal > 0.3 {
        scores.add(
            ProfileKind::MlEngineer,
            "Checkpoint-like artifacts detected",
            extension_signal.min(1.0),
        );
    }

    let checkpoint_bytes = bytes_where(metadata, |m| {
        let path = m.path.to_lowercase();
        CHECKPOINT_FRAGMENTS.iter().any(|f| path.contains(f)) || ext_in(m, &CHECKPOINT_EXTENSIONS[..3])
    });
    if checkpoint_bytes > 2_000_000_000 {
        let weight = (checkpoint_bytes as f64 / 20_000_000_000.0).min(1.0).max(0.35);
        scores.add(
            ProfileKind::MlEngineer,
            format!("Distributed checkpoint directories detected ({})", format_size(checkpoint_bytes)),
            weight,
        );
    }

    let web_build_bytes = bytes_where(metadata, |m| {
        let path = m.path.to_lowercase();
        WEB_BUILD_FRAGMENTS.iter().any(|f| path.contains(f))
    });
    if web_build_bytes > 1_000_000_000 {
        let weight = (web_build_bytes as f64 / 15_000_000_000.0).min(1.0).max(0.30);
        scores.add(
            ProfileKind::WebDeveloper,
            format!("Web build/cache directories detected ({})", format_size(web_build_bytes)),
            weight,
        );
    }

    let design_bytes = bytes_where(metadata, |m| ext_in(m, DESIGN_ASSET_EXTENSIONS));
    if design_bytes > 750_000_000 {
        scores.add(
            ProfileKind::Designer,
            format!("Large design-source assets detected ({})", format_size(design_bytes)),
            (design_bytes as f64 / 10_000_000_000.0).min(0.8),
        );
    }

    if scores.totals.is_empty() {
        return UserProfile::general();
    }

    // Stable sorts: ties keep kind declaration order
    let mut ordered = scores.totals;
    ordered.sort_by_key(|(kind, _)| ProfileKind::ALL.iter().position(|k| k == kind));
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = ordered.iter().map(|(_, s)| s).sum();
    let top = ordered[0].1;
    let confidence = (top / total.max(0.1)).clamp(0.55, 0.99);

    let mut evidence = scores.evidence;
    evidence.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    UserProfile {
        kinds: ordered.iter().take(2).map(|(k, _)| *k).collect(),
        confidence,
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn app(name: &str, bundle_id: &str) -> InstalledApp {
        InstalledApp {
            id: format!("{}:/Applications/{}.app", bundle_id, name),
            display_name: name.into(),
            bundle_id: bundle_id.into(),
            bundle_path: PathBuf::from(format!("/Applications/{}.app", name)),
            executable_path: None,
            last_used: None,
            bundle_size: 0,
            artifacts: Vec::new(),
        }
    }

    fn meta(path: &str, ext: &str, bytes: u64) -> FileMetadata {
        FileMetadata {
            path: path.into(),
            size_bytes: bytes,
            file_count: 1,
            depth: 1,
            extension: ext.into(),
        }
    }

    struct Fixed(Option<UserProfile>);

    impl ProfileClassifier for Fixed {
        fn classify(&self, _: &[InstalledApp], _: &[FileMetadata]) -> Option<UserProfile> {
            self.0.clone()
        }
    }

    #[test]
    fn test_no_signals_is_general_user() {
        let profile = infer_heuristically(&[], &[]);
        assert_eq!(profile.kinds, vec![ProfileKind::GeneralUser]);
        assert_eq!(profile.confidence, 0.5);
        assert_eq!(profile.evidence.len(), 1);
    }

    #[test]
    fn test_xcode_makes_ios_developer() {
        let profile = infer_heuristically(&[app("Xcode", "com.apple.dt.Xcode")], &[]);
        assert_eq!(profile.kinds, vec![ProfileKind::IosDeveloper]);
        assert_eq!(profile.confidence, 0.99);
    }

    #[test]
    fn test_python_yields_two_kinds_ml_first() {
        let profile = infer_heuristically(&[app("Python Launcher", "org.python.launcher")], &[]);
        assert_eq!(profile.kinds, vec![ProfileKind::MlEngineer, ProfileKind::DataScientist]);
        assert!((profile.confidence - 1.0 / 1.7).abs() < 1e-9);
        assert_eq!(profile.evidence[0].weight, 1.0);
    }

    #[test]
    fn test_checkpoint_bytes_boost_ml() {
        let metadata = vec![meta("/data/runs/exp1", "pt", 4_000_000_000)];
        let profile = infer_heuristically(&[], &metadata);
        assert_eq!(profile.kinds[0], ProfileKind::MlEngineer);
        assert!(profile
            .evidence
            .iter()
            .any(|e| e.reason.starts_with("Distributed checkpoint directories detected") && e.weight == 0.35));
    }

    #[test]
    fn test_classifier_result_sanitized() {
        let engine = ProfileInferenceEngine::with_classifier(Box::new(Fixed(Some(UserProfile {
            kinds: vec![ProfileKind::Designer, ProfileKind::VideoCreator, ProfileKind::WebDeveloper],
            confidence: 0.2,
            evidence: vec![ProfileEvidence {
                reason: "Figma".into(),
                weight: 3.0,
            }],
        }))));
        let profile = engine.infer_profile(&[], &[]);
        assert_eq!(profile.kinds.len(), 2);
        assert_eq!(profile.confidence, 0.5);
        assert_eq!(profile.evidence[0].weight, 1.0);
    }

    #[test]
    fn test_empty_classifier_result_falls_back() {
        let engine = ProfileInferenceEngine::with_classifier(Box::new(Fixed(Some(UserProfile {
            kinds: Vec::new(),
            confidence: 0.9,
            evidence: Vec::new(),
        }))));
        assert_eq!(engine.infer_profile(&[], &[]).kinds, vec![ProfileKind::GeneralUser]);

        let engine = ProfileInferenceEngine::with_classifier(Box::new(Fixed(None)));
        assert_eq!(engine.infer_profile(&[], &[]).kinds, vec![ProfileKind::GeneralUser]);
    }
}
