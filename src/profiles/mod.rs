//! User-archetype inference and the recommendations it biases.

pub mod inference;
pub mod ranker;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use inference::{ProfileClassifier, ProfileInferenceEngine};
pub use ranker::RecommendationRanker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    IosDeveloper,
    WebDeveloper,
    MlEngineer,
    Designer,
    VideoCreator,
    DataScientist,
    GeneralUser,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 7] = [
        ProfileKind::IosDeveloper,
        ProfileKind::WebDeveloper,
        ProfileKind::MlEngineer,
        ProfileKind::Designer,
        ProfileKind::VideoCreator,
        ProfileKind::DataScientist,
        ProfileKind::GeneralUser,
    ];
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::IosDeveloper => write!(f, "iOS Developer"),
            ProfileKind::WebDeveloper => write!(f, "Web Developer"),
            ProfileKind::MlEngineer => write!(f, "ML Engineer"),
            ProfileKind::Designer => write!(f, "Designer"),
            ProfileKind::VideoCreator => write!(f, "Video Creator"),
            ProfileKind::DataScientist => write!(f, "Data Scientist"),
            ProfileKind::GeneralUser => write!(f, "General User"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEvidence {
    pub reason: String,
    pub weight: f64,
}

/// One or two archetypes, most likely first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub kinds: Vec<ProfileKind>,
    /// In [0, 1]
    pub confidence: f64,
    /// Heaviest first
    pub evidence: Vec<ProfileEvidence>,
}

impl UserProfile {
    pub fn general() -> Self {
        Self {
            kinds: vec![ProfileKind::GeneralUser],
            confidence: 0.5,
            evidence: vec![ProfileEvidence {
                reason: "No strong profile indicators found".to_string(),
                weight: 0.5,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub path: Option<PathBuf>,
    pub impact: f64,
    pub confidence: f64,
    pub risk: f64,
    pub reversible: bool,
}

/// Cached output of one recommendation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub profile: UserProfile,
    pub recommendations: Vec<Recommendation>,
}
