//! Place-narrative report and provider wire types

use serde::{Deserialize, Serialize};

/// How open a place appears on one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicNature {
    Open,
    Controlled,
    Contested,
}

/// Representation of the place on one platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRepresentation {
    /// "Google Maps", "Airbnb", "Event Listings" or "Social Media"
    pub platform: String,
    pub narrative_summary: String,
    pub tone: String,
    #[serde(default)]
    pub key_keywords: Vec<String>,
    pub public_nature: PublicNature,
}

/// Publics foregrounded and marginalized across platforms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Publics {
    #[serde(default)]
    pub foregrounded: Vec<String>,
    #[serde(default)]
    pub marginalized: Vec<String>,
}

/// Overall publicness assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conclusion {
    /// "Hybrid", "Agonistic" or "Homogenized"; not enforced by the schema
    #[serde(rename = "type")]
    pub kind: String,
    pub assessment: String,
}

/// Grounding source cited by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Full analysis returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub place_name: String,
    pub platforms: Vec<PlatformRepresentation>,
    #[serde(default)]
    pub overlaps: Vec<String>,
    #[serde(default)]
    pub tensions: Vec<String>,
    #[serde(default)]
    pub publics: Publics,
    pub conclusion: Conclusion,
    #[serde(default)]
    pub sources: Vec<Source>,
}

// =============================================================================
// generateContent response
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<Content>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WebChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl From<&GroundingChunk> for Source {
    fn from(chunk: &GroundingChunk) -> Self {
        let web = chunk.web.as_ref();
        Source {
            title: web
                .and_then(|web| web.title.clone())
                .unwrap_or_else(|| "Source".to_string()),
            uri: web
                .and_then(|web| web.uri.clone())
                .unwrap_or_else(|| "#".to_string()),
        }
    }
}
