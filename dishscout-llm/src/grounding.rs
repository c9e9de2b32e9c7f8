//! Citation metadata that may accompany generated text.
//!
//! These types mirror the `groundingMetadata` block of a Gemini candidate.
//! Every field is optional on the wire; a chunk without a `maps` entry is a
//! valid chunk that simply has nothing to show as a place link.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps: Option<MapsSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

/// A place reference returned by map grounding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapsSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

impl GroundingChunk {
    pub fn maps(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            maps: Some(MapsSource {
                uri: uri.into(),
                title: title.into(),
            }),
            web: None,
        }
    }
}
