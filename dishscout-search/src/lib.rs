//! The restaurant search pipeline: form values in, rendered answer out.
//!
//! A [`SearchQuery`] is built from the form by [`session::SearchSession`],
//! turned into a prompt by [`prompt::PromptBuilder`], sent to the model by
//! [`finder::Finder`], and projected for display by [`render::present`].
//! The actor pieces ([`actor`], [`system`]) run the finder off the UI task.
pub mod actor;
pub mod finder;
pub mod prompt;
pub mod render;
pub mod session;
pub mod system;

use dishscout_common::{DishError, Result};
use dishscout_llm::grounding::GroundingMetadata;
use dishscout_llm::traits::LlmResponse;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Text shown in place of an answer whenever the model call fails.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't find any restaurants at the moment. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cuisine {
    #[default]
    Chinese,
    Italian,
    Japanese,
    Korean,
    Mexican,
    Western,
    Thai,
    Indian,
    Malay,
    Spanish,
    French,
    Vietnamese,
    Taiwanese,
    Turkish,
}

impl Cuisine {
    /// Display order of the selector.
    pub const ALL: [Cuisine; 14] = [
        Cuisine::Chinese,
        Cuisine::Italian,
        Cuisine::Japanese,
        Cuisine::Korean,
        Cuisine::Mexican,
        Cuisine::Western,
        Cuisine::Thai,
        Cuisine::Indian,
        Cuisine::Malay,
        Cuisine::Spanish,
        Cuisine::French,
        Cuisine::Vietnamese,
        Cuisine::Taiwanese,
        Cuisine::Turkish,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Cuisine::Chinese => "Chinese",
            Cuisine::Italian => "Italian",
            Cuisine::Japanese => "Japanese",
            Cuisine::Korean => "Korean",
            Cuisine::Mexican => "Mexican",
            Cuisine::Western => "Western",
            Cuisine::Thai => "Thai",
            Cuisine::Indian => "Indian",
            Cuisine::Malay => "Malay",
            Cuisine::Spanish => "Spanish",
            Cuisine::French => "French",
            Cuisine::Vietnamese => "Vietnamese",
            Cuisine::Taiwanese => "Taiwanese",
            Cuisine::Turkish => "Turkish",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cuisine {
    type Err = DishError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DishError::Validation(format!("unknown cuisine '{wanted}'")))
    }
}

/// Price tier filter; the token is what the prompt embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Budget {
    #[default]
    Any,
    Inexpensive,
    Moderate,
    Expensive,
    VeryExpensive,
}

impl Budget {
    pub const ALL: [Budget; 5] = [
        Budget::Any,
        Budget::Inexpensive,
        Budget::Moderate,
        Budget::Expensive,
        Budget::VeryExpensive,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Budget::Any => "Any",
            Budget::Inexpensive => "$",
            Budget::Moderate => "$$",
            Budget::Expensive => "$$$",
            Budget::VeryExpensive => "$$$$",
        }
    }

    /// Selector label; only `Any` differs from the token.
    pub fn label(self) -> &'static str {
        match self {
            Budget::Any => "Any Budget",
            other => other.token(),
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|b| *b == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Budget {
    type Err = DishError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.token().eq_ignore_ascii_case(wanted) || b.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DishError::Validation(format!("unknown budget '{wanted}'")))
    }
}

/// One submission of the form. Built only through [`SearchQuery::new`], so a
/// query always has a non-blank location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    location: String,
    budget: Budget,
    cuisine: Cuisine,
}

impl SearchQuery {
    /// The location is kept exactly as typed; only the emptiness check trims.
    pub fn new(location: impl Into<String>, budget: Budget, cuisine: Cuisine) -> Result<Self> {
        let location = location.into();
        if location.trim().is_empty() {
            return Err(DishError::Validation("location must not be empty".into()));
        }
        Ok(Self {
            location,
            budget,
            cuisine,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn cuisine(&self) -> Cuisine {
        self.cuisine
    }
}

/// The model's answer for one query. Replaced wholesale by the next search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

impl SearchResult {
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_MESSAGE.to_string(),
            grounding_metadata: None,
        }
    }
}

impl From<LlmResponse> for SearchResult {
    fn from(resp: LlmResponse) -> Self {
        Self {
            text: resp.text,
            grounding_metadata: resp.grounding_metadata,
        }
    }
}

/// How a search ended. Both arms carry something to display.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(SearchResult),
    Failed(SearchResult),
}

impl SearchOutcome {
    pub fn failed() -> Self {
        SearchOutcome::Failed(SearchResult::fallback())
    }

    pub fn result(&self) -> &SearchResult {
        match self {
            SearchOutcome::Found(r) | SearchOutcome::Failed(r) => r,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
}

/// Ask the finder actor to run one search and reply when done.
pub struct FindCmd {
    pub request_id: Uuid,
    pub query: SearchQuery,
    pub reply: oneshot::Sender<SearchOutcome>,
}
