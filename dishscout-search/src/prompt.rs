//! Prompt construction.
//!
//! The builder is a pure function of the query and two knobs: how many
//! restaurants to ask for and whether names must be search links. The same
//! inputs always produce byte-identical prompts.
//!
//! ```
//! use dishscout_search::prompt::PromptBuilder;
//! use dishscout_search::{Budget, Cuisine, SearchQuery};
//!
//! let query = SearchQuery::new("Singapore", Budget::Moderate, Cuisine::Japanese).unwrap();
//! let prompt = PromptBuilder::new(5, false).build(&query);
//!
//! assert!(prompt.as_str().contains("top 5 Japanese restaurants in Singapore"));
//! assert!(prompt.as_str().contains("Budget: $$"));
//! ```
use crate::{Budget, SearchQuery};
use dishscout_config::SearchSettings;
use std::fmt;
use url::form_urlencoded;

pub const SEARCH_ENGINE_URL: &str = "https://www.google.com/search";

const EXAMPLE_RESTAURANT: &str = "Example Kitchen";

/// The exact text sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrompt(String);

impl ModelPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ModelPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    result_count: u32,
    require_links: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_settings(&SearchSettings::default())
    }
}

impl PromptBuilder {
    pub const fn new(result_count: u32, require_links: bool) -> Self {
        Self {
            result_count,
            require_links,
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(settings.result_count, settings.require_links)
    }

    pub fn result_count(&self) -> u32 {
        self.result_count
    }

    pub fn require_links(&self) -> bool {
        self.require_links
    }

    pub fn build(&self, query: &SearchQuery) -> ModelPrompt {
        let count = self.result_count;
        let cuisine = query.cuisine().label();
        let location = query.location();
        let budget = query.budget();
        let noun = if count == 1 { "restaurant" } else { "restaurants" };

        let mut prompt = format!(
            "You are a knowledgeable local food guide.\n\
             Recommend the top {count} {cuisine} {noun} in {location}.\n\
             Budget: {token} ({hint}).\n\
             \n\
             For each restaurant, provide:\n\
             1. Name\n\
             2. Estimated price per person\n\
             3. A short justification for why it is recommended\n\
             4. One recommended dish to try\n\
             \n\
             Format the entire response in Markdown. Start with a level-2 heading, \
             then write one bullet per restaurant with the name in bold followed by \
             the details above.\n",
            token = budget.token(),
            hint = budget_hint(budget),
        );

        if self.require_links {
            let example = search_url(EXAMPLE_RESTAURANT, location);
            prompt.push_str(&format!(
                "Write each restaurant name as a Markdown link to a web search for that \
                 restaurant, using {SEARCH_ENGINE_URL}?q= followed by the URL-encoded \
                 restaurant name and location. For example, a restaurant called \
                 \"{EXAMPLE_RESTAURANT}\" is written as **[{EXAMPLE_RESTAURANT}]({example})**.\n"
            ));
        }

        prompt.push_str(&format!(
            "Return exactly {count} {noun} and no text after the list."
        ));

        ModelPrompt(prompt)
    }
}

fn budget_hint(budget: Budget) -> &'static str {
    match budget {
        Budget::Any => "any price range is fine",
        Budget::Inexpensive => "inexpensive",
        Budget::Moderate => "moderately priced",
        Budget::Expensive => "upscale",
        Budget::VeryExpensive => "fine dining",
    }
}

/// Web search URL for a restaurant, with name and location form-encoded.
///
/// ```
/// use dishscout_search::prompt::search_url;
///
/// assert_eq!(
///     search_url("Sushi Tei", "Singapore"),
///     "https://www.google.com/search?q=Sushi+Tei+Singapore"
/// );
/// ```
pub fn search_url(name: &str, location: &str) -> String {
    let terms = format!("{} {}", name.trim(), location.trim());
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("q", &terms)
        .finish();
    format!("{SEARCH_ENGINE_URL}?{query}")
}
