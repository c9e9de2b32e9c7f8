//! Form state and the per-search state machine.
//!
//! `Idle → Loading → Success | Failure`, and back to `Loading` on the next
//! accepted submit. Entering `Loading` drops the previous result, so at most
//! one result is live at a time. A submit is refused while a search is in
//! flight or while the location is blank; refusal changes nothing.
use crate::{Budget, Cuisine, SearchOutcome, SearchQuery, SearchResult};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading { request_id: Uuid, cuisine: Cuisine },
    Success(SearchResult),
    Failure(SearchResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("Enter a location to search.")]
    EmptyLocation,
    #[error("A search is already running.")]
    Busy,
}

/// An accepted submission, ready for the finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSearch {
    pub request_id: Uuid,
    pub query: SearchQuery,
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    location: String,
    budget: Budget,
    cuisine: Cuisine,
    phase: Phase,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            location: String::new(),
            budget: Budget::default(),
            cuisine: Cuisine::default(),
            phase: Phase::Idle,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn location_mut(&mut self) -> &mut String {
        &mut self.location
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    pub fn next_budget(&mut self) {
        self.budget = self.budget.next();
    }

    pub fn prev_budget(&mut self) {
        self.budget = self.budget.prev();
    }

    pub fn cuisine(&self) -> Cuisine {
        self.cuisine
    }

    pub fn set_cuisine(&mut self, cuisine: Cuisine) {
        self.cuisine = cuisine;
    }

    pub fn next_cuisine(&mut self) {
        self.cuisine = self.cuisine.next();
    }

    pub fn prev_cuisine(&mut self) {
        self.cuisine = self.cuisine.prev();
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// The live result, if the last search has finished.
    pub fn result(&self) -> Option<&SearchResult> {
        match &self.phase {
            Phase::Success(r) | Phase::Failure(r) => Some(r),
            Phase::Idle | Phase::Loading { .. } => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.location.trim().is_empty()
    }

    /// Accept the current form values as a new search.
    pub fn submit(&mut self) -> Result<PendingSearch, Rejected> {
        if self.is_loading() {
            return Err(Rejected::Busy);
        }
        let query = SearchQuery::new(self.location.clone(), self.budget, self.cuisine)
            .map_err(|_| Rejected::EmptyLocation)?;

        let request_id = Uuid::new_v4();
        self.phase = Phase::Loading {
            request_id,
            cuisine: query.cuisine(),
        };
        Ok(PendingSearch { request_id, query })
    }

    /// Record how the in-flight search ended.
    ///
    /// Returns `false` and leaves the state alone when `request_id` is not
    /// the search currently loading.
    pub fn complete(&mut self, request_id: Uuid, outcome: SearchOutcome) -> bool {
        match self.phase {
            Phase::Loading { request_id: live, .. } if live == request_id => {
                self.phase = match outcome {
                    SearchOutcome::Found(result) => Phase::Success(result),
                    SearchOutcome::Failed(result) => Phase::Failure(result),
                };
                true
            }
            _ => {
                tracing::warn!(%request_id, "ignoring completion for a search that is not loading");
                false
            }
        }
    }
}
