//! One query in, one outcome out.
//!
//! [`Finder::search`] makes exactly one model call. Every failure collapses
//! into [`SearchOutcome::Failed`] carrying the fallback text; the error kind
//! only reaches the log.
use crate::actor::{Actor, Context};
use crate::prompt::PromptBuilder;
use crate::{FindCmd, SearchOutcome, SearchQuery, SearchResult};
use anyhow::Result;
use dishscout_llm::traits::LlmClient;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

#[derive(Clone)]
pub struct Finder {
    client: Arc<dyn LlmClient + Send + Sync>,
    prompts: PromptBuilder,
}

impl Finder {
    pub fn new(client: Arc<dyn LlmClient + Send + Sync>, prompts: PromptBuilder) -> Self {
        Self { client, prompts }
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let prompt = self.prompts.build(query);
        let started = Instant::now();

        match self.client.generate(prompt.as_str()).await {
            Ok(response) => {
                let citations = response
                    .grounding_metadata
                    .as_ref()
                    .map(|m| m.grounding_chunks.len())
                    .unwrap_or(0);
                tracing::info!(
                    cuisine = %query.cuisine(),
                    budget = %query.budget(),
                    model = self.client.model_name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    tokens = response.tokens_used,
                    grounding_chunks = citations,
                    "search completed"
                );
                SearchOutcome::Found(SearchResult::from(response))
            }
            Err(err) => {
                tracing::warn!(
                    cuisine = %query.cuisine(),
                    budget = %query.budget(),
                    model = self.client.model_name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    kind = err.kind(),
                    error = %err,
                    "search failed; showing fallback"
                );
                SearchOutcome::failed()
            }
        }
    }
}

/// Runs each [`FindCmd`] on its own task so the mailbox never blocks on the
/// network.
pub struct FinderActor {
    finder: Finder,
}

impl FinderActor {
    pub fn new(finder: Finder) -> Self {
        Self { finder }
    }
}

#[async_trait::async_trait]
impl Actor for FinderActor {
    type Msg = FindCmd;

    async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
        let FindCmd {
            request_id,
            query,
            reply,
        } = msg;
        let finder = self.finder.clone();

        let span = tracing::info_span!("search", %request_id);
        tokio::spawn(
            async move {
                let outcome = finder.search(&query).await;
                if reply.send(outcome).is_err() {
                    tracing::debug!("search finished after the requester went away");
                }
            }
            .instrument(span),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_actor;
    use crate::session::{Rejected, SearchSession};
    use crate::{Budget, Cuisine, FALLBACK_MESSAGE};
    use dishscout_common::{DishError, Result as DishResult};
    use dishscout_llm::grounding::{GroundingChunk, GroundingMetadata};
    use dishscout_llm::traits::LlmResponse;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;
    use uuid::Uuid;

    /// Replays a scripted answer and records every prompt it receives.
    struct ScriptedClient {
        answer: fn() -> DishResult<LlmResponse>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(answer: fn() -> DishResult<LlmResponse>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(&self, prompt: &str) -> DishResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            (self.answer)()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn grounded() -> DishResult<LlmResponse> {
        Ok(LlmResponse {
            text: "## Top Picks\n- **Sushi Tei**".into(),
            model: Some("scripted".into()),
            tokens_used: Some(42),
            grounding_metadata: Some(GroundingMetadata {
                grounding_chunks: vec![
                    GroundingChunk::maps("https://x", "A"),
                    GroundingChunk::default(),
                ],
                ..GroundingMetadata::default()
            }),
        })
    }

    fn unreachable() -> DishResult<LlmResponse> {
        Err(DishError::Transport("connection refused".into()))
    }

    fn finder_with(client: Arc<ScriptedClient>) -> Finder {
        Finder::new(client, PromptBuilder::new(20, false))
    }

    fn query() -> SearchQuery {
        SearchQuery::new("Singapore", Budget::Moderate, Cuisine::Japanese).unwrap()
    }

    #[tokio::test]
    async fn success_passes_text_and_grounding_through() {
        let client = ScriptedClient::new(grounded);
        let outcome = finder_with(client.clone()).search(&query()).await;

        assert!(outcome.is_found());
        let result = outcome.result();
        assert_eq!(result.text, "## Top Picks\n- **Sushi Tei**");
        assert_eq!(
            result.grounding_metadata.as_ref().unwrap().grounding_chunks.len(),
            2
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn sends_the_built_prompt() {
        let client = ScriptedClient::new(grounded);
        let finder = finder_with(client.clone());
        finder.search(&query()).await;

        let expected = finder.prompts().build(&query()).into_string();
        assert_eq!(client.prompts.lock().unwrap().as_slice(), [expected]);
    }

    #[tokio::test]
    async fn transport_failure_becomes_fallback() {
        let client = ScriptedClient::new(unreachable);
        let outcome = finder_with(client.clone()).search(&query()).await;

        assert!(!outcome.is_found());
        assert_eq!(outcome.result().text, FALLBACK_MESSAGE);
        assert!(outcome.result().grounding_metadata.is_none());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn blank_location_never_reaches_the_client() {
        let client = ScriptedClient::new(grounded);
        let _finder = finder_with(client.clone());

        let mut session = SearchSession::new();
        session.set_location("  ");
        assert_eq!(session.submit(), Err(Rejected::EmptyLocation));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn actor_replies_over_oneshot() {
        let client = ScriptedClient::new(grounded);
        let handle = spawn_actor(FinderActor::new(finder_with(client.clone())), 4);

        let (reply, rx) = oneshot::channel();
        handle
            .addr
            .send(FindCmd {
                request_id: Uuid::new_v4(),
                query: query(),
                reply,
            })
            .await
            .ok();

        let outcome = rx.await.unwrap();
        assert!(outcome.is_found());
        assert_eq!(client.calls(), 1);

        drop(handle.addr);
        handle.task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn session_round_trip_with_failure() {
        let client = ScriptedClient::new(unreachable);
        let finder = finder_with(client);

        let mut session = SearchSession::new();
        session.set_location("Singapore");
        let pending = session.submit().unwrap();
        let outcome = finder.search(&pending.query).await;
        assert!(session.complete(pending.request_id, outcome));
        assert_eq!(session.result().unwrap().text, FALLBACK_MESSAGE);
        assert!(!session.is_loading());
    }
}
