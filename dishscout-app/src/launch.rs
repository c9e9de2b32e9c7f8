use anyhow::Result;
use dishscout_config::DishscoutConfig;
use dishscout_llm::build_client;
use dishscout_search::{
    finder::{Finder, FinderActor},
    prompt::PromptBuilder,
    system::ActorSystem,
};
use dishscout_tui::{Form, SearchBackend, TuiActor, spawn_tui_feeders};

const FINDER_MAILBOX: usize = 8;
const TUI_MAILBOX: usize = 256;

/// Owns the actor system and wires the finder and the UI into it.
pub struct Launch {
    system: ActorSystem,
}

impl Launch {
    pub fn new() -> Self {
        Self {
            system: ActorSystem::new(),
        }
    }

    /// `config_problem` disables search up front; otherwise a client that
    /// cannot be built (no API key) does the same.
    pub fn wire(
        &mut self,
        cfg: &DishscoutConfig,
        config_problem: Option<String>,
        form: Form,
    ) -> Result<()> {
        let prompts = PromptBuilder::from_settings(&cfg.search);

        let backend = match config_problem {
            Some(problem) => SearchBackend::Unavailable(problem),
            None => match build_client(&cfg.llm) {
                Ok(client) => {
                    let finder = Finder::new(client, prompts);
                    SearchBackend::Ready(self.system.spawn(FinderActor::new(finder), FINDER_MAILBOX))
                }
                Err(e) => {
                    tracing::error!(error = %e, kind = e.kind(), "search disabled");
                    SearchBackend::Unavailable(e.to_string())
                }
            },
        };

        let shutdown = self.system.shutdown_handle();
        let tui = TuiActor::new(backend, form, prompts.result_count(), shutdown.clone())?;
        let tui_addr = self.system.spawn(tui, TUI_MAILBOX);
        spawn_tui_feeders(tui_addr, shutdown);
        Ok(())
    }

    pub async fn run(self) -> Result<()> {
        self.system.run_until_shutdown().await
    }
}
