use crate::{
    form::{Form, Intent},
    keymap::{self, Action},
    markdown, styles,
    view::{self, ViewSnap},
};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::{
    event::{Event as CtEvent, KeyEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use dishscout_search::{
    FindCmd, SearchOutcome,
    actor::{Actor, Addr, Context},
    finder::FinderActor,
    session::{PendingSearch, Phase, SearchSession},
    system::ShutdownHandle,
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    text::{Line, Span},
};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::oneshot;
use uuid::Uuid;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Label and enabled state of the submit control.
fn submit_button(session: &SearchSession, searchable: bool) -> (&'static str, bool) {
    if session.is_loading() {
        ("Searching...", false)
    } else {
        ("Find", searchable && session.can_submit())
    }
}

/// Start a search from the form, or return the warning to show instead.
/// A refused submit leaves the session untouched.
fn claim_search(form: &mut Form, notice: Option<&str>) -> Result<PendingSearch, String> {
    if let Some(notice) = notice {
        return Err(notice.to_string());
    }
    form.session_mut().submit().map_err(|rejected| {
        tracing::debug!(%rejected, "submit refused");
        rejected.to_string()
    })
}

/// Where submitted searches go. `Unavailable` carries the notice shown
/// instead, e.g. a missing API key.
pub enum SearchBackend {
    Ready(Addr<FinderActor>),
    Unavailable(String),
}

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    SearchDone {
        request_id: Uuid,
        outcome: SearchOutcome,
    },
    OpError(String),
    Shutdown,
}

pub struct TuiActor {
    backend: SearchBackend,
    result_count: u32,

    // terminal
    term: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
    tick_rate: Duration,
    last_tick: Instant,

    // ui state
    form: Form,
    body: Vec<Line<'static>>,
    scroll: usize, // from top
    warning: Option<String>,
    dirty: bool,
    spin_idx: usize,

    // shutdown coordination
    shutdown: ShutdownHandle,
}

impl TuiActor {
    pub fn new(
        backend: SearchBackend,
        form: Form,
        result_count: u32,
        shutdown: ShutdownHandle,
    ) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let term_backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(term_backend)?;
        term.clear()?;

        let mut actor = Self {
            backend,
            result_count,
            term,
            restored: false,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
            form,
            body: Vec::new(),
            scroll: 0,
            warning: None,
            dirty: true,
            spin_idx: 0,
            shutdown,
        };
        actor.refresh_body();
        Ok(actor)
    }

    fn notice(&self) -> Option<&str> {
        match &self.backend {
            SearchBackend::Ready(_) => None,
            SearchBackend::Unavailable(notice) => Some(notice),
        }
    }

    /// Rebuild the result pane from the session phase.
    fn refresh_body(&mut self) {
        self.body = match self.form.session().phase() {
            Phase::Idle => vec![
                Line::from(Span::styled(
                    "Pick a cuisine and a budget, type a location, then press Enter.",
                    styles::system(),
                )),
            ],
            Phase::Loading { cuisine, .. } => vec![Line::from(Span::styled(
                format!(
                    "Consulting the culinary maps for top {} {} spots...",
                    self.result_count, cuisine
                ),
                styles::label(),
            ))],
            Phase::Success(result) => markdown::render_result(result),
            Phase::Failure(result) => vec![Line::from(Span::styled(
                result.text.clone(),
                styles::warning(),
            ))],
        };
        self.dirty = true;
    }

    fn spinner(&self) -> &'static str {
        if self.form.session().is_loading() {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn step_spinner(&mut self) {
        if self.form.session().is_loading() {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn draw(&mut self) -> Result<()> {
        let spinner = self.spinner();
        let session = self.form.session();
        let loading = session.is_loading();
        let (button, button_enabled) =
            submit_button(session, matches!(self.backend, SearchBackend::Ready(_)));
        let snap = ViewSnap {
            title: format!("Find the Best {} Cuisine", session.cuisine()),
            focus: self.form.focus(),
            cuisine: session.cuisine().label(),
            budget: session.budget().label(),
            location: session.location(),
            cursor: self.form.cursor(),
            button,
            button_enabled,
            notice: match &self.backend {
                SearchBackend::Ready(_) => None,
                SearchBackend::Unavailable(notice) => Some(notice.as_str()),
            },
            warning: self.warning.as_deref(),
            body: &self.body,
            scroll: self.scroll,
            busy: loading,
            spinner,
        };

        self.scroll = view::draw(&mut self.term, &snap)?;
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, me: Addr<TuiActor>) -> Option<TuiMsg> {
        let action = keymap::action_for(key)?;
        self.dirty = true;
        match action {
            Action::ScrollUp(n) => self.scroll = self.scroll.saturating_sub(n),
            Action::ScrollDown(n) => self.scroll = self.scroll.saturating_add(n),
            other => {
                if !matches!(other, Action::Submit) {
                    self.warning = None;
                }
                match self.form.apply(other) {
                    Some(Intent::Quit) => return Some(TuiMsg::Shutdown),
                    Some(Intent::Submit) => self.submit(me),
                    None => {}
                }
            }
        }
        None
    }

    fn submit(&mut self, me: Addr<TuiActor>) {
        let notice = match &self.backend {
            SearchBackend::Ready(_) => None,
            SearchBackend::Unavailable(notice) => Some(notice.as_str()),
        };
        let PendingSearch { request_id, query } = match claim_search(&mut self.form, notice) {
            Ok(pending) => pending,
            Err(warning) => {
                self.warning = Some(warning);
                return;
            }
        };
        let SearchBackend::Ready(finder) = &self.backend else {
            return;
        };
        let finder = finder.clone();
        tracing::info!(
            %request_id,
            cuisine = %query.cuisine(),
            budget = %query.budget(),
            "search submitted"
        );
        self.warning = None;
        self.scroll = 0;
        self.refresh_body();

        let (tx, rx) = oneshot::channel();
        let cmd = FindCmd {
            request_id,
            query,
            reply: tx,
        };
        if finder.try_send(cmd).is_err() {
            tracing::warn!(%request_id, "finder mailbox unavailable; showing fallback");
            self.finish(request_id, SearchOutcome::failed());
            return;
        }

        tokio::spawn(async move {
            let outcome = rx.await.unwrap_or_else(|_| SearchOutcome::failed());
            let _ = me.send(TuiMsg::SearchDone { request_id, outcome }).await;
        });
    }

    fn finish(&mut self, request_id: Uuid, outcome: SearchOutcome) {
        if self.form.session_mut().complete(request_id, outcome) {
            self.scroll = 0;
            self.refresh_body();
        }
    }

    fn restore_terminal(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        self.term.show_cursor().ok();
    }
}

impl Drop for TuiActor {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}

#[async_trait]
impl Actor for TuiActor {
    type Msg = TuiMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            TuiMsg::InputEvent(ev) => match ev {
                CtEvent::Key(k) => {
                    if let Some(me) = ctx.addr() {
                        if let Some(next) = self.handle_key(k, me.clone()) {
                            let _ = me.try_send(next);
                        }
                    }
                }
                CtEvent::Resize(_, _) => self.dirty = true,
                _ => {}
            },
            TuiMsg::SearchDone {
                request_id,
                outcome,
            } => self.finish(request_id, outcome),
            TuiMsg::OpError(e) => {
                tracing::warn!(error = %e, "terminal input error");
                self.warning = Some(format!("× Error: {e}"));
                self.dirty = true;
            }
            TuiMsg::Tick => {
                self.step_spinner();
                if self.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    if let Err(e) = self.draw() {
                        tracing::error!(error = ?e, "terminal draw failed; shutting down");
                        self.restore_terminal();
                        self.shutdown.signal();
                        return Err(e);
                    }
                    self.last_tick = Instant::now();
                    self.dirty = false;
                }
            }
            TuiMsg::Shutdown => {
                self.restore_terminal();
                if let Some(notice) = self.notice() {
                    tracing::info!(notice, "exiting with search disabled");
                }
                self.shutdown.signal();
                ctx.stop();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Action;
    use dishscout_search::{Budget, Cuisine, session::Rejected};

    fn form_with(location: &str) -> Form {
        let mut form = Form::new();
        for ch in location.chars() {
            form.apply(Action::Insert(ch));
        }
        form
    }

    #[test]
    fn empty_location_warns_without_starting_a_search() {
        let mut form = Form::preset(Some(Cuisine::Thai), Some(Budget::Any));
        let warning = claim_search(&mut form, None).unwrap_err();

        assert_eq!(warning, Rejected::EmptyLocation.to_string());
        assert_eq!(*form.session().phase(), Phase::Idle);
        assert_eq!(submit_button(form.session(), true), ("Find", false));
    }

    #[test]
    fn button_reads_searching_while_loading() {
        let mut form = form_with("Singapore");
        assert_eq!(submit_button(form.session(), true), ("Find", true));

        let pending = claim_search(&mut form, None).unwrap();
        assert_eq!(pending.query.location(), "Singapore");
        assert_eq!(submit_button(form.session(), true), ("Searching...", false));

        let again = claim_search(&mut form, None).unwrap_err();
        assert_eq!(again, Rejected::Busy.to_string());
        assert_eq!(form.apply(Action::Submit), Some(Intent::Submit));
    }

    #[test]
    fn disabled_search_shows_the_notice() {
        let mut form = form_with("Singapore");
        assert_eq!(submit_button(form.session(), false), ("Find", false));

        let warning = claim_search(&mut form, Some("no API key configured")).unwrap_err();
        assert_eq!(warning, "no API key configured");
        assert!(!form.session().is_loading());
    }
}
