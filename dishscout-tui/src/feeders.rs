use crate::tui::{TuiActor, TuiMsg};
use dishscout_search::actor::Addr;
use dishscout_search::system::ShutdownHandle;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::{self, time};

const INPUT_POLL: Duration = Duration::from_millis(100);
const TICK: Duration = Duration::from_millis(80);

/// Start the terminal input reader and the redraw ticker. Both stop on
/// shutdown.
pub fn spawn_tui_feeders(tui: Addr<TuiActor>, shutdown: ShutdownHandle) {
    // One blocking thread owns the terminal event stream for the whole run.
    let tui_in = tui.clone();
    let mut shutdown_input = shutdown.subscribe();
    tokio::task::spawn_blocking(move || {
        loop {
            match shutdown_input.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => break,
            }
            match crossterm::event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    let _ = tui_in.blocking_send(TuiMsg::OpError(format!("input: {e}")));
                    break;
                }
            }
            let msg = match crossterm::event::read() {
                Ok(ev) => TuiMsg::InputEvent(ev),
                Err(e) => TuiMsg::OpError(format!("input: {e}")),
            };
            if tui_in.blocking_send(msg).is_err() {
                break;
            }
        }
    });

    let tui_tick = tui.clone();
    let mut shutdown_tick = shutdown.subscribe();
    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            tokio::select! {
                _ = shutdown_tick.recv() => break,
                _ = interval.tick() => {
                    let _ = tui_tick.try_send(TuiMsg::Tick);
                }
            }
        }
    });
}
