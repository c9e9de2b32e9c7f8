//! Task tracking and shutdown signaling for the running app.
//!
//! Actors subscribe to the broadcast channel for cooperative shutdown; the
//! `JoinSet` makes sure every spawned task is awaited during teardown.
use crate::actor::{self, Actor, Addr};
use anyhow::Result;
use tokio::{sync::broadcast, task::JoinSet};

#[derive(Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    pub fn signal(&self) {
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

pub struct ActorSystem {
    joinset: JoinSet<Result<()>>,
    shutdown_tx: broadcast::Sender<()>,
    // Subscribed at construction so no signal sent before `run_until_shutdown` is missed.
    shutdown_rx: broadcast::Receiver<()>,
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(32);
        Self {
            joinset: JoinSet::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Spawn an actor that stops on shutdown, and track its task. An actor
    /// that fails or panics brings the whole system down.
    pub fn spawn<A: Actor>(&mut self, actor: A, mailbox: usize) -> Addr<A> {
        let actor::ActorHandle { addr, task } =
            actor::spawn_actor_with_shutdown(actor, mailbox, Some(self.shutdown_tx.subscribe()));
        let shutdown = self.shutdown_handle();
        self.joinset.spawn(async move {
            let res = match task.await {
                Ok(res) => res,
                Err(join) => Err(join.into()),
            };
            if let Err(e) = &res {
                tracing::error!(error = ?e, "actor failed; shutting down");
                shutdown.signal();
            }
            res
        });
        addr
    }

    pub fn track(&mut self, fut: impl std::future::Future<Output = Result<()>> + Send + 'static) {
        self.joinset.spawn(fut);
    }

    /// Wait for Ctrl-C or a [`ShutdownHandle::signal`], then shut down.
    pub async fn run_until_shutdown(mut self) -> Result<()> {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("ctrl-c received; shutting down");
            }
            _ = self.shutdown_rx.recv() => {
                tracing::info!("shutdown requested");
            }
        }
        self.graceful_shutdown().await
    }

    /// Signal shutdown and await every task; the first failure is returned.
    pub async fn graceful_shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        let mut first_err = None;
        while let Some(res) = self.joinset.join_next().await {
            if let Err(e) = res.map_err(anyhow::Error::from).and_then(|r| r) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Context;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter(Arc<AtomicUsize>);

    struct Faulty;

    #[async_trait::async_trait]
    impl Actor for Faulty {
        type Msg = ();

        async fn handle(&mut self, _msg: (), _ctx: &mut Context<Self>) -> Result<()> {
            anyhow::bail!("terminal write failed")
        }
    }

    #[async_trait::async_trait]
    impl Actor for Counter {
        type Msg = ();

        async fn handle(&mut self, _msg: (), _ctx: &mut Context<Self>) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn signal_stops_spawned_actors() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut system = ActorSystem::new();
        let addr = system.spawn(Counter(seen.clone()), 4);
        addr.send(()).await.ok();

        let handle = system.shutdown_handle();
        tokio::spawn(async move { handle.signal() });

        system.run_until_shutdown().await.unwrap();
        assert!(addr.is_closed());
        assert!(seen.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn failing_actor_shuts_the_system_down() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut system = ActorSystem::new();
        let bystander = system.spawn(Counter(seen), 4);
        let faulty = system.spawn(Faulty, 4);
        faulty.send(()).await.ok();

        let res = tokio::time::timeout(Duration::from_secs(5), system.run_until_shutdown())
            .await
            .expect("shutdown follows the failure");
        assert!(res.is_err());
        assert!(bystander.is_closed());
    }

    #[tokio::test]
    async fn tracked_task_error_surfaces() {
        let mut system = ActorSystem::new();
        system.track(async { anyhow::bail!("boom") });
        assert!(system.graceful_shutdown().await.is_err());
    }

    #[tokio::test]
    async fn tracked_tasks_see_shutdown() {
        let mut system = ActorSystem::new();
        let mut rx = system.shutdown_handle().subscribe();
        system.track(async move {
            rx.recv().await.ok();
            Ok(())
        });
        system.graceful_shutdown().await.unwrap();
    }
}
