//! A small mailbox actor: one task, one bounded channel, one message at a time.
use anyhow::Result;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

/// `Self: Sized` keeps `Context<Self>` usable without object-safety concerns.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Msg: Send + 'static;

    /// Handle a single message. Return `Err` to stop the actor.
    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()>;
}

/// Runtime context for an actor instance.
///
/// Holds only a weak sender, so the mailbox still closes once every
/// outside `Addr` is dropped.
pub struct Context<A: Actor> {
    addr: mpsc::WeakSender<A::Msg>,
    stop: bool,
}

impl<A: Actor> Context<A> {
    /// This actor's own address, for posting follow-up messages to itself.
    /// `None` once no outside `Addr` is left.
    pub fn addr(&self) -> Option<Addr<A>> {
        self.addr.upgrade().map(Addr)
    }

    /// Stop after the current message.
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// Address for sending messages to an actor.
pub struct Addr<A: Actor>(mpsc::Sender<A::Msg>);

impl<A: Actor> Clone for Addr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> Addr<A> {
    /// Awaits mailbox space. Gives the message back if the actor is gone.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use dishscout_search::actor::{self, Actor, Context};
    /// # struct Tally(u8);
    /// # #[async_trait]
    /// # impl Actor for Tally {
    /// #     type Msg = u8;
    /// #     async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
    /// #         self.0 += msg;
    /// #         if self.0 >= 3 {
    /// #             ctx.stop();
    /// #         }
    /// #         Ok(())
    /// #     }
    /// # }
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let actor::ActorHandle { addr, task } = actor::spawn_actor(Tally(0), 4);
    ///     addr.send(1).await.unwrap();
    ///     addr.send(2).await.unwrap();
    ///     drop(addr);
    ///     task.await.unwrap().unwrap();
    /// });
    /// ```
    pub async fn send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.send(msg).await.map_err(|e| e.0)
    }

    /// Gives the message back if the mailbox is full or closed.
    pub fn try_send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.try_send(msg).map_err(|e| e.into_inner())
    }

    /// For producers living on a blocking thread. Panics inside an async context.
    pub fn blocking_send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.blocking_send(msg).map_err(|e| e.0)
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Handle to a running actor task.
pub struct ActorHandle<A: Actor> {
    pub addr: Addr<A>,
    pub task: JoinHandle<Result<()>>,
}

/// Spawn an actor with a bounded mailbox.
///
/// The actor stops when `handle` returns `Err`, when every `Addr` is dropped,
/// or when `ctx.stop()` is called.
pub fn spawn_actor<A: Actor>(actor: A, capacity: usize) -> ActorHandle<A> {
    spawn_actor_with_shutdown(actor, capacity, None)
}

/// Like [`spawn_actor`], but also stops when `shutdown` fires.
pub fn spawn_actor_with_shutdown<A: Actor>(
    mut actor: A,
    capacity: usize,
    shutdown: Option<broadcast::Receiver<()>>,
) -> ActorHandle<A> {
    let (tx, mut rx) = mpsc::channel::<A::Msg>(capacity);
    let weak = tx.downgrade();
    let addr = Addr(tx);

    let task = tokio::spawn(async move {
        let mut ctx = Context {
            addr: weak,
            stop: false,
        };
        let mut shutdown = shutdown;

        loop {
            let next = match shutdown.as_mut() {
                Some(shutdown_rx) => tokio::select! {
                    _ = shutdown_rx.recv() => None,
                    maybe_msg = rx.recv() => maybe_msg,
                },
                None => rx.recv().await,
            };
            let Some(msg) = next else { break };

            if let Err(e) = actor.handle(msg, &mut ctx).await {
                tracing::error!(target = "dishscout-actors", error = ?e, "actor returned error; stopping");
                return Err(e);
            }
            if ctx.stop {
                break;
            }
        }
        Ok(())
    });

    ActorHandle { addr, task }
}
