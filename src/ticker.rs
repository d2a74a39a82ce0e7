//! Periodic tick driver.
//!
//! [`spawn`] moves a [`StreamSession`] into a tokio task that advances it once
//! per configured interval and publishes a snapshot on a `watch` channel.
//! The channel holds only the newest snapshot, so a slow consumer skips
//! intermediate frames instead of queueing them. Because of that, every
//! published snapshot is a self-contained [`RedrawMode::Full`] redraw; the
//! overlay layers are `Arc`-shared, so this costs no copying.
//!
//! Missed ticks are skipped rather than replayed in a burst, and ticks never
//! overlap: the task owns the session exclusively.
//!
//! Dropping the [`TickerHandle`] aborts the task.
//!
//! [`RedrawMode::Full`]: crate::surface::RedrawMode::Full

use crate::error::{Error, Result};
use crate::random::RandomSource;
use crate::session::StreamSession;
use crate::surface::{Redraw, RenderSurface};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Reset,
    Stop,
}

/// Control handle for a running ticker.
#[derive(Debug)]
pub struct TickerHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<Result<()>>>,
    period: Duration,
}

impl TickerHandle {
    /// Stop advancing; the last snapshot stays published.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TickerStopped`] if the task has ended.
    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    /// Resume advancing on the next interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TickerStopped`] if the task has ended.
    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    /// Re-seed the session and publish a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TickerStopped`] if the task has ended.
    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true once the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the task and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the task early, if any, or
    /// [`Error::TickerStopped`] if the task panicked.
    pub async fn stop(mut self) -> Result<()> {
        // The task may already be gone; its outcome is reported below
        let _ = self.commands.send(Command::Stop);
        match self.task.take() {
            Some(task) => task.await.map_err(|_| Error::TickerStopped)?,
            None => Ok(()),
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::TickerStopped)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Start ticking `session` at its configured interval.
///
/// The receiver initially holds the session's current snapshot. Must be
/// called from within a tokio runtime.
pub fn spawn<R>(session: StreamSession<R>) -> (TickerHandle, watch::Receiver<Arc<Redraw>>)
where
    R: RandomSource + Send + 'static,
{
    let period = session.config().stream.interval();
    let (updates, receiver) = watch::channel(Arc::new(session.snapshot()));
    let (commands, inbox) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(session, period, updates, inbox));
    info!(period_ms = period.as_millis() as u64, "ticker started");
    (TickerHandle { commands, task: Some(task), period }, receiver)
}

async fn run<R: RandomSource>(
    mut session: StreamSession<R>,
    period: Duration,
    updates: watch::Sender<Arc<Redraw>>,
    mut inbox: mpsc::UnboundedReceiver<Command>,
) -> Result<()> {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match session.advance() {
                    Ok(true) => publish(&updates, &session),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, version = session.version(), "ticker halted");
                        return Err(e);
                    }
                }
            }
            command = inbox.recv() => match command {
                Some(Command::Pause) => session.pause(),
                Some(Command::Resume) => session.resume(),
                Some(Command::Reset) => {
                    session.reset()?;
                    publish(&updates, &session);
                }
                Some(Command::Stop) | None => break,
            },
        }
    }

    info!(version = session.version(), "ticker stopped");
    Ok(())
}

fn publish<R: RandomSource>(updates: &watch::Sender<Arc<Redraw>>, session: &StreamSession<R>) {
    // send_replace publishes even while no receiver is subscribed
    updates.send_replace(Arc::new(session.snapshot()));
}

/// Feed every snapshot observed on `updates` into `surface` until the ticker
/// stops. Returns how many redraws were submitted.
///
/// Snapshots published faster than the surface accepts them are coalesced;
/// only the newest is submitted.
///
/// # Errors
///
/// Propagates the first surface error.
pub async fn pump<S>(surface: &mut S, mut updates: watch::Receiver<Arc<Redraw>>) -> Result<u64>
where
    S: RenderSurface + ?Sized,
{
    let mut submitted = 0;
    loop {
        let redraw = Arc::clone(&updates.borrow_and_update());
        surface.submit(&redraw)?;
        submitted += 1;
        if updates.changed().await.is_err() {
            break;
        }
    }
    Ok(submitted)
}
