//! Single-flight task controller.
//!
//! A [`TaskController`] runs at most one long operation at a time. Starting an
//! operation moves the observable [`TaskStatus`] to the phase's in-flight
//! state; the operation itself runs on the tokio runtime, and its result is
//! sent back to the dispatcher over an mpsc channel. The dispatcher applies
//! the result to its state and calls [`TaskController::finish`], which moves
//! the status to `Succeeded` or `Failed(reason)`. State is therefore only
//! ever mutated on the dispatcher.
//!
//! Observers subscribe to [`TaskEvent`]s through a broadcast channel and
//! re-render from state on each event.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinError;
use tracing::{debug, warn};

/// Capacity of the observer broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Kind of long-running operation, declaring its in-flight status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    /// Listing the formats of a source URL.
    Discovering,
    /// Resolving or fetching the chosen format.
    Downloading,
    /// Waiting for the remote chat reply.
    AwaitingReply,
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovering => write!(f, "discovering"),
            Self::Downloading => write!(f, "downloading"),
            Self::AwaitingReply => write!(f, "awaiting-reply"),
        }
    }
}

/// UI-observable status of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// Format discovery in flight.
    Discovering,
    /// Download resolution in flight.
    Downloading,
    /// Chat request in flight.
    AwaitingReply,
    /// Last operation completed successfully.
    Succeeded,
    /// Last operation failed with the given reason.
    Failed(String),
}

impl From<TaskPhase> for TaskStatus {
    fn from(phase: TaskPhase) -> Self {
        match phase {
            TaskPhase::Discovering => Self::Discovering,
            TaskPhase::Downloading => Self::Downloading,
            TaskPhase::AwaitingReply => Self::AwaitingReply,
        }
    }
}

/// Notification emitted to observers on every status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// An operation was admitted and is now in flight.
    Started(TaskPhase),
    /// The in-flight operation reached a terminal status.
    Finished {
        /// Phase of the operation that finished.
        phase: TaskPhase,
        /// `Succeeded` or `Failed(reason)`.
        status: TaskStatus,
    },
}

/// Single-flight guard around one long-running operation at a time.
///
/// `C` is the completion message type the dispatcher receives.
pub struct TaskController<C> {
    status: TaskStatus,
    current: Option<TaskPhase>,
    events: broadcast::Sender<TaskEvent>,
    completions: mpsc::UnboundedSender<C>,
    deadline: Option<Duration>,
}

impl<C: Send + 'static> TaskController<C> {
    /// Creates an idle controller delivering completions to `completions`.
    #[must_use]
    pub fn new(completions: mpsc::UnboundedSender<C>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            status: TaskStatus::Idle,
            current: None,
            events,
            completions,
            deadline: None,
        }
    }

    /// Fails any operation that runs longer than `deadline`.
    ///
    /// Without a deadline operations run to completion or failure.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    /// Returns true while an operation is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Subscribes to status transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Starts `operation` unless another one is in flight.
    ///
    /// Returns `false` (and does nothing) when busy. Otherwise the status
    /// becomes `phase`, observers are notified, and `operation` is spawned.
    /// Its result, with errors rendered to their message text, is wrapped by
    /// `into_completion` and delivered to the dispatcher exactly once.
    pub fn run<T, E, F, W>(&mut self, phase: TaskPhase, operation: F, into_completion: W) -> bool
    where
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
        F: Future<Output = Result<T, E>> + Send + 'static,
        W: FnOnce(Result<T, String>) -> C + Send + 'static,
    {
        if let Some(running) = self.current {
            debug!(requested = %phase, running = %running, "Operation already in flight; ignoring");
            return false;
        }

        self.current = Some(phase);
        self.status = TaskStatus::from(phase);
        let _ = self.events.send(TaskEvent::Started(phase));
        debug!(phase = %phase, "Operation started");

        let completions = self.completions.clone();
        let deadline = self.deadline;
        tokio::spawn(async move {
            // The operation runs in its own task so a panic surfaces as a
            // JoinError instead of swallowing the completion.
            let mut work = tokio::spawn(operation);
            let result = match deadline {
                Some(limit) => match tokio::time::timeout(limit, &mut work).await {
                    Ok(joined) => settle(joined),
                    Err(_) => {
                        work.abort();
                        Err(format!("operation timed out after {} ms", limit.as_millis()))
                    }
                },
                None => settle((&mut work).await),
            };
            if completions.send(into_completion(result)).is_err() {
                warn!(phase = %phase, "Dispatcher is gone; dropping completion");
            }
        });
        true
    }

    /// Applies the terminal status for the in-flight operation.
    ///
    /// Called by the dispatcher when it receives the completion. A call with
    /// nothing in flight is ignored.
    pub fn finish<T>(&mut self, result: &Result<T, String>) {
        let Some(phase) = self.current.take() else {
            warn!("Completion received with no operation in flight; ignoring");
            return;
        };
        self.status = match result {
            Ok(_) => TaskStatus::Succeeded,
            Err(reason) => TaskStatus::Failed(reason.clone()),
        };
        debug!(phase = %phase, status = ?self.status, "Operation finished");
        let _ = self.events.send(TaskEvent::Finished {
            phase,
            status: self.status.clone(),
        });
    }
}

/// Flattens a joined operation into its completion result.
fn settle<T, E: fmt::Display>(joined: Result<Result<T, E>, JoinError>) -> Result<T, String> {
    match joined {
        Ok(result) => result.map_err(|error| error.to_string()),
        Err(error) if error.is_panic() => {
            let payload = error.into_panic();
            let detail = payload
                .downcast_ref::<&str>()
                .map(|message| (*message).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "no message".to_string());
            warn!(detail = %detail, "Operation panicked");
            Err(format!("operation panicked: {detail}"))
        }
        Err(error) => Err(format!("operation was cancelled: {error}")),
    }
}

impl<C> fmt::Debug for TaskController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskController")
            .field("status", &self.status)
            .field("current", &self.current)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    type Completion = Result<u32, String>;

    fn controller() -> (TaskController<Completion>, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TaskController::new(tx), rx)
    }

    #[tokio::test]
    async fn test_run_moves_through_in_flight_to_succeeded() {
        let (mut controller, mut rx) = controller();
        let mut events = controller.subscribe();

        assert_eq!(controller.status(), &TaskStatus::Idle);
        let started = controller.run(
            TaskPhase::Discovering,
            async { Ok::<_, String>(7) },
            |result| result,
        );
        assert!(started);
        assert_eq!(controller.status(), &TaskStatus::Discovering);
        assert!(controller.is_busy());

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion, Ok(7));
        // Status stays in flight until the dispatcher applies the completion.
        assert_eq!(controller.status(), &TaskStatus::Discovering);

        controller.finish(&completion);
        assert_eq!(controller.status(), &TaskStatus::Succeeded);
        assert!(!controller.is_busy());

        assert_eq!(
            events.recv().await.unwrap(),
            TaskEvent::Started(TaskPhase::Discovering)
        );
        assert_eq!(
            events.recv().await.unwrap(),
            TaskEvent::Finished {
                phase: TaskPhase::Discovering,
                status: TaskStatus::Succeeded,
            }
        );
    }

    #[tokio::test]
    async fn test_failure_carries_error_message() {
        let (mut controller, mut rx) = controller();
        controller.run(
            TaskPhase::Downloading,
            async { Err::<u32, _>(std::io::Error::other("disk full")) },
            |result| result,
        );

        let completion = rx.recv().await.unwrap();
        controller.finish(&completion);
        assert_eq!(controller.status(), &TaskStatus::Failed("disk full".to_string()));
    }

    #[tokio::test]
    async fn test_second_run_while_busy_is_noop_and_first_result_delivered_once() {
        let (mut controller, mut rx) = controller();
        let mut events = controller.subscribe();
        let (release, gate) = oneshot::channel::<()>();

        assert!(controller.run(
            TaskPhase::Discovering,
            async move {
                gate.await.ok();
                Ok::<_, String>(1)
            },
            |result| result,
        ));
        assert!(!controller.run(
            TaskPhase::Downloading,
            async { Ok::<_, String>(2) },
            |result| result,
        ));
        assert_eq!(controller.status(), &TaskStatus::Discovering);

        release.send(()).unwrap();
        let completion = rx.recv().await.unwrap();
        assert_eq!(completion, Ok(1));
        controller.finish(&completion);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err(), "only one completion expected");

        assert_eq!(
            events.recv().await.unwrap(),
            TaskEvent::Started(TaskPhase::Discovering)
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            TaskEvent::Finished { phase: TaskPhase::Discovering, .. }
        ));
        assert!(events.try_recv().is_err(), "no events for the rejected run");
    }

    #[tokio::test]
    async fn test_controller_usable_after_failure() {
        let (mut controller, mut rx) = controller();
        controller.run(TaskPhase::Discovering, async { Err::<u32, _>("nope") }, |r| r);
        let completion = rx.recv().await.unwrap();
        controller.finish(&completion);

        assert!(controller.run(TaskPhase::Discovering, async { Ok::<_, String>(3) }, |r| r));
        let completion = rx.recv().await.unwrap();
        controller.finish(&completion);
        assert_eq!(controller.status(), &TaskStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_deadline_fails_slow_operation() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
        let mut controller = TaskController::new(tx).with_deadline(Duration::from_millis(20));
        controller.run(
            TaskPhase::AwaitingReply,
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, String>(0)
            },
            |r| r,
        );

        let completion = rx.recv().await.unwrap();
        controller.finish(&completion);
        match controller.status() {
            TaskStatus::Failed(reason) => assert!(reason.contains("timed out"), "{reason}"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_finish_without_in_flight_is_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel::<Completion>();
        let mut controller = TaskController::new(tx);
        controller.finish(&Ok::<u32, String>(1));
        assert_eq!(controller.status(), &TaskStatus::Idle);
    }

    #[tokio::test]
    async fn test_panicking_operation_still_completes_and_frees_controller() {
        let (mut controller, mut rx) = controller();
        let mut events = controller.subscribe();

        assert!(controller.run(
            TaskPhase::Discovering,
            async {
                if true {
                    panic!("resolver blew up");
                }
                Ok::<u32, String>(0)
            },
            |r| r,
        ));

        let completion = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("completion delivered")
            .unwrap();
        controller.finish(&completion);
        match controller.status() {
            TaskStatus::Failed(reason) => {
                assert!(reason.contains("panicked"), "{reason}");
                assert!(reason.contains("resolver blew up"), "{reason}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!controller.is_busy());
        assert_eq!(
            events.recv().await.unwrap(),
            TaskEvent::Started(TaskPhase::Discovering)
        );
        assert!(matches!(
            events.recv().await.unwrap(),
            TaskEvent::Finished { status: TaskStatus::Failed(_), .. }
        ));

        assert!(controller.run(TaskPhase::Discovering, async { Ok::<_, String>(5) }, |r| r));
        let completion = rx.recv().await.unwrap();
        assert_eq!(completion, Ok(5));
    }
}
