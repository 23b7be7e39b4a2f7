use tokio::sync::oneshot;

/// Requests from the caller-facing [`SessionCoordinator`](crate::SessionCoordinator)
/// to its negotiation task.
#[derive(Debug)]
pub(crate) enum CoordinatorCommand {
    /// Tear the call down; `done` fires once cleanup has finished.
    Leave { done: oneshot::Sender<()> },
}
