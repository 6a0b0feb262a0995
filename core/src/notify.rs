//! The notification (toast) boundary.
//!
//! Notifications are fire-and-forget: the effect task hands a message and a
//! severity to the collaborator and moves on without suspending. How the
//! message is rendered is entirely the presentation layer's business.

/// Severity of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// The call succeeded and the server asked for the fact to be surfaced
    Success,
    /// The call failed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The notification collaborator.
///
/// Implementations must not block: `notify` is called from inside effect
/// tasks between their suspension point and their terminal signal.
pub trait Notifier: Send + Sync {
    /// Surface a message to the user.
    fn notify(&self, message: &str, severity: Severity);
}

/// A notifier that drops everything.
///
/// Useful when wiring a store without a presentation layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _message: &str, _severity: Severity) {}
}
