//! Trait seams for side effects the core does not own
//!
//! Notification delivery and wall-clock time are injected so that the
//! platform can be driven deterministically in tests and wired to real
//! collaborators (mailers, push services) in deployment.

use crate::core::notify::{Notification, NotifyError};
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Delivers user-facing notifications
///
/// Called after the primary mutation has committed and every record lock has
/// been released. A failed delivery is logged by the caller and never undoes
/// the mutation.
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}
