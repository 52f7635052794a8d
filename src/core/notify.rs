//! Fire-and-forget notifications
//!
//! Status changes and adjustments produce a [`Notification`]. Delivery goes
//! through the injected [`Notifier`]; [`dispatch`] logs delivery failures and
//! swallows them.

use crate::core::traits::Notifier;
use crate::types::{Minor, OrderId, UserId, WithdrawalId, WithdrawalStatus, ZenStatus};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Event worth telling the wallet owner about
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    WalletAdjusted {
        user_id: UserId,
        amount: Minor,
        balance_after: Minor,
        reason: String,
    },
    OrderStatusChanged {
        user_id: UserId,
        order_id: OrderId,
        from: ZenStatus,
        to: ZenStatus,
    },
    WithdrawalRequested {
        user_id: UserId,
        withdrawal_id: WithdrawalId,
        amount: Minor,
    },
    WithdrawalStatusChanged {
        user_id: UserId,
        withdrawal_id: WithdrawalId,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },
}

impl Notification {
    pub fn user_id(&self) -> UserId {
        match self {
            Notification::WalletAdjusted { user_id, .. }
            | Notification::OrderStatusChanged { user_id, .. }
            | Notification::WithdrawalRequested { user_id, .. }
            | Notification::WithdrawalStatusChanged { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::WalletAdjusted { .. } => "wallet_adjusted",
            Notification::OrderStatusChanged { .. } => "order_status_changed",
            Notification::WithdrawalRequested { .. } => "withdrawal_requested",
            Notification::WithdrawalStatusChanged { .. } => "withdrawal_status_changed",
        }
    }
}

/// Deliver a notification; failures are logged, never returned
pub fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.notify(&notification) {
        warn!(
            user_id = notification.user_id(),
            kind = notification.kind(),
            error = %e,
            "notification delivery failed"
        );
    }
}

/// Default notifier: records every event in the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            user_id = notification.user_id(),
            kind = notification.kind(),
            "notification: {:?}",
            notification
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    fn sample() -> Notification {
        Notification::WithdrawalRequested {
            user_id: 4,
            withdrawal_id: 1,
            amount: 12000,
        }
    }

    #[test]
    fn test_dispatch_delivers() {
        let notifier = RecordingNotifier::default();
        dispatch(&notifier, sample());
        assert_eq!(notifier.kinds(), vec!["withdrawal_requested"]);
    }

    #[test]
    fn test_dispatch_swallows_failures() {
        let notifier = RecordingNotifier::failing();
        dispatch(&notifier, sample());
        assert!(notifier.kinds().is_empty());
    }

    #[test]
    fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify(&sample()).is_ok());
    }
}
