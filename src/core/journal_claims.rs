//! Journal id ownership
//!
//! Journal rows name order and withdrawal ids explicitly, and those ids are
//! global. The first row that creates an id claims it for that row's user;
//! later rows from other users naming the id are refused before they reach
//! the platform. Claims are taken in journal order, ahead of any per-user
//! partitioning, so both replay strategies refuse the same rows.
//!
//! A claim holds even when the claiming row is itself rejected by the
//! ledger (for example a withdrawal the wallet cannot cover).

use crate::types::{CommandKind, JournalCommand, LedgerError, UserId};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RecordKind {
    Order,
    Withdrawal,
}

impl RecordKind {
    fn as_str(self) -> &'static str {
        match self {
            RecordKind::Order => "order",
            RecordKind::Withdrawal => "withdrawal",
        }
    }
}

/// Owners of the ids created so far in one journal
#[derive(Debug, Default)]
pub struct JournalClaims {
    owners: HashMap<(RecordKind, u64), UserId>,
}

impl JournalClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `command` against earlier claims, claiming any id it creates
    ///
    /// # Returns
    ///
    /// * `Ok(())` - the command may be applied
    /// * `Err(LedgerError::Duplicate)` - it creates an id another user claimed
    /// * `Err(LedgerError::NotFound)` - it acts on an id another user claimed
    pub fn admit(&mut self, command: &JournalCommand) -> Result<(), LedgerError> {
        let user = command.user;
        let (kind, id, creates) = match &command.kind {
            CommandKind::RegisterOrder { order_id, .. } => (RecordKind::Order, *order_id, true),
            CommandKind::PayOrder { order_id } | CommandKind::OrderStatus { order_id, .. } => {
                (RecordKind::Order, *order_id, false)
            }
            CommandKind::Withdraw { withdrawal_id, .. } => {
                (RecordKind::Withdrawal, *withdrawal_id, true)
            }
            CommandKind::WithdrawalStatus { withdrawal_id, .. } => {
                (RecordKind::Withdrawal, *withdrawal_id, false)
            }
            _ => return Ok(()),
        };

        let owner = if creates {
            *self.owners.entry((kind, id)).or_insert(user)
        } else {
            match self.owners.get(&(kind, id)) {
                Some(owner) => *owner,
                None => return Ok(()),
            }
        };

        if owner == user {
            return Ok(());
        }
        debug!(kind = kind.as_str(), id, owner, user, "journal id held by another user");
        if creates {
            Err(LedgerError::duplicate(kind.as_str(), id))
        } else {
            Err(LedgerError::not_found(kind.as_str(), id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn withdraw(user: UserId, id: u64) -> JournalCommand {
        JournalCommand {
            user,
            kind: CommandKind::Withdraw {
                withdrawal_id: id,
                amount: 100,
                payout_method_id: 7,
                user_note: None,
            },
        }
    }

    fn order(user: UserId, id: u64) -> JournalCommand {
        JournalCommand {
            user,
            kind: CommandKind::RegisterOrder {
                order_id: id,
                landed_cost: 100,
                store: "store".to_string(),
            },
        }
    }

    fn pay(user: UserId, id: u64) -> JournalCommand {
        JournalCommand {
            user,
            kind: CommandKind::PayOrder { order_id: id },
        }
    }

    #[test]
    fn test_first_creator_keeps_the_id() {
        let mut claims = JournalClaims::new();

        assert!(claims.admit(&withdraw(1, 5)).is_ok());
        assert_eq!(
            claims.admit(&withdraw(2, 5)).unwrap_err(),
            LedgerError::duplicate("withdrawal", 5)
        );
        // Same owner passes through; the ledger decides
        assert!(claims.admit(&withdraw(1, 5)).is_ok());
    }

    #[test]
    fn test_order_and_withdrawal_ids_are_separate() {
        let mut claims = JournalClaims::new();

        claims.admit(&withdraw(1, 9)).unwrap();
        assert!(claims.admit(&order(2, 9)).is_ok());
    }

    #[rstest]
    #[case::claimed_elsewhere(true, Err(LedgerError::not_found("order", 3)))]
    #[case::unclaimed(false, Ok(()))]
    fn test_acting_on_ids(#[case] claimed: bool, #[case] expected: Result<(), LedgerError>) {
        let mut claims = JournalClaims::new();
        if claimed {
            claims.admit(&order(1, 3)).unwrap();
        }

        assert_eq!(claims.admit(&pay(2, 3)), expected);
        // Acting never claims
        assert_eq!(claims.admit(&order(2, 3)).is_ok(), !claimed);
    }

    #[test]
    fn test_wallet_commands_are_always_admitted() {
        let mut claims = JournalClaims::new();
        let open = JournalCommand {
            user: 4,
            kind: CommandKind::Open { opening_balance: 10 },
        };
        assert!(claims.admit(&open).is_ok());
    }
}
