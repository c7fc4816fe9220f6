//! Account-change notifications.
//!
//! The platform broadcasts three event kinds. The account manager
//! coalesces them into a single "accounts changed" callback for its
//! registered observer, discarding the specific kind.

use crate::types::AccountId;

/// One account-change broadcast delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEvent {
    /// A new account was added.
    Added(AccountId),
    /// An account was removed.
    Removed(AccountId),
    /// An account's profile information changed.
    InfoChanged(AccountId),
}

impl AccountEvent {
    /// The account the event refers to.
    #[must_use]
    pub const fn account_id(self) -> AccountId {
        match self {
            Self::Added(id) | Self::Removed(id) | Self::InfoChanged(id) => id,
        }
    }
}

/// Observer for coalesced account-list changes.
///
/// The callback is invoked on the platform's dispatch context while the
/// observer is registered. Implementations must not perform long-running
/// work inline.
pub trait AccountsUpdateListener: Send + Sync {
    /// Called after any account was added, removed, or edited.
    fn on_accounts_update(&self);
}
