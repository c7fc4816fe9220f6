//! Platform abstraction for the user-management service.
//!
//! The account manager is a thin client of a platform-provided
//! user-management subsystem. All platform-specific operations are
//! abstracted behind [`UserService`] so that a fake implementation can be
//! injected for tests and tooling:
//!
//! - [`UserService`] — account CRUD, icon storage, session switching, and
//!   the account-change event subscription
//! - [`AccountEventSink`] — callback interface the platform invokes on its
//!   own dispatch context
//!
//! The real service lives behind the vehicle's IPC transport and is out of
//! scope here; [`MemoryUserService`] is the in-memory implementation used
//! by unit tests and the developer CLI.

pub mod memory;

use std::sync::Arc;

use crate::avatar::Avatar;
use crate::error::PlatformResult;
use crate::events::AccountEvent;
use crate::types::{AccountId, AccountInfo};

// Re-export the memory implementation for tests and tooling.
pub use memory::MemoryUserService;

/// Token identifying one event subscription on a [`UserService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a subscription token from its raw value.
    ///
    /// Tokens are minted by [`UserService::subscribe`] implementations;
    /// callers only hand them back to [`UserService::unsubscribe`].
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this token.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Sink receiving raw platform account-change events.
///
/// Events are delivered on the platform's dispatch context for as long as
/// the sink is subscribed; there is no queuing and no replay of events
/// that occurred while unsubscribed.
pub trait AccountEventSink: Send + Sync {
    /// Called for every account-change broadcast.
    fn on_account_event(&self, event: AccountEvent);
}

/// The platform user-management service.
///
/// Provides account CRUD, icon storage, and current-session resolution.
/// The service is authoritative: callers resolve the current account per
/// call rather than caching it, so their view is always consistent with
/// the platform's at the instant of the call.
pub trait UserService: Send + Sync {
    /// The account the session currently runs as.
    fn current_account(&self) -> AccountInfo;

    /// All accounts on the device, in platform order.
    fn accounts(&self) -> Vec<AccountInfo>;

    /// Creates a new regular account with the given display name.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::AccountLimitReached`] when the platform
    /// refuses to create another account, or [`PlatformError::Remote`] if
    /// the call itself fails.
    ///
    /// [`PlatformError::AccountLimitReached`]: crate::PlatformError::AccountLimitReached
    /// [`PlatformError::Remote`]: crate::PlatformError::Remote
    fn create_account(&self, name: &str) -> PlatformResult<AccountInfo>;

    /// Creates a new guest account with the given display name.
    ///
    /// Guests are created lazily per "become a guest" action and are not
    /// reused across sessions.
    ///
    /// # Errors
    ///
    /// Same refusal conditions as [`UserService::create_account`].
    fn create_guest_account(&self, name: &str) -> PlatformResult<AccountInfo>;

    /// Removes the account with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::AccountNotFound`] for an unknown
    /// identifier and [`PlatformError::NotPermitted`] when the target is
    /// the system account or the session currently running.
    ///
    /// [`PlatformError::AccountNotFound`]: crate::PlatformError::AccountNotFound
    /// [`PlatformError::NotPermitted`]: crate::PlatformError::NotPermitted
    fn remove_account(&self, id: AccountId) -> PlatformResult<()>;

    /// Renames an account. No validation of the name content is
    /// performed; unknown identifiers are ignored.
    fn set_account_name(&self, id: AccountId, name: &str);

    /// The stored avatar for an account, if any, at its stored size.
    fn account_icon(&self, id: AccountId) -> Option<Avatar>;

    /// Switches the active session to the given account.
    ///
    /// The switch is an asynchronous platform effect; a successful return
    /// only means the request was issued.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::AccountNotFound`] for an unknown
    /// identifier and [`PlatformError::Remote`] if issuing the request
    /// fails.
    ///
    /// [`PlatformError::AccountNotFound`]: crate::PlatformError::AccountNotFound
    /// [`PlatformError::Remote`]: crate::PlatformError::Remote
    fn switch_session(&self, id: AccountId) -> PlatformResult<()>;

    /// Whether the platform is configured to destroy guest sessions on
    /// exit rather than persist them.
    fn guest_sessions_are_ephemeral(&self) -> bool;

    /// Subscribes a sink to account-change broadcasts.
    ///
    /// The sink receives events until the returned token is passed to
    /// [`UserService::unsubscribe`].
    fn subscribe(&self, sink: Arc<dyn AccountEventSink>) -> SubscriptionId;

    /// Cancels an event subscription. Unknown tokens are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}
