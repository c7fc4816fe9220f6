//! The account lifecycle façade.
//!
//! [`AccountManager`] is the single point of contact between UI code and
//! the platform's user-management subsystem. It translates UI intents
//! (create/remove/switch/rename/fetch-icon) into [`UserService`] calls
//! and normalizes the handful of domain rules the platform does not
//! already enforce:
//!
//! - the system account can never be removed;
//! - removing the active account first switches the session to the
//!   system account, because the platform forbids deleting the session
//!   it is presently running as;
//! - switching to a guest account lazily creates a fresh guest instead
//!   of reusing one;
//! - when guest sessions are ephemeral, switching away from a running
//!   guest is suppressed (the UI presents a guest-exit confirmation
//!   instead).
//!
//! No failure propagates out of the public operations: platform refusals
//! and remote errors degrade to a no-op plus a warning log.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, warn};

use crate::avatar::{Avatar, ICON_SIZE};
use crate::error::PlatformError;
use crate::events::{AccountEvent, AccountsUpdateListener};
use crate::platform::{AccountEventSink, SubscriptionId, UserService};
use crate::types::{AccountId, AccountInfo};

/// Default display name for newly created accounts.
const NEW_ACCOUNT_NAME: &str = "New User";

/// Default display name for guest accounts.
const GUEST_NAME: &str = "Guest";

// =============================================================================
// Labels
// =============================================================================

/// Display names the manager hands to the platform on account creation.
///
/// These are UI resource strings in the settings application; the
/// defaults match the stock ones.
#[derive(Debug, Clone)]
pub struct Labels {
    /// Name given to accounts created by [`AccountManager::create_account`].
    pub new_account_name: String,
    /// Name given to guests created by [`AccountManager::switch_to_guest`].
    pub guest_name: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            new_account_name: NEW_ACCOUNT_NAME.to_owned(),
            guest_name: GUEST_NAME.to_owned(),
        }
    }
}

// =============================================================================
// CreateOutcome
// =============================================================================

/// Result of [`AccountManager::create_account`].
///
/// A refusal is an ordinary outcome (most likely the account-count limit),
/// not an error: it has already been logged and carries no obligation
/// beyond informing the user.
#[must_use]
#[derive(Debug)]
pub enum CreateOutcome {
    /// The platform created the account.
    Created(AccountInfo),
    /// The platform refused; no account was created.
    Refused(PlatformError),
}

impl CreateOutcome {
    /// The created account, if any.
    #[must_use]
    pub fn created(self) -> Option<AccountInfo> {
        match self {
            Self::Created(account) => Some(account),
            Self::Refused(_) => None,
        }
    }

    /// Whether the platform refused the creation.
    #[must_use]
    pub const fn is_refused(&self) -> bool {
        matches!(self, Self::Refused(_))
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Whether the account is the system/admin account.
#[must_use]
pub fn is_system_account(account: &AccountInfo) -> bool {
    account.is_system()
}

/// Whether the account may be removed. True for every account except the
/// system account.
#[must_use]
pub fn can_be_removed(account: &AccountInfo) -> bool {
    !is_system_account(account)
}

// =============================================================================
// AccountManager
// =============================================================================

/// Account lifecycle façade over a platform [`UserService`].
///
/// The manager holds no account state of its own: the current account is
/// resolved live from the platform on every call, so it is always
/// consistent with the platform's view at the instant of the call. The
/// only state is the single observer-registration slot.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use car_settings_core::platform::MemoryUserService;
/// use car_settings_core::AccountManager;
///
/// let service = Arc::new(MemoryUserService::new());
/// let manager = AccountManager::new(service);
///
/// let created = manager.create_account().created().unwrap();
/// manager.switch_to_account(&created);
/// assert!(manager.is_current_account(&created));
/// ```
pub struct AccountManager<U: UserService> {
    /// The platform user-management service.
    service: Arc<U>,
    /// Display names for created accounts.
    labels: Labels,
    /// Platform subscription backing the registered observer, if any.
    subscription: Mutex<Option<SubscriptionId>>,
}

impl<U: UserService> AccountManager<U> {
    /// Creates a manager with the stock display-name labels.
    #[must_use]
    pub fn new(service: Arc<U>) -> Self {
        Self::with_labels(service, Labels::default())
    }

    /// Creates a manager with custom display-name labels.
    #[must_use]
    pub fn with_labels(service: Arc<U>, labels: Labels) -> Self {
        Self {
            service,
            labels,
            subscription: Mutex::new(None),
        }
    }

    /// The account the session currently runs as, resolved live from the
    /// platform.
    #[must_use]
    pub fn current_account(&self) -> AccountInfo {
        self.service.current_account()
    }

    /// Renames an account. No validation of the name content is
    /// performed here.
    pub fn set_account_name(&self, account: &AccountInfo, name: &str) {
        self.service.set_account_name(account.id, name);
    }

    /// All accounts except the current one, in platform order.
    #[must_use]
    pub fn other_accounts(&self) -> Vec<AccountInfo> {
        let current = self.service.current_account().id;
        self.service
            .accounts()
            .into_iter()
            .filter(|account| account.id != current)
            .collect()
    }

    /// The avatar for an account, scaled to [`ICON_SIZE`].
    ///
    /// Falls back silently to [`Avatar::placeholder`] when the platform
    /// has no stored image for the account.
    #[must_use]
    pub fn account_icon(&self, account: &AccountInfo) -> Avatar {
        self.service
            .account_icon(account.id)
            .map_or_else(Avatar::placeholder, |avatar| avatar.scaled(ICON_SIZE))
    }

    /// Creates a new account with the default display name.
    ///
    /// On platform refusal (e.g. the account-count limit is reached) the
    /// refusal is logged and returned as [`CreateOutcome::Refused`]; no
    /// account exists in that case.
    pub fn create_account(&self) -> CreateOutcome {
        match self.service.create_account(&self.labels.new_account_name) {
            Ok(account) => CreateOutcome::Created(account),
            Err(reason) => {
                warn!(%reason, "cannot create account");
                CreateOutcome::Refused(reason)
            }
        }
    }

    /// Tries to remove an account. The system account cannot be removed.
    ///
    /// If the target is the current account, the session is first
    /// switched to the system account and the removal is issued after the
    /// switch; the platform forbids deleting the running session.
    ///
    /// Returns whether the account was removed.
    #[must_use = "a false return means the account still exists"]
    pub fn remove_account(&self, account: &AccountInfo) -> bool {
        if account.is_system() {
            warn!(id = %account.id, "system account cannot be removed");
            return false;
        }

        if account.id == self.service.current_account().id {
            self.issue_switch(AccountId::SYSTEM);
        }

        match self.service.remove_account(account.id) {
            Ok(()) => true,
            Err(reason) => {
                warn!(id = %account.id, %reason, "cannot remove account");
                false
            }
        }
    }

    /// Whether the current account is the system/admin account.
    #[must_use]
    pub fn current_is_system_account(&self) -> bool {
        self.service.current_account().is_system()
    }

    /// Whether the given account is the one currently logged in.
    #[must_use]
    pub fn is_current_account(&self, account: &AccountInfo) -> bool {
        self.service.current_account().id == account.id
    }

    /// Switches (logs in) to another account.
    ///
    /// A no-op when the target is already current. A guest target is
    /// redirected to [`AccountManager::switch_to_guest`] instead of a
    /// direct switch. When the platform destroys guest sessions on exit
    /// and the current session is itself a guest, the switch is
    /// suppressed entirely; the UI brings up the guest-exit confirmation
    /// in that case.
    pub fn switch_to_account(&self, account: &AccountInfo) {
        if account.id == self.service.current_account().id {
            return;
        }

        if account.is_guest() {
            self.switch_to_guest();
            return;
        }

        if self.service.guest_sessions_are_ephemeral()
            && self.service.current_account().is_guest()
        {
            return;
        }

        self.issue_switch(account.id);
    }

    /// Creates a fresh guest account and switches into it.
    ///
    /// Guests are never reused: every "become a guest" action creates a
    /// new one. If guest creation is refused, a warning is logged and no
    /// switch is issued.
    pub fn switch_to_guest(&self) {
        match self.service.create_guest_account(&self.labels.guest_name) {
            Ok(guest) => self.issue_switch(guest.id),
            Err(reason) => warn!(%reason, "cannot create guest account"),
        }
    }

    /// Registers the observer for account-list changes.
    ///
    /// The registration slot holds at most one observer: registering a
    /// new one silently discards any prior registration (last writer
    /// wins). The observer only sees events that occur while registered;
    /// the three platform event kinds are coalesced into one "accounts
    /// changed" callback.
    pub fn register_update_listener(&self, listener: Arc<dyn AccountsUpdateListener>) {
        let forwarder = Arc::new(Forwarder { listener });
        let mut slot = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            self.service.unsubscribe(previous);
        }
        *slot = Some(self.service.subscribe(forwarder));
    }

    /// Unregisters the observer, if any. No further callbacks are
    /// delivered afterwards.
    pub fn unregister_update_listener(&self) {
        let mut slot = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            self.service.unsubscribe(previous);
        }
    }

    /// Issues a session switch, fire-and-forget. The switch effect is
    /// asynchronous at the platform level; a failure to issue it is
    /// logged and not reported to the caller.
    fn issue_switch(&self, id: AccountId) {
        if let Err(reason) = self.service.switch_session(id) {
            error!(%id, %reason, "cannot switch session");
        }
    }
}

impl<U: UserService> Drop for AccountManager<U> {
    fn drop(&mut self) {
        self.unregister_update_listener();
    }
}

impl<U: UserService> std::fmt::Debug for AccountManager<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountManager").finish_non_exhaustive()
    }
}

/// Bridges platform events to the registered observer, discarding the
/// specific event kind.
struct Forwarder {
    /// The registered observer.
    listener: Arc<dyn AccountsUpdateListener>,
}

impl AccountEventSink for Forwarder {
    fn on_account_event(&self, _event: AccountEvent) {
        self.listener.on_accounts_update();
    }
}

// =============================================================================
// Tests
// =============================================================================
