//! In-memory implementation of the platform user-management service.
//!
//! This implementation backs unit tests and the developer CLI. It is NOT
//! an integration with the vehicle platform: session switches apply
//! immediately instead of asynchronously, and events are delivered on the
//! caller's thread.

// Lock poisoning aborts the test that caused it; unwraps are fine here.
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::avatar::Avatar;
use crate::error::{PlatformError, PlatformResult};
use crate::events::AccountEvent;
use crate::types::{AccountId, AccountInfo, AccountKind};

use super::{AccountEventSink, SubscriptionId, UserService};

/// Display name of the seeded system account.
const SYSTEM_ACCOUNT_NAME: &str = "Owner";

/// First identifier handed out for created accounts.
const FIRST_MINTED_ID: u32 = 10;

// =============================================================================
// Call journal
// =============================================================================

/// Record of one mutating platform call, in issue order.
///
/// The journal records calls as they are issued, including calls the
/// service then refuses, so tests can assert ordering properties such as
/// "switch issued strictly before delete".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCall {
    /// `create_account` was issued.
    CreateAccount,
    /// `create_guest_account` was issued.
    CreateGuestAccount,
    /// `remove_account` was issued for this identifier.
    RemoveAccount(AccountId),
    /// `set_account_name` was issued for this identifier.
    SetAccountName(AccountId),
    /// `switch_session` was issued for this identifier.
    SwitchSession(AccountId),
}

// =============================================================================
// Snapshot
// =============================================================================

/// Serializable snapshot of the in-memory platform state.
///
/// Avatars are not part of the snapshot; they are session-local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// All accounts, in platform order.
    pub accounts: Vec<AccountInfo>,
    /// Identifier of the active account.
    pub current: AccountId,
    /// Whether guest sessions are destroyed on exit.
    pub guests_ephemeral: bool,
    /// Next identifier to mint.
    pub next_id: u32,
    /// Maximum number of accounts, if limited.
    #[serde(default)]
    pub account_limit: Option<usize>,
}

// =============================================================================
// MemoryUserService
// =============================================================================

/// Mutable service state behind one lock.
struct State {
    /// All accounts, in creation order.
    accounts: Vec<AccountInfo>,
    /// Stored avatars by account.
    icons: HashMap<AccountId, Avatar>,
    /// Identifier of the active account.
    current: AccountId,
    /// Next identifier to mint.
    next_id: u32,
    /// Maximum number of accounts, if limited.
    account_limit: Option<usize>,
    /// Whether guest sessions are destroyed on exit.
    guests_ephemeral: bool,
}

/// In-memory [`UserService`] for tests and tooling.
///
/// Seeded with the system account as the active session. Builder-style
/// configuration:
///
/// ```
/// use car_settings_core::platform::MemoryUserService;
/// use car_settings_core::AccountKind;
///
/// let service = MemoryUserService::new()
///     .with_account_limit(4)
///     .with_guest_sessions_ephemeral(true)
///     .with_seeded_account("Alex", AccountKind::Regular);
/// ```
pub struct MemoryUserService {
    /// Account and configuration state.
    state: RwLock<State>,
    /// Subscribed event sinks by token.
    sinks: Mutex<HashMap<u64, Arc<dyn AccountEventSink>>>,
    /// Source for subscription tokens.
    next_subscription: AtomicU64,
    /// Issued mutating calls, in order.
    journal: Mutex<Vec<PlatformCall>>,
}

impl MemoryUserService {
    /// Creates a service holding only the system account, which is also
    /// the active session.
    #[must_use]
    pub fn new() -> Self {
        let system = AccountInfo::new(AccountId::SYSTEM, SYSTEM_ACCOUNT_NAME, AccountKind::Regular);
        Self {
            state: RwLock::new(State {
                accounts: vec![system],
                icons: HashMap::new(),
                current: AccountId::SYSTEM,
                next_id: FIRST_MINTED_ID,
                account_limit: None,
                guests_ephemeral: false,
            }),
            sinks: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Restores a service from a [`Snapshot`].
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let service = Self::new();
        {
            let mut state = service.state.write().unwrap();
            state.accounts = snapshot.accounts;
            state.current = snapshot.current;
            state.guests_ephemeral = snapshot.guests_ephemeral;
            state.next_id = snapshot.next_id;
            state.account_limit = snapshot.account_limit;
        }
        service
    }

    /// Captures the current state as a [`Snapshot`].
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read().unwrap();
        Snapshot {
            accounts: state.accounts.clone(),
            current: state.current,
            guests_ephemeral: state.guests_ephemeral,
            next_id: state.next_id,
            account_limit: state.account_limit,
        }
    }

    /// Configures whether guest sessions are ephemeral.
    #[must_use]
    pub fn with_guest_sessions_ephemeral(self, ephemeral: bool) -> Self {
        self.state.write().unwrap().guests_ephemeral = ephemeral;
        self
    }

    /// Caps the number of accounts; further creations are refused with
    /// [`PlatformError::AccountLimitReached`].
    #[must_use]
    pub fn with_account_limit(self, limit: usize) -> Self {
        self.state.write().unwrap().account_limit = Some(limit);
        self
    }

    /// Seeds an account without emitting an event or journal entry.
    #[must_use]
    pub fn with_seeded_account(self, name: &str, kind: AccountKind) -> Self {
        {
            let mut state = self.state.write().unwrap();
            let id = AccountId::new(state.next_id);
            state.next_id += 1;
            state.accounts.push(AccountInfo::new(id, name, kind));
        }
        self
    }

    /// Stores an avatar for an account.
    pub fn set_icon(&self, id: AccountId, avatar: Avatar) {
        self.state.write().unwrap().icons.insert(id, avatar);
    }

    /// The mutating calls issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.journal.lock().unwrap().clone()
    }

    /// Clears the call journal.
    pub fn clear_calls(&self) {
        self.journal.lock().unwrap().clear();
    }

    /// Appends one journal entry.
    fn record(&self, call: PlatformCall) {
        self.journal.lock().unwrap().push(call);
    }

    /// Delivers an event to every subscribed sink, outside the state lock.
    fn emit(&self, event: AccountEvent) {
        let sinks: Vec<Arc<dyn AccountEventSink>> =
            self.sinks.lock().unwrap().values().cloned().collect();
        for sink in sinks {
            sink.on_account_event(event);
        }
    }

    /// Mints the next account identifier and appends the account.
    fn insert_account(&self, name: &str, kind: AccountKind) -> PlatformResult<AccountInfo> {
        let mut state = self.state.write().unwrap();
        if let Some(limit) = state.account_limit {
            if state.accounts.len() >= limit {
                return Err(PlatformError::AccountLimitReached);
            }
        }
        let id = AccountId::new(state.next_id);
        state.next_id += 1;
        let account = AccountInfo::new(id, name, kind);
        state.accounts.push(account.clone());
        Ok(account)
    }
}

impl Default for MemoryUserService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryUserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUserService").finish_non_exhaustive()
    }
}

impl UserService for MemoryUserService {
    fn current_account(&self) -> AccountInfo {
        let state = self.state.read().unwrap();
        state
            .accounts
            .iter()
            .find(|account| account.id == state.current)
            .or_else(|| state.accounts.iter().find(|account| account.is_system()))
            .cloned()
            .unwrap_or_else(|| {
                AccountInfo::new(AccountId::SYSTEM, SYSTEM_ACCOUNT_NAME, AccountKind::Regular)
            })
    }

    fn accounts(&self) -> Vec<AccountInfo> {
        self.state.read().unwrap().accounts.clone()
    }

    fn create_account(&self, name: &str) -> PlatformResult<AccountInfo> {
        self.record(PlatformCall::CreateAccount);
        let account = self.insert_account(name, AccountKind::Regular)?;
        self.emit(AccountEvent::Added(account.id));
        Ok(account)
    }

    fn create_guest_account(&self, name: &str) -> PlatformResult<AccountInfo> {
        self.record(PlatformCall::CreateGuestAccount);
        let account = self.insert_account(name, AccountKind::Guest)?;
        self.emit(AccountEvent::Added(account.id));
        Ok(account)
    }

    fn remove_account(&self, id: AccountId) -> PlatformResult<()> {
        self.record(PlatformCall::RemoveAccount(id));
        {
            let mut state = self.state.write().unwrap();
            if id.is_system() || id == state.current {
                return Err(PlatformError::NotPermitted { id });
            }
            let Some(position) = state.accounts.iter().position(|account| account.id == id)
            else {
                return Err(PlatformError::AccountNotFound { id });
            };
            state.accounts.remove(position);
            state.icons.remove(&id);
        }
        self.emit(AccountEvent::Removed(id));
        Ok(())
    }

    fn set_account_name(&self, id: AccountId, name: &str) {
        self.record(PlatformCall::SetAccountName(id));
        let renamed = {
            let mut state = self.state.write().unwrap();
            match state.accounts.iter_mut().find(|account| account.id == id) {
                Some(account) => {
                    account.name = name.to_owned();
                    true
                }
                None => false,
            }
        };
        if renamed {
            self.emit(AccountEvent::InfoChanged(id));
        }
    }

    fn account_icon(&self, id: AccountId) -> Option<Avatar> {
        self.state.read().unwrap().icons.get(&id).cloned()
    }

    fn switch_session(&self, id: AccountId) -> PlatformResult<()> {
        self.record(PlatformCall::SwitchSession(id));
        let mut state = self.state.write().unwrap();
        if !state.accounts.iter().any(|account| account.id == id) {
            return Err(PlatformError::AccountNotFound { id });
        }
        // The real platform applies the switch asynchronously; here it
        // takes effect immediately.
        state.current = id;
        Ok(())
    }

    fn guest_sessions_are_ephemeral(&self) -> bool {
        self.state.read().unwrap().guests_ephemeral
    }

    fn subscribe(&self, sink: Arc<dyn AccountEventSink>) -> SubscriptionId {
        let token = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.sinks.lock().unwrap().insert(token, sink);
        SubscriptionId::new(token)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.sinks.lock().unwrap().remove(&id.as_u64());
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Sink that counts deliveries and remembers the last event.
    struct CountingSink {
        /// Number of events delivered.
        count: AtomicUsize,
        /// Most recent event, if any.
        last: Mutex<Option<AccountEvent>>,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                count: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl AccountEventSink for CountingSink {
        fn on_account_event(&self, event: AccountEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(event);
        }
    }

    #[test]
    fn starts_with_system_account_active() {
        let service = MemoryUserService::new();
        let current = service.current_account();
        assert!(current.is_system());
        assert_eq!(service.accounts().len(), 1);
    }

    #[test]
    fn create_assigns_fresh_identifiers() {
        let service = MemoryUserService::new();
        let a = service.create_account("A").unwrap();
        let b = service.create_account("B").unwrap();
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_system());
        assert_eq!(service.accounts().len(), 3);
    }

    #[test]
    fn create_refused_at_limit() {
        let service = MemoryUserService::new().with_account_limit(2);
        service.create_account("A").unwrap();
        let refused = service.create_account("B");
        assert_eq!(refused, Err(PlatformError::AccountLimitReached));
    }

    #[test]
    fn remove_refuses_system_and_current() {
        let service = MemoryUserService::new().with_seeded_account("A", AccountKind::Regular);
        let a = service.accounts()[1].clone();

        assert!(matches!(
            service.remove_account(AccountId::SYSTEM),
            Err(PlatformError::NotPermitted { .. })
        ));

        service.switch_session(a.id).unwrap();
        assert!(matches!(
            service.remove_account(a.id),
            Err(PlatformError::NotPermitted { .. })
        ));

        service.switch_session(AccountId::SYSTEM).unwrap();
        service.remove_account(a.id).unwrap();
        assert_eq!(service.accounts().len(), 1);
    }

    #[test]
    fn remove_unknown_account_fails() {
        let service = MemoryUserService::new();
        let id = AccountId::new(99);
        assert_eq!(
            service.remove_account(id),
            Err(PlatformError::AccountNotFound { id })
        );
    }

    #[test]
    fn rename_updates_record_and_emits() {
        let service = MemoryUserService::new().with_seeded_account("A", AccountKind::Regular);
        let sink = Arc::new(CountingSink::new());
        service.subscribe(sink.clone());

        let a = service.accounts()[1].clone();
        service.set_account_name(a.id, "Alexandra");

        assert_eq!(service.accounts()[1].name, "Alexandra");
        assert_eq!(sink.count(), 1);
        assert_eq!(
            *sink.last.lock().unwrap(),
            Some(AccountEvent::InfoChanged(a.id))
        );
    }

    #[test]
    fn rename_unknown_account_is_silent() {
        let service = MemoryUserService::new();
        let sink = Arc::new(CountingSink::new());
        service.subscribe(sink.clone());

        service.set_account_name(AccountId::new(404), "Nobody");
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn events_stop_after_unsubscribe() {
        let service = MemoryUserService::new();
        let sink = Arc::new(CountingSink::new());
        let token = service.subscribe(sink.clone());

        service.create_account("A").unwrap();
        assert_eq!(sink.count(), 1);

        service.unsubscribe(token);
        service.create_account("B").unwrap();
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn journal_records_issue_order() {
        let service = MemoryUserService::new().with_seeded_account("A", AccountKind::Regular);
        let a = service.accounts()[1].clone();

        service.switch_session(a.id).unwrap();
        service.switch_session(AccountId::SYSTEM).unwrap();
        service.remove_account(a.id).unwrap();

        assert_eq!(
            service.calls(),
            vec![
                PlatformCall::SwitchSession(a.id),
                PlatformCall::SwitchSession(AccountId::SYSTEM),
                PlatformCall::RemoveAccount(a.id),
            ]
        );
    }

    #[test]
    fn snapshot_round_trips() {
        let service = MemoryUserService::new()
            .with_account_limit(6)
            .with_guest_sessions_ephemeral(true)
            .with_seeded_account("A", AccountKind::Regular)
            .with_seeded_account("G", AccountKind::Guest);
        let a = service.accounts()[1].clone();
        service.switch_session(a.id).unwrap();

        let json = serde_json::to_string(&service.snapshot()).unwrap();
        let restored = MemoryUserService::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.accounts(), service.accounts());
        assert_eq!(restored.current_account().id, a.id);
        assert!(restored.guest_sessions_are_ephemeral());

        // Minting continues where the snapshot left off.
        let fresh = restored.create_account("B").unwrap();
        assert!(service.accounts().iter().all(|acc| acc.id != fresh.id));
    }

    #[test]
    fn icons_are_stored_per_account() {
        let service = MemoryUserService::new();
        assert!(service.account_icon(AccountId::SYSTEM).is_none());

        service.set_icon(AccountId::SYSTEM, Avatar::solid(8, 8, [1, 2, 3, 4]));
        let icon = service.account_icon(AccountId::SYSTEM).unwrap();
        assert_eq!(icon.width(), 8);
    }
}
