//! Core type definitions for the account lifecycle core.
//!
//! Accounts are owned by the platform user-management service: identifiers
//! are minted there and are immutable once assigned. The types here are
//! plain value records of what the platform reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;

// Identifiers

/// Platform-assigned numeric identifier of an account.
///
/// Identifiers are stable for the lifetime of an account and are never
/// minted by this crate; they are handed back by the platform on account
/// creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u32);

impl AccountId {
    /// The well-known system/admin account identifier.
    ///
    /// Exactly one account carries this identifier. It is always present,
    /// can never be removed, and is the fallback session target when the
    /// active account is removed.
    pub const SYSTEM: Self = Self(0);

    /// Creates an `AccountId` from its raw numeric value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Whether this is the system/admin account identifier.
    #[must_use]
    pub const fn is_system(self) -> bool {
        self.0 == Self::SYSTEM.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Account records

/// The kind of an account.
///
/// Guest accounts are transient. Whether a guest session is additionally
/// *ephemeral* (destroyed on session exit rather than persisted) is a
/// platform-wide configuration bit, not a per-account flag; see
/// [`UserService::guest_sessions_are_ephemeral`].
///
/// [`UserService::guest_sessions_are_ephemeral`]: crate::platform::UserService::guest_sessions_are_ephemeral
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// An ordinary persistent account.
    Regular,
    /// A transient guest account.
    Guest,
}

/// One user profile on the device, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Platform-assigned identifier; immutable once assigned.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Whether this is a regular or a guest account.
    pub kind: AccountKind,
}

impl AccountInfo {
    /// Creates an account record.
    #[must_use]
    pub fn new(id: AccountId, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }

    /// Whether this account is a guest account.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self.kind, AccountKind::Guest)
    }

    /// Whether this account is the system/admin account.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.id.is_system()
    }
}

impl fmt::Display for AccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}
