#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

//! Account lifecycle core for the car settings application.
//!
//! The crate has one job: be the façade between settings UI code and the
//! platform's user-management service. [`AccountManager`] exposes the
//! account operations (create, remove, switch, rename, icons, guest
//! sessions) and a single-slot observer registration for account-change
//! notifications; [`platform::UserService`] is the injected abstraction
//! over the platform service, with an in-memory implementation for tests
//! and tooling.

mod avatar;
pub use avatar::*;

mod error;
pub use error::*;

mod events;
pub use events::*;

mod manager;
pub use manager::*;

pub mod platform;

mod types;
pub use types::*;
