//! # Storage Layer
//!
//! Persistence for the tracker lives behind the traits in [`traits`]: the
//! local JSON data directory implements [`TrackerStorage`] and
//! [`SettingsStorage`], and any cloud backend implements [`RemoteStore`].
//! The domain layer never touches files directly.

pub mod json;
pub mod remote;
pub mod traits;

pub use json::{JsonConnection, JsonTrackerRepository, SettingsRepository};
pub use remote::InMemoryRemoteStore;
pub use traits::{RemoteStore, SaveOutcome, SettingsStorage, StoredCollections, TrackerStorage};
