//! In-process [`RemoteStore`] used when no cloud backend is configured and in
//! tests. Accounts and snapshots live only as long as the value does.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use shared::{AuthCredentials, SignUpRequest, TrackerSnapshot, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::traits::RemoteStore;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Default)]
struct RemoteState {
    /// Keyed by lowercased email
    accounts: HashMap<String, (User, String)>,
    snapshots: HashMap<String, TrackerSnapshot>,
}

#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    state: Mutex<RemoteState>,
    offline: AtomicBool,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing connectivity; every call fails while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn connect(&self) -> Result<MutexGuard<'_, RemoteState>> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("Remote store is unreachable");
        }
        self.state.lock().map_err(|_| anyhow!("Remote store lock poisoned"))
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn sign_in(&self, credentials: &AuthCredentials) -> Result<User> {
        let state = self.connect()?;
        match state.accounts.get(&credentials.email.trim().to_lowercase()) {
            Some((user, password)) if *password == credentials.password => {
                debug!("Signed in {}", user.email);
                Ok(user.clone())
            }
            _ => bail!("Invalid email or password"),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<User> {
        let email = request.email.trim().to_lowercase();
        if !email.contains('@') {
            bail!("Invalid email address: {}", request.email);
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            bail!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
        }

        let mut state = self.connect()?;
        if state.accounts.contains_key(&email) {
            bail!("An account already exists for {}", email);
        }

        let user = User {
            id: format!("user::{}", Uuid::new_v4()),
            email: email.clone(),
            name: request.name.trim().to_string(),
            created_at: Utc::now().to_rfc3339(),
            last_sync_at: None,
        };
        state.accounts.insert(email, (user.clone(), request.password.clone()));
        info!("Created remote account {}", user.id);
        Ok(user)
    }

    async fn download_on_sign_in(&self, user_id: &str) -> Result<Option<TrackerSnapshot>> {
        let state = self.connect()?;
        Ok(state.snapshots.get(user_id).cloned())
    }

    async fn sync_data(&self, user_id: &str, snapshot: &TrackerSnapshot) -> Result<TrackerSnapshot> {
        let mut state = self.connect()?;
        if !state.accounts.values().any(|(user, _)| user.id == user_id) {
            bail!("Unknown user: {}", user_id);
        }

        let stored = snapshot.clone();
        state.snapshots.insert(user_id.to_string(), stored.clone());
        let synced_at = Utc::now().to_rfc3339();
        if let Some((user, _)) = state.accounts.values_mut().find(|(user, _)| user.id == user_id) {
            user.last_sync_at = Some(synced_at);
        }
        debug!(
            "Stored snapshot v{} for {} ({} lessons)",
            stored.version,
            user_id,
            stored.lessons.len()
        );
        Ok(stored)
    }
}
