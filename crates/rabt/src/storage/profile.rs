//! User identity and preferences on top of a [`KeyValueStore`].

use std::collections::BTreeMap;
use std::sync::Arc;

use derive_getters::Getters;
use rabt_core::{CompletionReport, Tier};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument, warn};

use super::error::StorageError;
use super::store::KeyValueStore;

/// Key of the JSON user record.
pub const USER_KEY: &str = "rabt_user";

/// Key of the mute flag (`"true"` / `"false"`).
pub const MUTED_KEY: &str = "rabt_muted";

/// Name given to players who log in without one.
pub const DEFAULT_USERNAME: &str = "لاعب";

const USER_ID_LEN: usize = 9;

/// The persisted player record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Random 9-character id.
    user_id: String,
    /// Display name.
    username: String,
    /// Highest tier reached.
    #[serde(rename = "currentLevel")]
    current_tier: Tier,
    /// Best completion time per tier in seconds; 0 means unset.
    #[serde(default)]
    best_times: BTreeMap<Tier, u64>,
}

impl UserProfile {
    /// Creates a fresh profile at the first tier with no best times.
    #[instrument]
    pub fn new(user_id: String, username: String) -> Self {
        Self {
            user_id,
            username,
            current_tier: Tier::Beginner,
            best_times: Tier::iter().map(|tier| (tier, 0)).collect(),
        }
    }

    /// Best time for `tier`, if one was recorded.
    #[instrument(skip(self))]
    pub fn best_time(&self, tier: Tier) -> Option<u64> {
        self.best_times.get(&tier).copied().filter(|secs| *secs > 0)
    }

    /// Folds a completed level into the record. Returns whether anything changed.
    #[instrument(skip(self, report), fields(level = %report.level()))]
    pub fn record(&mut self, report: &CompletionReport) -> bool {
        let tier = report.level().tier();
        let secs = *report.elapsed_secs();
        let mut changed = false;

        if secs > 0 && self.best_time(tier).is_none_or(|best| secs < best) {
            self.best_times.insert(tier, secs);
            info!(tier = %tier, secs, "New best time");
            changed = true;
        }

        let reached = report.next().map_or(tier, |next| next.tier());
        if reached > self.current_tier {
            self.current_tier = reached;
            changed = true;
        }
        changed
    }
}

/// Service layer for the player's identity and preferences.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileService {
    /// Creates a new profile service backed by the given store.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        info!("Creating ProfileService");
        Self { store }
    }

    /// Returns the underlying store.
    #[instrument(skip(self))]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Loads the logged-in user. A malformed record reads as logged out.
    #[instrument(skip(self))]
    pub fn load_user(&self) -> Result<Option<UserProfile>, StorageError> {
        let Some(raw) = self.store.get(USER_KEY)? else {
            debug!("No user record");
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "Malformed user record, treating as logged out");
                Ok(None)
            }
        }
    }

    /// Creates and saves a new user. A blank name becomes [`DEFAULT_USERNAME`].
    #[instrument(skip(self, rng))]
    pub fn login<R: Rng + ?Sized>(
        &self,
        username: &str,
        rng: &mut R,
    ) -> Result<UserProfile, StorageError> {
        let username = match username.trim() {
            "" => DEFAULT_USERNAME.to_string(),
            name => name.to_string(),
        };
        let user = UserProfile::new(generate_user_id(rng), username);
        self.save_user(&user)?;
        info!(user_id = %user.user_id, username = %user.username, "User logged in");
        Ok(user)
    }

    /// Persists `user` as the logged-in user.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub fn save_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        self.store.set(USER_KEY, &serde_json::to_string(user)?)
    }

    /// Updates the logged-in user's record with a completed level.
    ///
    /// Returns the updated record, or `None` when nobody is logged in.
    #[instrument(skip(self, report), fields(level = %report.level()))]
    pub fn record_completion(
        &self,
        report: &CompletionReport,
    ) -> Result<Option<UserProfile>, StorageError> {
        let Some(mut user) = self.load_user()? else {
            debug!("No user to record completion for");
            return Ok(None);
        };
        if user.record(report) {
            self.save_user(&user)?;
        }
        Ok(Some(user))
    }

    /// Reads the mute flag. Absent or unreadable means unmuted.
    #[instrument(skip(self))]
    pub fn is_muted(&self) -> Result<bool, StorageError> {
        let muted = match self.store.get(MUTED_KEY)? {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Unreadable mute flag");
                false
            }),
            None => false,
        };
        Ok(muted)
    }

    /// Persists the mute flag.
    #[instrument(skip(self))]
    pub fn set_muted(&self, muted: bool) -> Result<(), StorageError> {
        self.store.set(MUTED_KEY, if muted { "true" } else { "false" })
    }
}

fn generate_user_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..USER_ID_LEN)
        .map(|_| char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_user_id_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = generate_user_id(&mut rng);
        assert_eq!(id.len(), USER_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
