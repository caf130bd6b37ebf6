//! Provisioning of users, profiles and hotel rooms from a JSON seed file
//!
//! ```json
//! {
//!   "users": [
//!     {"email": "alice@example.com", "password": "…", "profile": {"display_name": "Alice"}}
//!   ],
//!   "hotel_rooms": [
//!     {"room_id": "R1", "hotel_id": "H1", "room_type": "suite", "price_USD": 250.0}
//!   ]
//! }
//! ```
//!
//! Records that already exist are left untouched, so seeding is safe to repeat.

use std::path::Path;

use anyhow::{Context, Result};
use auth::NewUser;
use common::StoreError;
use serde::Deserialize;
use tracing::info;

use crate::{
    models::{HotelRoom, Profile, ProfileDetails},
    state::AppState,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub profile: Option<ProfileDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub hotel_rooms: Vec<HotelRoom>,
}

/// Counts of records created by [`SeedData::apply`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub profiles: usize,
    pub hotel_rooms: usize,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self> {
        let seed: SeedData = serde_json::from_str(json).context("Malformed seed data")?;

        if let Some(room) = seed
            .hotel_rooms
            .iter()
            .find(|room| !(room.details.price_usd >= 0.0))
        {
            anyhow::bail!("Hotel room {} has a negative price", room.room_id);
        }

        Ok(seed)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Insert every missing record into the state's tables
    pub async fn apply(&self, state: &AppState) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        let users = state.authenticator.users();

        for seed_user in &self.users {
            if users.find_by_email(&seed_user.email).await?.is_some() {
                info!("User {} already provisioned", seed_user.email);
                continue;
            }

            let user = users
                .create(&NewUser {
                    email: seed_user.email.clone(),
                    password: seed_user.password.clone(),
                })
                .await?;
            report.users += 1;

            if let Some(details) = &seed_user.profile {
                let profile = Profile {
                    id: user.id,
                    details: details.clone(),
                };
                if inserted(state.profile_repository.insert(profile).await)? {
                    report.profiles += 1;
                }
            }
        }

        for room in &self.hotel_rooms {
            if inserted(state.hotel_room_repository.insert(room.clone()).await)? {
                report.hotel_rooms += 1;
            }
        }

        info!(
            "Seeded {} users, {} profiles and {} hotel rooms",
            report.users, report.profiles, report.hotel_rooms
        );
        Ok(report)
    }
}

/// Treat an existing record as already provisioned
fn inserted<T>(result: Result<T, StoreError>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(StoreError::DuplicateKey { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
