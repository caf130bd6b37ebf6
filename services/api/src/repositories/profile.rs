//! Profile repository

use common::{SharedTable, StoreResult};
use uuid::Uuid;

use crate::models::Profile;

#[derive(Clone)]
pub struct ProfileRepository {
    table: SharedTable<Profile>,
}

impl ProfileRepository {
    pub fn new(table: SharedTable<Profile>) -> Self {
        Self { table }
    }

    /// The profile of the user with `user_id`
    pub async fn find_by_user_id(&self, user_id: Uuid) -> StoreResult<Profile> {
        self.table.select_by_key(&user_id).await
    }

    /// Provision a profile
    pub async fn insert(&self, profile: Profile) -> StoreResult<Profile> {
        self.table.insert(profile).await
    }
}
