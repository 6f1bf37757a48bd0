//! Database access for user profiles.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{errors::Result, models::profiles::Profile},
    types::{HospitalId, UserId, abbrev_uuid},
};

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT id, email, name, role, hospital_id FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(hospital_id = %abbrev_uuid(&hospital_id)), err)]
    pub async fn hospital_name(&mut self, hospital_id: HospitalId) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM hospitals WHERE id = $1")
            .bind(hospital_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(name)
    }
}
