//! Database repository for hospital member invitations.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::member_invitations::{MemberInvitation, MemberInvitationCreateDBRequest},
    },
    types::{InvitationId, abbrev_uuid},
};

/// Unique index allowing one open invitation per address and hospital
pub const PENDING_INVITATION_CONSTRAINT: &str = "member_invitations_pending_key";

pub struct MemberInvitations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> MemberInvitations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert an invitation. Expired, unaccepted invitations for the same address are removed
    /// first so they do not block a fresh one.
    #[instrument(skip(self, request), fields(hospital_id = %abbrev_uuid(&request.hospital_id), role = ?request.role), err)]
    pub async fn create(&mut self, request: &MemberInvitationCreateDBRequest) -> Result<MemberInvitation> {
        sqlx::query(
            "DELETE FROM member_invitations \
             WHERE hospital_id = $1 AND lower(email) = lower($2) AND accepted_at IS NULL AND expires_at <= now()",
        )
        .bind(request.hospital_id)
        .bind(&request.email)
        .execute(&mut *self.db)
        .await?;

        let invitation = sqlx::query_as::<_, MemberInvitation>(
            "INSERT INTO member_invitations (hospital_id, email, name, role, token, invited_by, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, hospital_id, email, name, role, token, invited_by, expires_at, accepted_at, created_at",
        )
        .bind(request.hospital_id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(request.role)
        .bind(&request.token)
        .bind(request.invited_by)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(invitation)
    }

    /// Remove an invitation that was never delivered. Returns false when no row matched.
    #[instrument(skip(self), fields(invitation_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: InvitationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM member_invitations WHERE id = $1 AND accepted_at IS NULL")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{errors::DbError, models::member_invitations::MemberRole, models::profiles::ProfileRole},
        test_utils::{seed_hospital, seed_profile},
        types::{HospitalId, UserId},
    };
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    fn invitation(hospital_id: HospitalId, invited_by: UserId, email: &str, token: &str) -> MemberInvitationCreateDBRequest {
        MemberInvitationCreateDBRequest {
            hospital_id,
            email: email.to_string(),
            name: "Kim Seoyeon".to_string(),
            role: MemberRole::Staff,
            token: token.to_string(),
            invited_by,
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_one_open_invitation_per_address(pool: PgPool) {
        let hospital_id = seed_hospital(&pool, "Busan Implant Center").await;
        let master = seed_profile(&pool, ProfileRole::Master, Some(hospital_id)).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = MemberInvitations::new(&mut conn);

        let created = repo.create(&invitation(hospital_id, master, "kim@clinic.kr", "token-1")).await.unwrap();
        assert_eq!(created.role, MemberRole::Staff);
        assert_eq!(created.accepted_at, None);

        let err = repo.create(&invitation(hospital_id, master, "KIM@clinic.kr", "token-2")).await.unwrap_err();
        assert!(err.is_unique_violation_on(PENDING_INVITATION_CONSTRAINT));

        // Another hospital may invite the same address
        let other_hospital = seed_hospital(&pool, "Seoul Dental").await;
        let other_master = seed_profile(&pool, ProfileRole::Master, Some(other_hospital)).await;
        repo.create(&invitation(other_hospital, other_master, "kim@clinic.kr", "token-3")).await.unwrap();
    }

    #[sqlx::test]
    async fn test_expired_invitation_is_replaced(pool: PgPool) {
        let hospital_id = seed_hospital(&pool, "Busan Implant Center").await;
        let master = seed_profile(&pool, ProfileRole::Master, Some(hospital_id)).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = MemberInvitations::new(&mut conn);

        let mut expired = invitation(hospital_id, master, "lee@clinic.kr", "token-old");
        expired.expires_at = Utc::now() - Duration::hours(1);
        let expired = repo.create(&expired).await.unwrap();

        let fresh = repo.create(&invitation(hospital_id, master, "Lee@clinic.kr", "token-new")).await.unwrap();
        assert_ne!(fresh.id, expired.id);

        let remaining: i64 = sqlx::query_scalar("SELECT count(*) FROM member_invitations WHERE hospital_id = $1")
            .bind(hospital_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[sqlx::test]
    async fn test_delete_frees_the_address(pool: PgPool) {
        let hospital_id = seed_hospital(&pool, "Busan Implant Center").await;
        let master = seed_profile(&pool, ProfileRole::Master, Some(hospital_id)).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = MemberInvitations::new(&mut conn);

        let created = repo.create(&invitation(hospital_id, master, "park@clinic.kr", "token-a")).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());

        repo.create(&invitation(hospital_id, master, "park@clinic.kr", "token-b")).await.unwrap();
    }

    #[sqlx::test]
    async fn test_unknown_hospital_is_rejected(pool: PgPool) {
        let hospital_id = seed_hospital(&pool, "Busan Implant Center").await;
        let master = seed_profile(&pool, ProfileRole::Master, Some(hospital_id)).await;
        let mut conn = pool.acquire().await.unwrap();

        let err = MemberInvitations::new(&mut conn)
            .create(&invitation(uuid::Uuid::new_v4(), master, "choi@clinic.kr", "token-x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
