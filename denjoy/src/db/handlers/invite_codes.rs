//! Database repository for beta invite codes.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::invite_codes::{
            InviteCode, InviteCodeCreateDBRequest, InviteCodeFilter, InviteCodeUpdateDBRequest, InviteCodeVerification,
        },
    },
    types::{InviteCodeId, UserId, abbrev_uuid},
};

const INVITE_CODE_COLUMNS: &str =
    "id, code, usage_mode, is_active, verify_count, last_verified_at, used_at, used_by, memo, created_by, created_at";

/// Name of the unique constraint on `beta_invite_codes.code`
pub const CODE_CONSTRAINT: &str = "beta_invite_codes_code_key";

pub struct InviteCodes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> InviteCodes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Run `verify_beta_invite_code`. The procedure owns the bookkeeping.
    #[instrument(skip(self, code), err)]
    pub async fn verify(&mut self, code: &str) -> Result<InviteCodeVerification> {
        let verification = sqlx::query_as::<_, InviteCodeVerification>("SELECT valid, reason, usage_mode FROM verify_beta_invite_code($1)")
            .bind(code)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(verification)
    }

    /// Run `consume_beta_invite_code`; false when the code cannot be consumed.
    #[instrument(skip(self, code), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn consume(&mut self, code: &str, user_id: UserId) -> Result<bool> {
        let consumed: bool = sqlx::query_scalar("SELECT consume_beta_invite_code($1, $2)")
            .bind(code)
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(consumed)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for InviteCodes<'c> {
    type CreateRequest = InviteCodeCreateDBRequest;
    type UpdateRequest = InviteCodeUpdateDBRequest;
    type Response = InviteCode;
    type Id = InviteCodeId;
    type Filter = InviteCodeFilter;

    #[instrument(skip(self, request), fields(usage_mode = ?request.usage_mode), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "INSERT INTO beta_invite_codes (code, usage_mode, memo, created_by) VALUES ($1, $2, $3, $4) RETURNING {INVITE_CODE_COLUMNS}"
        );

        let code = sqlx::query_as::<_, InviteCode>(&query)
            .bind(&request.code)
            .bind(request.usage_mode)
            .bind(&request.memo)
            .bind(request.created_by)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(code)
    }

    #[instrument(skip(self), fields(invite_code_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {INVITE_CODE_COLUMNS} FROM beta_invite_codes WHERE id = $1");

        let code = sqlx::query_as::<_, InviteCode>(&query).bind(id).fetch_optional(&mut *self.db).await?;

        Ok(code)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {INVITE_CODE_COLUMNS} FROM beta_invite_codes");
        if filter.is_active.is_some() {
            query.push_str(" WHERE is_active = $1");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut sql_query = sqlx::query_as::<_, InviteCode>(&query);
        if let Some(is_active) = filter.is_active {
            sql_query = sql_query.bind(is_active);
        }

        let codes = sql_query.fetch_all(&mut *self.db).await?;
        Ok(codes)
    }

    #[instrument(skip(self, request), fields(invite_code_id = %abbrev_uuid(&id), is_active = request.is_active), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!("UPDATE beta_invite_codes SET is_active = $2 WHERE id = $1 RETURNING {INVITE_CODE_COLUMNS}");

        let code = sqlx::query_as::<_, InviteCode>(&query)
            .bind(id)
            .bind(request.is_active)
            .fetch_optional(&mut *self.db)
            .await?;

        code.ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::invite_codes::UsageMode;
    use sqlx::PgPool;
    use uuid::Uuid;

    async fn create_code(pool: &PgPool, code: &str, usage_mode: UsageMode) -> InviteCode {
        let mut conn = pool.acquire().await.unwrap();
        InviteCodes::new(&mut conn)
            .create(&InviteCodeCreateDBRequest {
                code: code.to_string(),
                usage_mode,
                memo: None,
                created_by: None,
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_collide(pool: PgPool) {
        let created = create_code(&pool, "DENJOY-7KQ2-M9XA", UsageMode::Unlimited).await;
        assert_eq!(created.usage_mode, UsageMode::Unlimited);
        assert!(created.is_active);
        assert_eq!(created.verify_count, 0);

        let mut conn = pool.acquire().await.unwrap();
        let err = InviteCodes::new(&mut conn)
            .create(&InviteCodeCreateDBRequest {
                code: "DENJOY-7KQ2-M9XA".to_string(),
                usage_mode: UsageMode::Single,
                memo: None,
                created_by: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on(CODE_CONSTRAINT));
    }

    #[sqlx::test]
    async fn test_single_use_code_verifies_once(pool: PgPool) {
        create_code(&pool, "DENJOY-AB23-CD45", UsageMode::Single).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = InviteCodes::new(&mut conn);

        let first = repo.verify(" denjoy-ab23-cd45 ").await.unwrap();
        assert!(first.valid);
        assert_eq!(first.reason, None);
        assert_eq!(first.usage_mode, Some(UsageMode::Single));

        let second = repo.verify("DENJOY-AB23-CD45").await.unwrap();
        assert!(!second.valid);
        assert_eq!(second.reason.as_deref(), Some("already_verified"));
        assert_eq!(second.usage_mode, Some(UsageMode::Single));

        let missing = repo.verify("DENJOY-ZZZZ-ZZZZ").await.unwrap();
        assert!(!missing.valid);
        assert_eq!(missing.reason.as_deref(), Some("not_found"));
        assert_eq!(missing.usage_mode, None);
    }

    #[sqlx::test]
    async fn test_unlimited_and_inactive_verification(pool: PgPool) {
        let unlimited = create_code(&pool, "DENJOY-UNLM-2345", UsageMode::Unlimited).await;
        let inactive = create_code(&pool, "DENJOY-OFFF-2345", UsageMode::Single).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = InviteCodes::new(&mut conn);

        assert!(repo.verify("DENJOY-UNLM-2345").await.unwrap().valid);
        assert!(repo.verify("DENJOY-UNLM-2345").await.unwrap().valid);
        let unlimited = repo.get_by_id(unlimited.id).await.unwrap().unwrap();
        assert_eq!(unlimited.verify_count, 2);
        assert!(unlimited.last_verified_at.is_some());

        repo.update(inactive.id, &InviteCodeUpdateDBRequest { is_active: false }).await.unwrap();
        let refused = repo.verify("DENJOY-OFFF-2345").await.unwrap();
        assert!(!refused.valid);
        assert_eq!(refused.reason.as_deref(), Some("inactive"));
    }

    #[sqlx::test]
    async fn test_single_use_code_consumed_once(pool: PgPool) {
        let code = create_code(&pool, "DENJOY-CNSM-2345", UsageMode::Single).await;
        let first_user = Uuid::new_v4();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = InviteCodes::new(&mut conn);

        assert!(repo.consume("denjoy-cnsm-2345", first_user).await.unwrap());
        assert!(!repo.consume("DENJOY-CNSM-2345", Uuid::new_v4()).await.unwrap());

        let code = repo.get_by_id(code.id).await.unwrap().unwrap();
        assert_eq!(code.used_by, Some(first_user));
        assert!(code.used_at.is_some());

        let refused = repo.verify("DENJOY-CNSM-2345").await.unwrap();
        assert_eq!(refused.reason.as_deref(), Some("already_used"));
    }

    #[sqlx::test]
    async fn test_unlimited_code_consumed_repeatedly(pool: PgPool) {
        create_code(&pool, "DENJOY-MANY-2345", UsageMode::Unlimited).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = InviteCodes::new(&mut conn);

        assert!(repo.consume("DENJOY-MANY-2345", Uuid::new_v4()).await.unwrap());
        assert!(repo.consume("DENJOY-MANY-2345", Uuid::new_v4()).await.unwrap());
        assert!(!repo.consume("DENJOY-NONE-2345", Uuid::new_v4()).await.unwrap());
    }

    #[sqlx::test]
    async fn test_list_and_update(pool: PgPool) {
        let first = create_code(&pool, "DENJOY-LST1-2345", UsageMode::Single).await;
        create_code(&pool, "DENJOY-LST2-2345", UsageMode::Single).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = InviteCodes::new(&mut conn);

        assert_eq!(repo.list(&InviteCodeFilter::default()).await.unwrap().len(), 2);

        let toggled = repo.update(first.id, &InviteCodeUpdateDBRequest { is_active: false }).await.unwrap();
        assert!(!toggled.is_active);

        let active = repo.list(&InviteCodeFilter { is_active: Some(true) }).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "DENJOY-LST2-2345");

        let missing = repo.update(Uuid::new_v4(), &InviteCodeUpdateDBRequest { is_active: true }).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }
}
