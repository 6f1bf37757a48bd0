//! Database repository for contact inquiries.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::inquiries::{Inquiry, InquiryCreateDBRequest, InquiryFilter, InquiryUpdateDBRequest},
    },
    types::{InquiryId, abbrev_uuid},
};

const INQUIRY_COLUMNS: &str = "id, name, email, phone, hospital_name, inquiry_type, content, status, submission_digest, \
     admin_reply, replied_at, replied_by, created_at, updated_at";

/// Name of the unique constraint that rejects repeated submissions
pub const SUBMISSION_DIGEST_CONSTRAINT: &str = "contact_inquiries_submission_digest_key";

pub struct Inquiries<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Inquiries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Inquiries<'c> {
    type CreateRequest = InquiryCreateDBRequest;
    type UpdateRequest = InquiryUpdateDBRequest;
    type Response = Inquiry;
    type Id = InquiryId;
    type Filter = InquiryFilter;

    #[instrument(skip(self, request), fields(inquiry_type = request.inquiry_type.label()), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            "INSERT INTO contact_inquiries (name, email, phone, hospital_name, inquiry_type, content, submission_digest) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {INQUIRY_COLUMNS}"
        );

        let inquiry = sqlx::query_as::<_, Inquiry>(&query)
            .bind(&request.name)
            .bind(&request.email)
            .bind(&request.phone)
            .bind(&request.hospital_name)
            .bind(request.inquiry_type)
            .bind(&request.content)
            .bind(&request.submission_digest)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(inquiry)
    }

    #[instrument(skip(self), fields(inquiry_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {INQUIRY_COLUMNS} FROM contact_inquiries WHERE id = $1");

        let inquiry = sqlx::query_as::<_, Inquiry>(&query).bind(id).fetch_optional(&mut *self.db).await?;

        Ok(inquiry)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {INQUIRY_COLUMNS} FROM contact_inquiries WHERE 1=1");

        if filter.status.is_some() {
            query.push_str(" AND status = $1");
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, Inquiry>(&query);
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        let inquiries = sql_query.fetch_all(&mut *self.db).await?;
        Ok(inquiries)
    }

    #[instrument(skip(self, request), fields(inquiry_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (reply_message, replied_by) = match &request.reply {
            Some(reply) => (Some(reply.message.as_str()), Some(reply.replied_by)),
            None => (None, None),
        };

        let query = format!(
            "UPDATE contact_inquiries SET \
                 status = COALESCE($2, status), \
                 admin_reply = COALESCE($3, admin_reply), \
                 replied_by = COALESCE($4, replied_by), \
                 replied_at = CASE WHEN $3::text IS NULL THEN replied_at ELSE now() END, \
                 updated_at = now() \
             WHERE id = $1 RETURNING {INQUIRY_COLUMNS}"
        );

        let inquiry = sqlx::query_as::<_, Inquiry>(&query)
            .bind(id)
            .bind(request.status)
            .bind(reply_message)
            .bind(replied_by)
            .fetch_optional(&mut *self.db)
            .await?;

        inquiry.ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::{
            inquiries::{InquiryReply, InquiryStatus, InquiryType},
            profiles::ProfileRole,
        },
        test_utils::seed_profile,
    };
    use sqlx::PgPool;
    use uuid::Uuid;

    fn submission(digest: &str) -> InquiryCreateDBRequest {
        InquiryCreateDBRequest {
            name: "Kim Minji".to_string(),
            email: "minji@clinic.kr".to_string(),
            phone: None,
            hospital_name: Some("Seoul Dental".to_string()),
            inquiry_type: InquiryType::Demo,
            content: "Can we book a demo next week?".to_string(),
            submission_digest: digest.to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_repeated_digest_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inquiries::new(&mut conn);

        let created = repo.create(&submission("digest-a")).await.unwrap();
        assert_eq!(created.status, InquiryStatus::Pending);
        assert_eq!(created.inquiry_type, InquiryType::Demo);

        let err = repo.create(&submission("digest-a")).await.unwrap_err();
        assert!(err.is_unique_violation_on(SUBMISSION_DIGEST_CONSTRAINT));
    }

    #[sqlx::test]
    async fn test_list_filters_and_pages(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inquiries::new(&mut conn);

        let first = repo.create(&submission("digest-1")).await.unwrap();
        repo.create(&submission("digest-2")).await.unwrap();
        repo.create(&submission("digest-3")).await.unwrap();
        repo.update(
            first.id,
            &InquiryUpdateDBRequest {
                status: Some(InquiryStatus::InProgress),
                reply: None,
            },
        )
        .await
        .unwrap();

        let all = InquiryFilter {
            status: None,
            skip: 0,
            limit: 50,
        };
        assert_eq!(repo.list(&all).await.unwrap().len(), 3);

        let page = InquiryFilter { skip: 1, limit: 1, ..all.clone() };
        assert_eq!(repo.list(&page).await.unwrap().len(), 1);

        let in_progress = InquiryFilter {
            status: Some(InquiryStatus::InProgress),
            ..all
        };
        let listed = repo.list(&in_progress).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first.id);
    }

    #[sqlx::test]
    async fn test_reply_sets_reply_fields(pool: PgPool) {
        let admin = seed_profile(&pool, ProfileRole::Admin, None).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Inquiries::new(&mut conn);
        let created = repo.create(&submission("digest-r")).await.unwrap();

        let replied = repo
            .update(
                created.id,
                &InquiryUpdateDBRequest {
                    status: Some(InquiryStatus::Resolved),
                    reply: Some(InquiryReply {
                        message: "Tuesday works for us".to_string(),
                        replied_by: admin,
                    }),
                },
            )
            .await
            .unwrap();
        assert_eq!(replied.status, InquiryStatus::Resolved);
        assert_eq!(replied.admin_reply.as_deref(), Some("Tuesday works for us"));
        assert_eq!(replied.replied_by, Some(admin));
        assert!(replied.replied_at.is_some());

        // A status-only update keeps the reply
        let reopened = repo
            .update(
                created.id,
                &InquiryUpdateDBRequest {
                    status: Some(InquiryStatus::InProgress),
                    reply: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(reopened.admin_reply.as_deref(), Some("Tuesday works for us"));
        assert_eq!(reopened.replied_at, replied.replied_at);

        let missing = repo.update(Uuid::new_v4(), &InquiryUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }
}
