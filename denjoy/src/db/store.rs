//! The persistence seam handlers talk to.
//!
//! [`Store`] collects every database operation the edge functions need. [`PostgresStore`] runs
//! them through the repositories on a pooled connection; tests substitute an in-memory store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::{
        errors::Result,
        handlers::{
            AnalysisLeads, Billing, GeoAccessLogs, Inquiries, InviteCodes, MemberInvitations, Profiles, Repository, WithdrawalLogs,
        },
        models::{
            billing::PaymentStatus,
            geo_access_logs::GeoAccessLogCreateDBRequest,
            inquiries::{Inquiry, InquiryCreateDBRequest, InquiryFilter, InquiryUpdateDBRequest},
            invite_codes::{InviteCode, InviteCodeCreateDBRequest, InviteCodeFilter, InviteCodeUpdateDBRequest, InviteCodeVerification},
            leads::{AnalysisLead, AnalysisLeadCreateDBRequest},
            member_invitations::{MemberInvitation, MemberInvitationCreateDBRequest},
            profiles::Profile,
            withdrawal_logs::{WithdrawalLog, WithdrawalLogCreateDBRequest},
        },
    },
    types::{BillingId, HospitalId, InquiryId, InvitationId, InviteCodeId, UserId},
};

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a contact inquiry. Repeated digests fail with a unique violation.
    async fn create_inquiry(&self, request: &InquiryCreateDBRequest) -> Result<Inquiry>;

    async fn get_inquiry(&self, id: InquiryId) -> Result<Option<Inquiry>>;

    /// Inquiries newest first
    async fn list_inquiries(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>>;

    async fn update_inquiry(&self, id: InquiryId, request: &InquiryUpdateDBRequest) -> Result<Inquiry>;

    /// Apply a canonical payment outcome. False when the transition was refused.
    async fn process_payment_callback(&self, billing_id: BillingId, status: PaymentStatus, payment_ref: &str) -> Result<bool>;

    /// Insert an invite code. Code collisions fail with a unique violation.
    async fn create_invite_code(&self, request: &InviteCodeCreateDBRequest) -> Result<InviteCode>;

    /// Codes newest first
    async fn list_invite_codes(&self, filter: &InviteCodeFilter) -> Result<Vec<InviteCode>>;

    async fn update_invite_code(&self, id: InviteCodeId, request: &InviteCodeUpdateDBRequest) -> Result<InviteCode>;

    async fn verify_invite_code(&self, code: &str) -> Result<InviteCodeVerification>;

    async fn consume_invite_code(&self, code: &str, user_id: UserId) -> Result<bool>;

    async fn create_analysis_lead(&self, request: &AnalysisLeadCreateDBRequest) -> Result<AnalysisLead>;

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>>;

    async fn get_hospital_name(&self, hospital_id: HospitalId) -> Result<Option<String>>;

    /// Insert an invitation. An open invitation for the same address and hospital fails with a
    /// unique violation.
    async fn create_member_invitation(&self, request: &MemberInvitationCreateDBRequest) -> Result<MemberInvitation>;

    /// Remove an unaccepted invitation. False when nothing was deleted.
    async fn delete_member_invitation(&self, id: InvitationId) -> Result<bool>;

    async fn create_withdrawal_log(&self, request: &WithdrawalLogCreateDBRequest) -> Result<WithdrawalLog>;

    async fn record_geo_access(&self, request: &GeoAccessLogCreateDBRequest) -> Result<()>;
}

/// [`Store`] backed by the Postgres pool
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_inquiry(&self, request: &InquiryCreateDBRequest) -> Result<Inquiry> {
        let mut conn = self.pool.acquire().await?;
        Inquiries::new(&mut conn).create(request).await
    }

    async fn get_inquiry(&self, id: InquiryId) -> Result<Option<Inquiry>> {
        let mut conn = self.pool.acquire().await?;
        Inquiries::new(&mut conn).get_by_id(id).await
    }

    async fn list_inquiries(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>> {
        let mut conn = self.pool.acquire().await?;
        Inquiries::new(&mut conn).list(filter).await
    }

    async fn update_inquiry(&self, id: InquiryId, request: &InquiryUpdateDBRequest) -> Result<Inquiry> {
        let mut conn = self.pool.acquire().await?;
        Inquiries::new(&mut conn).update(id, request).await
    }

    async fn process_payment_callback(&self, billing_id: BillingId, status: PaymentStatus, payment_ref: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Billing::new(&mut conn).process_callback(billing_id, status, payment_ref).await
    }

    async fn create_invite_code(&self, request: &InviteCodeCreateDBRequest) -> Result<InviteCode> {
        let mut conn = self.pool.acquire().await?;
        InviteCodes::new(&mut conn).create(request).await
    }

    async fn list_invite_codes(&self, filter: &InviteCodeFilter) -> Result<Vec<InviteCode>> {
        let mut conn = self.pool.acquire().await?;
        InviteCodes::new(&mut conn).list(filter).await
    }

    async fn update_invite_code(&self, id: InviteCodeId, request: &InviteCodeUpdateDBRequest) -> Result<InviteCode> {
        let mut conn = self.pool.acquire().await?;
        InviteCodes::new(&mut conn).update(id, request).await
    }

    async fn verify_invite_code(&self, code: &str) -> Result<InviteCodeVerification> {
        let mut conn = self.pool.acquire().await?;
        InviteCodes::new(&mut conn).verify(code).await
    }

    async fn consume_invite_code(&self, code: &str, user_id: UserId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        InviteCodes::new(&mut conn).consume(code, user_id).await
    }

    async fn create_analysis_lead(&self, request: &AnalysisLeadCreateDBRequest) -> Result<AnalysisLead> {
        let mut conn = self.pool.acquire().await?;
        AnalysisLeads::new(&mut conn).create(request).await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        let mut conn = self.pool.acquire().await?;
        Profiles::new(&mut conn).get_by_id(user_id).await
    }

    async fn get_hospital_name(&self, hospital_id: HospitalId) -> Result<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        Profiles::new(&mut conn).hospital_name(hospital_id).await
    }

    async fn create_member_invitation(&self, request: &MemberInvitationCreateDBRequest) -> Result<MemberInvitation> {
        let mut tx = self.pool.begin().await?;
        let invitation = MemberInvitations::new(&mut tx).create(request).await?;
        tx.commit().await?;
        Ok(invitation)
    }

    async fn delete_member_invitation(&self, id: InvitationId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        MemberInvitations::new(&mut conn).delete(id).await
    }

    async fn create_withdrawal_log(&self, request: &WithdrawalLogCreateDBRequest) -> Result<WithdrawalLog> {
        let mut conn = self.pool.acquire().await?;
        WithdrawalLogs::new(&mut conn).create(request).await
    }

    async fn record_geo_access(&self, request: &GeoAccessLogCreateDBRequest) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        GeoAccessLogs::new(&mut conn).create(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::{member_invitations::MemberRole, profiles::ProfileRole},
        test_utils::{seed_hospital, seed_pending_billing, seed_profile},
    };
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_append_only_logs(pool: PgPool) {
        let store = PostgresStore::new(pool.clone());

        let lead = store
            .create_analysis_lead(&AnalysisLeadCreateDBRequest {
                email: "director@smile-dental.kr".to_string(),
                hospital_name: None,
                score: Some(64),
                report_text: "Score: 64/100".to_string(),
                consent: true,
            })
            .await
            .unwrap();
        assert_eq!(lead.score, Some(64));

        let user_id = Uuid::new_v4();
        let log = store
            .create_withdrawal_log(&WithdrawalLogCreateDBRequest {
                user_id,
                email: None,
                reason: Some("too expensive".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(log.user_id, user_id);

        store
            .record_geo_access(&GeoAccessLogCreateDBRequest {
                country: "US".to_string(),
                path: "/functions/v1/submit-contact".to_string(),
                ip: Some("203.0.113.7".to_string()),
                user_agent: None,
            })
            .await
            .unwrap();
        let blocked: i64 = sqlx::query_scalar("SELECT count(*) FROM geo_access_logs WHERE country = 'US'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(blocked, 1);
    }

    #[sqlx::test]
    async fn test_payment_and_invitation_seam(pool: PgPool) {
        let store = PostgresStore::new(pool.clone());
        let hospital_id = seed_hospital(&pool, "Busan Implant Center").await;
        let master = seed_profile(&pool, ProfileRole::Master, Some(hospital_id)).await;
        let billing_id = seed_pending_billing(&pool, hospital_id).await;

        assert!(store.process_payment_callback(billing_id, PaymentStatus::Completed, "PAY-1").await.unwrap());
        assert!(!store.process_payment_callback(billing_id, PaymentStatus::Completed, "PAY-1").await.unwrap());

        assert_eq!(store.get_hospital_name(hospital_id).await.unwrap().as_deref(), Some("Busan Implant Center"));

        let request = MemberInvitationCreateDBRequest {
            hospital_id,
            email: "kim@clinic.kr".to_string(),
            name: "Kim Seoyeon".to_string(),
            role: MemberRole::Staff,
            token: "seam-token".to_string(),
            invited_by: master,
            expires_at: Utc::now() + Duration::days(7),
        };
        let invitation = store.create_member_invitation(&request).await.unwrap();
        assert!(store.delete_member_invitation(invitation.id).await.unwrap());
        store.create_member_invitation(&request).await.unwrap();
    }
}
