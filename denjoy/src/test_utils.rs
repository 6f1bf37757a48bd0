//! Test utilities: an in-memory [`Store`] and a test server around the real router.

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use sqlx::PgPool;
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;
use uuid::Uuid;

use crate::{
    AppState,
    auth::session::create_access_token,
    config::{Config, EmailTransportConfig},
    db::{
        Store,
        errors::{DbError, Result},
        handlers::{
            inquiries::SUBMISSION_DIGEST_CONSTRAINT, invite_codes::CODE_CONSTRAINT,
            member_invitations::PENDING_INVITATION_CONSTRAINT,
        },
        models::{
            billing::PaymentStatus,
            geo_access_logs::GeoAccessLogCreateDBRequest,
            inquiries::{Inquiry, InquiryCreateDBRequest, InquiryFilter, InquiryStatus, InquiryUpdateDBRequest},
            invite_codes::{InviteCode, InviteCodeCreateDBRequest, InviteCodeFilter, InviteCodeUpdateDBRequest, InviteCodeVerification, UsageMode},
            leads::{AnalysisLead, AnalysisLeadCreateDBRequest},
            member_invitations::{MemberInvitation, MemberInvitationCreateDBRequest},
            profiles::{Profile, ProfileRole},
            withdrawal_logs::{WithdrawalLog, WithdrawalLogCreateDBRequest},
        },
    },
    email::EmailService,
    notifications::ChatNotifier,
    types::{BillingId, HospitalId, InquiryId, InvitationId, InviteCodeId, UserId},
};

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("denjoy-test-emails-{}", std::process::id()));

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 3001,
        site_url: "https://app.denjoy.test".to_string(),
        ..Default::default()
    };
    config.database.run_migrations = false;
    config.auth.jwt_secret = Some("test-jwt-secret-with-at-least-32-characters".to_string());
    config.payment.callback_secret = Some("callback-test-secret".to_string());
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().to_string(),
    };
    config.email.from_email = "noreply@denjoy.test".to_string();
    config
}

/// Insert a hospital row for repository tests
pub async fn seed_hospital(pool: &PgPool, name: &str) -> HospitalId {
    sqlx::query_scalar("INSERT INTO hospitals (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Failed to insert hospital")
}

/// Insert a profile row for repository tests
pub async fn seed_profile(pool: &PgPool, role: ProfileRole, hospital_id: Option<HospitalId>) -> UserId {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO profiles (id, email, role, hospital_id) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("{}@clinic.test", &id.simple().to_string()[..8]))
        .bind(role)
        .bind(hospital_id)
        .execute(pool)
        .await
        .expect("Failed to insert profile");
    id
}

/// Insert a pending billing row for repository tests
pub async fn seed_pending_billing(pool: &PgPool, hospital_id: HospitalId) -> BillingId {
    sqlx::query_scalar("INSERT INTO billing (hospital_id, plan, amount) VALUES ($1, 'clinic', 99000) RETURNING id")
        .bind(hospital_id)
        .fetch_one(pool)
        .await
        .expect("Failed to insert billing row")
}

fn unique_violation(constraint: &str, table: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

/// A billing row as the payment procedure sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingRow {
    pub status: String,
    pub payment_ref: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    inquiries: Vec<Inquiry>,
    billing: Vec<(BillingId, BillingRow)>,
    invite_codes: Vec<InviteCode>,
    failing_code_inserts: u32,
    leads: Vec<AnalysisLead>,
    profiles: Vec<Profile>,
    hospitals: Vec<(HospitalId, String)>,
    invitations: Vec<MemberInvitation>,
    withdrawal_logs: Vec<WithdrawalLog>,
    geo_access_logs: Vec<GeoAccessLogCreateDBRequest>,
}

/// [`Store`] kept in memory. Mirrors the unique constraints and stored procedures of the
/// Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` invite code inserts collide
    pub fn fail_next_code_inserts(&self, n: u32) {
        self.state.lock().unwrap().failing_code_inserts = n;
    }

    pub fn invite_code_count(&self) -> usize {
        self.state.lock().unwrap().invite_codes.len()
    }

    pub fn add_profile(&self, role: ProfileRole, hospital_id: Option<HospitalId>) -> Profile {
        let id = Uuid::new_v4();
        let profile = Profile {
            id,
            email: format!("{}@clinic.test", &id.simple().to_string()[..8]),
            name: Some(format!("{role:?} user")),
            role,
            hospital_id,
        };
        self.state.lock().unwrap().profiles.push(profile.clone());
        profile
    }

    pub fn add_hospital(&self, name: &str) -> HospitalId {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().hospitals.push((id, name.to_string()));
        id
    }

    /// Seed an invitation directly, bypassing the pending check
    pub fn add_invitation(&self, invitation: MemberInvitation) {
        self.state.lock().unwrap().invitations.push(invitation);
    }

    pub fn add_pending_billing(&self) -> BillingId {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().billing.push((
            id,
            BillingRow {
                status: "pending".to_string(),
                payment_ref: None,
            },
        ));
        id
    }

    pub fn billing(&self, id: BillingId) -> Option<BillingRow> {
        let state = self.state.lock().unwrap();
        state.billing.iter().find(|(row_id, _)| *row_id == id).map(|(_, row)| row.clone())
    }

    pub fn add_invite_code(&self, code: &str, usage_mode: UsageMode, is_active: bool) -> InviteCode {
        let invite_code = InviteCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            usage_mode,
            is_active,
            verify_count: 0,
            last_verified_at: None,
            used_at: None,
            used_by: None,
            memo: None,
            created_by: None,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().invite_codes.push(invite_code.clone());
        invite_code
    }

    pub fn invite_code(&self, code: &str) -> Option<InviteCode> {
        self.state.lock().unwrap().invite_codes.iter().find(|c| c.code == code).cloned()
    }

    pub fn inquiries(&self) -> Vec<Inquiry> {
        self.state.lock().unwrap().inquiries.clone()
    }

    pub fn leads(&self) -> Vec<AnalysisLead> {
        self.state.lock().unwrap().leads.clone()
    }

    pub fn invitations(&self) -> Vec<MemberInvitation> {
        self.state.lock().unwrap().invitations.clone()
    }

    pub fn withdrawal_logs(&self) -> Vec<WithdrawalLog> {
        self.state.lock().unwrap().withdrawal_logs.clone()
    }

    pub fn geo_access_logs(&self) -> Vec<GeoAccessLogCreateDBRequest> {
        self.state.lock().unwrap().geo_access_logs.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_inquiry(&self, request: &InquiryCreateDBRequest) -> Result<Inquiry> {
        let mut state = self.state.lock().unwrap();
        if state.inquiries.iter().any(|i| i.submission_digest == request.submission_digest) {
            return Err(unique_violation(SUBMISSION_DIGEST_CONSTRAINT, "contact_inquiries"));
        }

        let now = Utc::now();
        let inquiry = Inquiry {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            hospital_name: request.hospital_name.clone(),
            inquiry_type: request.inquiry_type,
            content: request.content.clone(),
            status: InquiryStatus::Pending,
            submission_digest: request.submission_digest.clone(),
            admin_reply: None,
            replied_at: None,
            replied_by: None,
            created_at: now,
            updated_at: now,
        };
        state.inquiries.push(inquiry.clone());
        Ok(inquiry)
    }

    async fn get_inquiry(&self, id: InquiryId) -> Result<Option<Inquiry>> {
        Ok(self.state.lock().unwrap().inquiries.iter().find(|i| i.id == id).cloned())
    }

    async fn list_inquiries(&self, filter: &InquiryFilter) -> Result<Vec<Inquiry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .inquiries
            .iter()
            .rev()
            .filter(|i| filter.status.is_none_or(|status| i.status == status))
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_inquiry(&self, id: InquiryId, request: &InquiryUpdateDBRequest) -> Result<Inquiry> {
        let mut state = self.state.lock().unwrap();
        let inquiry = state.inquiries.iter_mut().find(|i| i.id == id).ok_or(DbError::NotFound)?;

        let now = Utc::now();
        if let Some(status) = request.status {
            inquiry.status = status;
        }
        if let Some(reply) = &request.reply {
            inquiry.admin_reply = Some(reply.message.clone());
            inquiry.replied_by = Some(reply.replied_by);
            inquiry.replied_at = Some(now);
        }
        inquiry.updated_at = now;
        Ok(inquiry.clone())
    }

    async fn process_payment_callback(&self, billing_id: BillingId, status: PaymentStatus, payment_ref: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.billing.iter_mut().find(|(id, row)| *id == billing_id && row.status == "pending") {
            Some((_, row)) => {
                row.status = status.as_str().to_string();
                row.payment_ref = Some(payment_ref.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_invite_code(&self, request: &InviteCodeCreateDBRequest) -> Result<InviteCode> {
        let mut state = self.state.lock().unwrap();
        if state.failing_code_inserts > 0 {
            state.failing_code_inserts -= 1;
            return Err(unique_violation(CODE_CONSTRAINT, "beta_invite_codes"));
        }
        if state.invite_codes.iter().any(|c| c.code == request.code) {
            return Err(unique_violation(CODE_CONSTRAINT, "beta_invite_codes"));
        }

        let code = InviteCode {
            id: Uuid::new_v4(),
            code: request.code.clone(),
            usage_mode: request.usage_mode,
            is_active: true,
            verify_count: 0,
            last_verified_at: None,
            used_at: None,
            used_by: None,
            memo: request.memo.clone(),
            created_by: request.created_by,
            created_at: Utc::now(),
        };
        state.invite_codes.push(code.clone());
        Ok(code)
    }

    async fn list_invite_codes(&self, filter: &InviteCodeFilter) -> Result<Vec<InviteCode>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .invite_codes
            .iter()
            .rev()
            .filter(|c| filter.is_active.is_none_or(|active| c.is_active == active))
            .cloned()
            .collect())
    }

    async fn update_invite_code(&self, id: InviteCodeId, request: &InviteCodeUpdateDBRequest) -> Result<InviteCode> {
        let mut state = self.state.lock().unwrap();
        let code = state.invite_codes.iter_mut().find(|c| c.id == id).ok_or(DbError::NotFound)?;
        code.is_active = request.is_active;
        Ok(code.clone())
    }

    async fn verify_invite_code(&self, code: &str) -> Result<InviteCodeVerification> {
        let mut state = self.state.lock().unwrap();
        let code = code.trim().to_uppercase();
        let Some(row) = state.invite_codes.iter_mut().find(|c| c.code == code) else {
            return Ok(InviteCodeVerification {
                valid: false,
                reason: Some("not_found".to_string()),
                usage_mode: None,
            });
        };

        let refusal = if !row.is_active {
            Some("inactive")
        } else if row.usage_mode == UsageMode::Single && row.used_at.is_some() {
            Some("already_used")
        } else if row.usage_mode == UsageMode::Single && row.verify_count > 0 {
            Some("already_verified")
        } else {
            None
        };

        if refusal.is_none() {
            row.verify_count += 1;
            row.last_verified_at = Some(Utc::now());
        }

        Ok(InviteCodeVerification {
            valid: refusal.is_none(),
            reason: refusal.map(str::to_string),
            usage_mode: Some(row.usage_mode),
        })
    }

    async fn consume_invite_code(&self, code: &str, user_id: UserId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let code = code.trim().to_uppercase();
        let row = state
            .invite_codes
            .iter_mut()
            .find(|c| c.code == code && c.is_active && (c.usage_mode == UsageMode::Unlimited || c.used_at.is_none()));

        match row {
            Some(row) => {
                row.used_at = Some(Utc::now());
                row.used_by = Some(user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_analysis_lead(&self, request: &AnalysisLeadCreateDBRequest) -> Result<AnalysisLead> {
        let lead = AnalysisLead {
            id: Uuid::new_v4(),
            email: request.email.clone(),
            hospital_name: request.hospital_name.clone(),
            score: request.score,
            report_text: request.report_text.clone(),
            consent: request.consent,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().leads.push(lead.clone());
        Ok(lead)
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>> {
        Ok(self.state.lock().unwrap().profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn get_hospital_name(&self, hospital_id: HospitalId) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.hospitals.iter().find(|(id, _)| *id == hospital_id).map(|(_, name)| name.clone()))
    }

    async fn create_member_invitation(&self, request: &MemberInvitationCreateDBRequest) -> Result<MemberInvitation> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        state.invitations.retain(|i| {
            !(i.hospital_id == request.hospital_id
                && i.accepted_at.is_none()
                && i.expires_at <= now
                && i.email.eq_ignore_ascii_case(&request.email))
        });

        let pending = state.invitations.iter().any(|i| {
            i.hospital_id == request.hospital_id && i.accepted_at.is_none() && i.email.eq_ignore_ascii_case(&request.email)
        });
        if pending {
            return Err(unique_violation(PENDING_INVITATION_CONSTRAINT, "member_invitations"));
        }

        let invitation = MemberInvitation {
            id: Uuid::new_v4(),
            hospital_id: request.hospital_id,
            email: request.email.clone(),
            name: request.name.clone(),
            role: request.role,
            token: request.token.clone(),
            invited_by: request.invited_by,
            expires_at: request.expires_at,
            accepted_at: None,
            created_at: now,
        };
        state.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn delete_member_invitation(&self, id: InvitationId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.invitations.len();
        state.invitations.retain(|i| i.id != id || i.accepted_at.is_some());
        Ok(state.invitations.len() < before)
    }

    async fn create_withdrawal_log(&self, request: &WithdrawalLogCreateDBRequest) -> Result<WithdrawalLog> {
        let log = WithdrawalLog {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            email: request.email.clone(),
            reason: request.reason.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().withdrawal_logs.push(log.clone());
        Ok(log)
    }

    async fn record_geo_access(&self, request: &GeoAccessLogCreateDBRequest) -> Result<()> {
        self.state.lock().unwrap().geo_access_logs.push(request.clone());
        Ok(())
    }
}

/// The real router over a [`MemoryStore`], with mail written to a private temp directory.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub config: Config,
    mail_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_config(mut config: Config) -> Self {
        let mail_dir = tempfile::tempdir().expect("Failed to create mail directory");
        config.email.transport = EmailTransportConfig::File {
            path: mail_dir.path().to_string_lossy().to_string(),
        };

        let store = Arc::new(MemoryStore::new());
        let state = AppState::builder()
            .config(config.clone())
            .store(store.clone() as Arc<dyn Store>)
            .email(Arc::new(EmailService::new(&config).expect("Failed to create email service")))
            .notifier(Arc::new(ChatNotifier::new(&config.notifications).expect("Failed to create notifier")))
            .build();

        let router = crate::build_router(&state).expect("Failed to build router");
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            config,
            mail_dir,
        }
    }

    /// `Authorization` header value for the given user
    pub fn bearer(&self, user_id: UserId) -> String {
        let token = create_access_token(user_id, None, &self.config.auth).expect("Failed to sign access token");
        format!("Bearer {token}")
    }

    /// Seed a profile and return it with its `Authorization` header value
    pub fn signed_in(&self, role: ProfileRole, hospital_id: Option<HospitalId>) -> (Profile, String) {
        let profile = self.store.add_profile(role, hospital_id);
        let bearer = self.bearer(profile.id);
        (profile, bearer)
    }

    /// Replace the mail directory with a plain file so every send fails
    pub fn break_mail_transport(&self) {
        let path = self.mail_dir.path();
        std::fs::remove_dir_all(path).expect("Failed to remove mail directory");
        std::fs::write(path, b"").expect("Failed to block mail directory");
    }

    pub fn restore_mail_transport(&self) {
        let path = self.mail_dir.path();
        std::fs::remove_file(path).expect("Failed to unblock mail directory");
        std::fs::create_dir(path).expect("Failed to recreate mail directory");
    }

    /// Raw messages written by the file mail transport
    pub fn sent_emails(&self) -> Vec<String> {
        read_emails(self.mail_dir.path())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn read_emails(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "eml"))
        .filter_map(|entry| std::fs::read_to_string(entry.path()).ok())
        .collect()
}
