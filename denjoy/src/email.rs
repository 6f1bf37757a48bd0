//! Email service for inquiry replies, member invitations, analysis reports and operations notices.

use chrono::{DateTime, Utc};
use lettre::{
    Address, AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use minijinja::context;
use std::path::Path;
use tracing::{debug, instrument};

use crate::{
    config::{Config, EmailTransportConfig},
    db::models::{inquiries::Inquiry, member_invitations::MemberRole, withdrawal_logs::WithdrawalLog},
    errors::Error,
    reports::AnalysisReport,
    templates::Templates,
};

pub struct EmailService {
    transport: EmailTransport,
    from: Mailbox,
    reply_to: Option<Mailbox>,
    admin_email: Option<String>,
    site_url: String,
    templates: Templates,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// Details of a member invitation needed for the email
#[derive(Debug, Clone)]
pub struct InvitationEmail<'a> {
    pub to_email: &'a str,
    pub to_name: &'a str,
    pub inviter_name: &'a str,
    pub hospital_name: Option<&'a str>,
    pub role: MemberRole,
    pub token: &'a str,
    pub expires_at: DateTime<Utc>,
}

fn mailbox(name: Option<&str>, email: &str) -> Result<Mailbox, Error> {
    let address = email.parse::<Address>().map_err(|e| Error::Internal {
        operation: format!("parse email address: {e}"),
    })?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        let reply_to = email_config.reply_to.as_deref().map(|addr| mailbox(None, addr)).transpose()?;

        Ok(Self {
            transport,
            from: mailbox(Some(email_config.from_name.as_str()), &email_config.from_email)?,
            reply_to,
            admin_email: email_config.admin_email.clone(),
            site_url: config.site_url.trim_end_matches('/').to_string(),
            templates: Templates::new()?,
        })
    }

    /// Operations mailbox for internal notices, if configured
    pub fn admin_email(&self) -> Option<&str> {
        self.admin_email.as_deref()
    }

    pub fn invitation_link(&self, token: &str) -> String {
        format!("{}/invite?token={}", self.site_url, token)
    }

    #[instrument(skip_all, err)]
    pub async fn send_inquiry_reply(&self, inquiry: &Inquiry, reply_message: &str) -> Result<(), Error> {
        let body = self.render_inquiry_reply(inquiry, reply_message)?;
        self.send_email(&inquiry.email, Some(inquiry.name.as_str()), "Re: Your DenJOY inquiry", &body)
            .await
    }

    #[instrument(skip_all, err)]
    pub async fn send_member_invitation(&self, invitation: &InvitationEmail<'_>) -> Result<(), Error> {
        let body = self.render_member_invitation(invitation)?;
        self.send_email(invitation.to_email, Some(invitation.to_name), "You're invited to DenJOY", &body)
            .await
    }

    #[instrument(skip_all, err)]
    pub async fn send_analysis_report(&self, to_email: &str, hospital_name: Option<&str>, report: &AnalysisReport) -> Result<(), Error> {
        let body = self.render_analysis_report(hospital_name, report)?;
        self.send_email(to_email, None, "Your DenJOY inventory analysis", &body).await
    }

    /// Notify the operations mailbox of an account withdrawal. No-op without `email.admin_email`.
    #[instrument(skip_all, err)]
    pub async fn send_withdrawal_notice(&self, log: &WithdrawalLog) -> Result<(), Error> {
        let Some(admin_email) = self.admin_email.as_deref() else {
            debug!("email.admin_email not set, skipping withdrawal notice");
            return Ok(());
        };
        let body = self.templates.render(
            "withdrawal_notice.html",
            context! {
                user_id => log.user_id.to_string(),
                email => log.email,
                reason => log.reason,
                created_at => log.created_at.to_rfc3339(),
            },
        )?;
        self.send_email(admin_email, None, "[DenJOY] Account withdrawal", &body).await
    }

    fn render_inquiry_reply(&self, inquiry: &Inquiry, reply_message: &str) -> Result<String, Error> {
        self.templates.render(
            "inquiry_reply.html",
            context! {
                name => inquiry.name,
                inquiry_type => inquiry.inquiry_type.label(),
                reply_message => reply_message,
                original_content => inquiry.content,
                site_url => self.site_url,
            },
        )
    }

    fn render_member_invitation(&self, invitation: &InvitationEmail<'_>) -> Result<String, Error> {
        self.templates.render(
            "member_invitation.html",
            context! {
                name => invitation.to_name,
                inviter_name => invitation.inviter_name,
                hospital_name => invitation.hospital_name,
                role => invitation.role,
                invite_link => self.invitation_link(invitation.token),
                expires_at => invitation.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            },
        )
    }

    fn render_analysis_report(&self, hospital_name: Option<&str>, report: &AnalysisReport) -> Result<String, Error> {
        self.templates.render(
            "analysis_report.html",
            context! {
                report => report,
                hospital_name => hospital_name,
                site_url => self.site_url,
            },
        )
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let to = mailbox(to_name, to_email)?;

        let mut builder = Message::builder().from(self.from.clone()).to(to).subject(subject);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        Ok(())
    }
}
