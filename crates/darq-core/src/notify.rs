//! Notification Composition & Delivery
//!
//! Renders the owner / no-owner email bodies from external template
//! resources and dispatches them through the mail relay. Template content
//! stays out of control flow; rendering is plain `{{variable}}`
//! substitution.

use crate::directory::{ManagerProfile, UserProfile};
use crate::error::DarqError;
use crate::incident::EnrichedIncident;
use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const OWNER_TEXT: &str = include_str!("../templates/owner.txt");
const OWNER_HTML: &str = include_str!("../templates/owner.html");
const NO_OWNER_TEXT: &str = include_str!("../templates/no_owner.txt");
const NO_OWNER_HTML: &str = include_str!("../templates/no_owner.html");

const OWNER_SUBJECT: &str = "NOTICE: Your file has been quarantined";
const NO_OWNER_SUBJECT: &str = "NOTICE: A file has been quarantined";

const TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Substitute `{{key}}` placeholders.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

/// A composed multipart notification, ready for transport.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    /// Always-notified security mailbox.
    pub bcc: String,
    pub text_body: String,
    pub html_body: String,
}

/// Builds the two notification variants.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    pub from_address: String,
    pub security_mailbox: String,
    pub admin_mailbox: String,
    pub policy_url: String,
}

impl NotificationComposer {
    /// Owner branch: addressed to the resolved owner, manager on copy when
    /// resolved, security mailbox always on the recipient list.
    pub fn owner_notice(
        &self,
        incident: &EnrichedIncident,
        user: &UserProfile,
        manager: Option<&ManagerProfile>,
    ) -> Notification {
        let manager_name = manager.map(|m| m.name.clone()).unwrap_or_else(|| "unknown".into());
        let mut vars = self.common_vars(incident);
        vars.extend([
            ("user_name", user.full_name.clone()),
            ("manager_name", manager_name),
            ("user_phone", user.phone.clone()),
            ("user_title", user.title.clone()),
            ("user_department", user.department.clone()),
            ("folder_path", incident.display_folder_path.clone()),
            ("tombstone_file", format!("{}.txt", incident.display_file_name)),
            ("matched_samples", incident.record.matched_samples.join(", ")),
        ]);

        Notification {
            subject: OWNER_SUBJECT.to_string(),
            from: self.from_address.clone(),
            to: user.email.clone(),
            cc: manager.filter(|m| !m.email.is_empty()).map(|m| m.email.clone()),
            bcc: self.security_mailbox.clone(),
            text_body: render(OWNER_TEXT, &vars),
            html_body: render(OWNER_HTML, &vars),
        }
    }

    /// No-owner branch: addressed to the fixed administrative mailbox.
    pub fn no_owner_notice(&self, incident: &EnrichedIncident) -> Notification {
        let vars = self.common_vars(incident);

        Notification {
            subject: NO_OWNER_SUBJECT.to_string(),
            from: self.from_address.clone(),
            to: self.admin_mailbox.clone(),
            cc: None,
            bcc: self.security_mailbox.clone(),
            text_body: render(NO_OWNER_TEXT, &vars),
            html_body: render(NO_OWNER_HTML, &vars),
        }
    }

    fn common_vars(&self, incident: &EnrichedIncident) -> Vec<(&'static str, String)> {
        let rec = &incident.record;
        vec![
            ("detect_date", rec.detect_time.format(TIME_FORMAT).to_string()),
            ("incident_id", rec.incident_id.clone()),
            ("severity", incident.severity.to_string()),
            ("matches", rec.max_matches().to_string()),
            ("accessed_date", rec.accessed_time.format(TIME_FORMAT).to_string()),
            ("modified_date", rec.modified_time.format(TIME_FORMAT).to_string()),
            ("analyzed_by", rec.analyzed_by.clone()),
            ("user_id", rec.owner_id.clone()),
            ("file_path", rec.file_path.clone()),
            ("deletion_date", incident.deletion_date.clone()),
            ("policy_url", self.policy_url.clone()),
            ("rules", incident.rule_names.join(", ")),
            ("classifiers", incident.classifier_names.join(", ")),
        ]
    }
}

/// Mail transport boundary.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DarqError>;
}

/// SMTP relay transport. The relay accepts unauthenticated plaintext
/// submissions from inside the network, matching the gateway it replaces.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(relay_host: &str, relay_port: u16) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(relay_host)
            .port(relay_port)
            .build();
        Self { transport }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), DarqError> {
        let parse = |addr: &str| {
            addr.parse::<lettre::message::Mailbox>()
                .map_err(|e| DarqError::Mail(format!("bad address '{addr}': {e}")))
        };

        let mut builder = Message::builder()
            .from(parse(&notification.from)?)
            .to(parse(&notification.to)?)
            .bcc(parse(&notification.bcc)?)
            .subject(notification.subject.clone());
        if let Some(cc) = &notification.cc {
            builder = builder.cc(parse(cc)?);
        }

        let message = builder
            .multipart(MultiPart::alternative_plain_html(
                notification.text_body.clone(),
                notification.html_body.clone(),
            ))
            .map_err(|e| DarqError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DarqError::Mail(e.to_string()))?;
        tracing::info!(to = %notification.to, subject = %notification.subject, "notification sent");
        Ok(())
    }
}
