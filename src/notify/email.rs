use anyhow::{Context, Result};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{DigestMessage, Notifier};

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} missing"))
}

/// SMTP delivery. The digest goes to `DIGEST_EMAIL_TO` with every
/// `DIGEST_EMAIL_BCC` address blind-copied.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    bcc: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn from_env() -> Result<Self> {
        let host = env_required("SMTP_HOST")?;
        let user = env_required("SMTP_USER")?;
        let pass = env_required("SMTP_PASS")?;
        let from_addr = env_required("DIGEST_EMAIL_FROM")?;
        let to_addr = std::env::var("DIGEST_EMAIL_TO").unwrap_or_else(|_| from_addr.clone());
        let bcc_raw = std::env::var("DIGEST_EMAIL_BCC").unwrap_or_default();

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr.parse().context("invalid DIGEST_EMAIL_FROM")?;
        let to = to_addr.parse().context("invalid DIGEST_EMAIL_TO")?;
        let bcc = parse_mailbox_list(&bcc_raw).context("invalid DIGEST_EMAIL_BCC")?;

        Ok(Self {
            mailer,
            from,
            to,
            bcc,
        })
    }

    fn build_message(&self, msg: &DigestMessage) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(msg.subject.clone());
        for b in &self.bcc {
            builder = builder.bcc(b.clone());
        }
        builder
            .multipart(MultiPart::alternative_plain_html(
                msg.text.clone(),
                msg.html.clone(),
            ))
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, msg: &DigestMessage) -> Result<()> {
        let email = self.build_message(msg)?;
        self.mailer.send(email).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

/// Comma-separated addresses; blanks are skipped.
pub fn parse_mailbox_list(raw: &str) -> Result<Vec<Mailbox>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Mailbox>().with_context(|| format!("bad address `{s}`")))
        .collect()
}
