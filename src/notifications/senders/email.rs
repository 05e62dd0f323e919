use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{NotificationSender, SenderError};
use crate::db::enums::ChannelType;
use crate::notifications::models::{ChannelConfig, EmailSecurity};

/// Sends notifications over SMTP.
#[derive(Default)]
pub struct EmailSender;

impl EmailSender {
    pub fn new() -> Self {
        Self
    }
}

/// Resolves `Auto` to a concrete mode: port 465 means implicit TLS, anything
/// else (587, 25) means STARTTLS.
fn effective_security(security: EmailSecurity, port: u16) -> EmailSecurity {
    match security {
        EmailSecurity::Auto => {
            if port == 465 {
                EmailSecurity::Tls
            } else {
                EmailSecurity::Starttls
            }
        }
        other => other,
    }
}

fn build_transport(
    host: &str,
    port: u16,
    security: EmailSecurity,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, SenderError> {
    let mut builder = match effective_security(security, port) {
        EmailSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
        EmailSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
        EmailSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        // effective_security never returns Auto.
        EmailSecurity::Auto => unreachable!(),
    };
    builder = builder.port(port);

    if let (Some(user), Some(password)) = (user, password) {
        if !user.is_empty() {
            builder = builder.credentials(Credentials::new(user.to_string(), password.to_string()));
        }
    }

    Ok(builder.build())
}

#[async_trait]
impl NotificationSender for EmailSender {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Email
    }

    fn is_configured(&self, config: &ChannelConfig) -> bool {
        matches!(
            config,
            ChannelConfig::Email {
                smtp_host,
                from_email,
                to_email,
                ..
            } if !smtp_host.is_empty() && !from_email.is_empty() && !to_email.is_empty()
        )
    }

    async fn send(
        &self,
        config: &ChannelConfig,
        subject: &str,
        message: &str,
    ) -> Result<(), SenderError> {
        let (host, port, security, from, to, user, password) = match config {
            ChannelConfig::Email {
                smtp_host,
                smtp_port,
                security,
                from_email,
                to_email,
                smtp_user,
                smtp_password,
            } => (
                smtp_host,
                *smtp_port,
                *security,
                from_email,
                to_email,
                smtp_user.as_deref(),
                smtp_password.as_deref(),
            ),
            _ => {
                return Err(SenderError::InvalidConfiguration(
                    "Expected Email config, but found a different type.".to_string(),
                ));
            }
        };

        let email = Message::builder()
            .from(from
                .parse()
                .map_err(|e| SenderError::InvalidConfiguration(format!("from address: {e}")))?)
            .to(to
                .parse()
                .map_err(|e| SenderError::InvalidConfiguration(format!("to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())?;

        let transport = build_transport(host, port, security, user, password)?;
        transport.send(email).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_security_keys_off_the_port() {
        assert_eq!(
            effective_security(EmailSecurity::Auto, 465),
            EmailSecurity::Tls
        );
        assert_eq!(
            effective_security(EmailSecurity::Auto, 587),
            EmailSecurity::Starttls
        );
        assert_eq!(
            effective_security(EmailSecurity::Auto, 25),
            EmailSecurity::Starttls
        );
        assert_eq!(
            effective_security(EmailSecurity::None, 465),
            EmailSecurity::None
        );
    }

    #[test]
    fn configured_requires_host_and_addresses() {
        let sender = EmailSender::new();
        let config = ChannelConfig::Email {
            smtp_host: "mail.example.com".to_string(),
            smtp_port: 587,
            security: EmailSecurity::Auto,
            from_email: "homedash@example.com".to_string(),
            to_email: "admin@example.com".to_string(),
            smtp_user: None,
            smtp_password: None,
        };
        assert!(sender.is_configured(&config));

        let missing_host = ChannelConfig::Email {
            smtp_host: String::new(),
            smtp_port: 587,
            security: EmailSecurity::Auto,
            from_email: "homedash@example.com".to_string(),
            to_email: "admin@example.com".to_string(),
            smtp_user: None,
            smtp_password: None,
        };
        assert!(!sender.is_configured(&missing_host));
    }
}
