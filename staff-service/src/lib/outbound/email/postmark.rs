use async_trait::async_trait;
use reqwest::Client;
use reqwest::Url;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::domain::auth::ports::EmailSender;
use crate::domain::credential::models::EmailAddress;
use crate::domain::errors::AuthError;

const MESSAGE_STREAM: &str = "outbound";
const POSTMARK_AUTH_HEADER: &str = "X-Postmark-Server-Token";

/// Postmark HTTP email adapter.
pub struct PostmarkEmailSender {
    http_client: Client,
    base_url: String,
    sender: String,
    server_token: String,
}

impl PostmarkEmailSender {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: config.base_url.clone(),
            sender: config.sender.clone(),
            server_token: config.server_token.clone(),
        }
    }

    async fn send(&self, to: &EmailAddress, subject: &str, body: &str) -> Result<(), AuthError> {
        let base = Url::parse(&self.base_url).map_err(|e| AuthError::Email(e.to_string()))?;
        let url = base
            .join("/email")
            .map_err(|e| AuthError::Email(e.to_string()))?;

        let request_body = SendEmailRequest {
            from: &self.sender,
            to: to.as_str(),
            subject,
            text_body: body,
            message_stream: MESSAGE_STREAM,
        };

        self.http_client
            .post(url)
            .header(POSTMARK_AUTH_HEADER, &self.server_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AuthError::Email(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::Email(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl EmailSender for PostmarkEmailSender {
    #[tracing::instrument(name = "Sending activation email", skip_all)]
    async fn send_activation_email<'a>(
        &self,
        to: &'a EmailAddress,
        name: &'a str,
        token: &'a str,
        temp_password: Option<&'a str>,
    ) -> Result<(), AuthError> {
        let body = match temp_password {
            Some(password) => format!(
                "Hello {name},\n\nAn account has been created for you. \
                 Your temporary password is: {password}\n\n\
                 Activate your account with this token: {token}\n"
            ),
            None => format!(
                "Hello {name},\n\nVerify your email address with this token: {token}\n"
            ),
        };
        self.send(to, "Activate your account", &body).await
    }

    #[tracing::instrument(name = "Sending recovery email", skip_all)]
    async fn send_recovery_email(
        &self,
        to: &EmailAddress,
        name: &str,
        token: &str,
    ) -> Result<(), AuthError> {
        let body = format!(
            "Hello {name},\n\nReset your password with this token: {token}\n\n\
             If you did not request this, you can ignore this email.\n"
        );
        self.send(to, "Password recovery", &body).await
    }

    #[tracing::instrument(name = "Sending two-factor code", skip_all)]
    async fn send_two_factor_code(&self, to: &EmailAddress, code: &str) -> Result<(), AuthError> {
        let body = format!("Your verification code is: {code}\n\nIt expires in 5 minutes.\n");
        self.send(to, "Your verification code", &body).await
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
    message_stream: &'a str,
}
