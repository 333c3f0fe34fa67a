// src/services/notification.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Entrega das credenciais de uma criança convidada, fora da API.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invitation(&self, to: &str, password: &str) -> Result<()>;
}

pub fn invitation_subject() -> &'static str {
    "Convite para participar da kermesse"
}

pub fn invitation_html(email: &str, password: &str) -> String {
    format!(
        "<p>Seus responsáveis convidaram você para participar da kermesse.</p>\
         <p>Suas credenciais de acesso:</p>\
         <p>E-mail: {email}</p>\
         <p>Senha: {password}</p>"
    )
}

// ---
// Resend (HTTP)
// ---

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

pub struct ResendNotifier {
    api_key: String,
    from_email: String,
    client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(api_key: String, from_email: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Falha ao criar o cliente HTTP")?;

        Ok(Self { api_key, from_email, client })
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send_invitation(&self, to: &str, password: &str) -> Result<()> {
        let email = ResendEmail {
            from: &self.from_email,
            to: [to],
            subject: invitation_subject(),
            html: invitation_html(to, password),
        };

        self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .context("Falha ao chamar o Resend")?
            .error_for_status()
            .context("Resend recusou o envio")?;

        Ok(())
    }
}

// ---
// Sem chave configurada: só registra no log (ambiente de desenvolvimento)
// ---

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_invitation(&self, to: &str, password: &str) -> Result<()> {
        tracing::info!("Convite para {} (senha provisória: {})", to, password);
        Ok(())
    }
}
