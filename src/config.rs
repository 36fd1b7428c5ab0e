use std::env;

use crate::auth::VerifiedIdentity;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auth_tokens: Vec<(String, VerifiedIdentity)>,
    pub seed_defaults: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:fitlog.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            auth_tokens: parse_auth_tokens(&env::var("AUTH_TOKENS").unwrap_or_default()),
            seed_defaults: env::var("SEED_DEFAULTS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `token=subject[:email]` entries separated by commas.
/// Malformed entries are skipped.
pub fn parse_auth_tokens(raw: &str) -> Vec<(String, VerifiedIdentity)> {
    raw.split(',')
        .filter_map(|entry| {
            let (token, identity) = entry.trim().split_once('=')?;
            let (subject, email) = match identity.split_once(':') {
                Some((subject, email)) => (subject.trim(), Some(email.trim().to_string())),
                None => (identity.trim(), None),
            };
            if token.trim().is_empty() || subject.is_empty() {
                return None;
            }
            Some((
                token.trim().to_string(),
                VerifiedIdentity {
                    subject: subject.to_string(),
                    email: email.filter(|e| !e.is_empty()),
                    name: None,
                },
            ))
        })
        .collect()
}
