use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub mongo: MongoConfig,
    pub store_timeout: Duration,
    pub connect_timeout: Duration,

    pub users_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// One entry of the users file.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    /// argon2 PHC string, e.g. `$argon2id$v=19$...`
    pub password_hash: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.into())
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

fn secs(name: &str, default: u64) -> anyhow::Result<Duration> {
    let value = var_or(name, &default.to_string());
    let secs = value
        .parse()
        .with_context(|| format!("{name} must be a number of seconds, got {value:?}"))?;
    Ok(Duration::from_secs(secs))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = var_or("ENVIRONMENT", "dev");
        let port = var_or("PORT", "8080");

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("PORT must be a number, got {port:?}"))?,

            mongo: MongoConfig {
                uri: env::var("MONGODB_URI").context("MONGODB_URI must be set")?,
                database: var_or("MONGODB_DATABASE", "myday"),
                username: non_empty("MONGODB_USERNAME"),
                password: non_empty("MONGODB_PASSWORD"),
            },
            store_timeout: secs("STORE_TIMEOUT_SECS", 5)?,
            connect_timeout: secs("CONNECT_TIMEOUT_SECS", 10)?,

            users_file: non_empty("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("users.{environment}.json"))),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn load_users(&self) -> anyhow::Result<Vec<UserCredentials>> {
        tracing::info!("Loading users from {}", self.users_file.display());
        let raw = std::fs::read_to_string(&self.users_file)
            .with_context(|| format!("failed to read {}", self.users_file.display()))?;
        parse_users(&raw)
    }
}

pub fn parse_users(raw: &str) -> anyhow::Result<Vec<UserCredentials>> {
    serde_json::from_str(raw)
        .context("users file must be a JSON array of {username, password_hash}")
}
