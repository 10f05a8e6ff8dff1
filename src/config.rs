//! Environment configuration.
//!
//! Values come from the process environment (after `.env` is loaded by
//! `dotenvy` in `main`). Only `DATABASE_URL` is mandatory.

use anyhow::{Context, Result};
use std::str::FromStr;

use crate::domain::aggregates::CartAddPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub nats_url: Option<String>,
    pub cart_add_policy: CartAddPolicy,
    pub token_ttl: chrono::Duration,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let token_ttl_days: i64 = parse_or(&get, "TOKEN_TTL_DAYS", 7)?;
        if token_ttl_days < 1 {
            anyhow::bail!("TOKEN_TTL_DAYS must be at least 1, got {token_ttl_days}");
        }

        Ok(Self {
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8083)?,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            nats_url: get("NATS_URL"),
            cart_add_policy: parse_or(&get, "CART_ADD_POLICY", CartAddPolicy::Append)?,
            token_ttl: chrono::Duration::days(token_ttl_days),
            seed_demo_data: parse_or(&get, "SEED_DEMO_DATA", false)?,
        })
    }

    pub fn bind_address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: `{raw}`")),
        None => Ok(default),
    }
}
