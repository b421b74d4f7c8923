// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auth configuration.
//!
//! Configuration is an explicit value passed to the managers at construction.
//! Durations are written as humantime strings (`15m`, `168h`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use gatekeep_core::ConfigError;

/// Prefix for every environment variable read by [`AuthConfig::from_env`].
pub const ENV_PREFIX: &str = "GATEKEEP_";

/// Longest accepted token lifetime (ten years).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

// =============================================================================
// AuthConfig
// =============================================================================

/// Top-level auth configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token signing and expiry.
    pub token: TokenConfig,
    /// Password hashing cost.
    pub password: PasswordConfig,
    /// Session activity tracking.
    pub activity: ActivityConfig,
}

impl AuthConfig {
    /// Creates a configuration with the given signing secret and defaults elsewhere.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: TokenConfig::new(secret),
            ..Default::default()
        }
    }

    /// Sets the token configuration.
    pub fn with_token(mut self, token: TokenConfig) -> Self {
        self.token = token;
        self
    }

    /// Sets the password configuration.
    pub fn with_password(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    /// Sets the activity configuration.
    pub fn with_activity(mut self, activity: ActivityConfig) -> Self {
        self.activity = activity;
        self
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.token.validate()?;
        self.password.validate()?;
        self.activity.validate()?;
        Ok(())
    }

    /// Builds a configuration from `GATEKEEP_*` environment variables.
    ///
    /// Unset variables keep their defaults; the JWT secret is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Keys are the full variable names, prefix included.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        config.token.secret = get("JWT_SECRET").ok_or_else(|| ConfigError::missing("JWT_SECRET"))?;
        if let Some(issuer) = get("JWT_ISSUER") {
            config.token.issuer = issuer;
        }
        if let Some(v) = get("JWT_ACCESS_TOKEN_EXPIRY") {
            config.token.access_ttl = parse_duration("JWT_ACCESS_TOKEN_EXPIRY", &v)?;
        }
        if let Some(v) = get("JWT_REFRESH_TOKEN_EXPIRY") {
            config.token.refresh_ttl = parse_duration("JWT_REFRESH_TOKEN_EXPIRY", &v)?;
        }
        if let Some(v) = get("JWT_LEEWAY_SECS") {
            config.token.leeway_secs = parse_number("JWT_LEEWAY_SECS", &v)?;
        }
        if let Some(v) = get("PASSWORD_MEMORY_KIB") {
            config.password.memory_kib = parse_number("PASSWORD_MEMORY_KIB", &v)?;
        }
        if let Some(v) = get("PASSWORD_ITERATIONS") {
            config.password.iterations = parse_number("PASSWORD_ITERATIONS", &v)?;
        }
        if let Some(v) = get("PASSWORD_PARALLELISM") {
            config.password.parallelism = parse_number("PASSWORD_PARALLELISM", &v)?;
        }
        if let Some(v) = get("ACTIVITY_QUEUE_CAPACITY") {
            config.activity.queue_capacity = parse_number("ACTIVITY_QUEUE_CAPACITY", &v)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::invalid(field, e.to_string()))
}

fn parse_number<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(field, e.to_string()))
}

// =============================================================================
// TokenConfig
// =============================================================================

/// Token signing and expiry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC secret for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Issuer written to and required on every token.
    pub issuer: String,
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: Duration,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: "gatekeep".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(168 * 3600),
            leeway_secs: 0,
        }
    }
}

impl TokenConfig {
    /// Creates a configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Sets the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::invalid("token.secret", "must not be empty"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::invalid("token.issuer", "must not be empty"));
        }
        if self.access_ttl.is_zero() {
            return Err(ConfigError::invalid("token.access_ttl", "must be positive"));
        }
        if self.refresh_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::invalid(
                "token.refresh_ttl",
                format!("must not exceed {}", humantime::format_duration(MAX_TOKEN_TTL)),
            ));
        }
        if self.access_ttl >= self.refresh_ttl {
            return Err(ConfigError::invalid(
                "token.access_ttl",
                "must be shorter than token.refresh_ttl",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// PasswordConfig
// =============================================================================

/// Argon2id cost parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Iteration (time) cost.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_kib == 0 {
            return Err(ConfigError::invalid("password.memory_kib", "must be positive"));
        }
        if self.iterations == 0 {
            return Err(ConfigError::invalid("password.iterations", "must be positive"));
        }
        if self.parallelism == 0 {
            return Err(ConfigError::invalid("password.parallelism", "must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// ActivityConfig
// =============================================================================

/// Session activity tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Pending last-seen updates kept before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

impl ActivityConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid("activity.queue_capacity", "must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// Duration Serialization
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
