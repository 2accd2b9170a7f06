//! Server configuration.
//!
//! Loaded from `todo-htmx.toml` in the working directory (or the file named by
//! `TODO_HTMX_CONFIG`); environment variables override file settings.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "todo-htmx.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server listens on (default: "0.0.0.0:3000")
    pub bind: String,
    pub supabase: SupabaseConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://xyz.supabase.co
    pub url: String,
    /// Public anon key
    pub anon_key: String,
    /// Table holding the todo rows (default: "todos")
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory of the sled session store (default: "sessions.db")
    pub db_path: PathBuf,
    /// Stored sessions older than this are purged (default: 30)
    pub max_age_days: i64,
    /// Mark the session cookie `Secure` (default: false)
    pub cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            supabase: SupabaseConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            table: "todos".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("sessions.db"),
            max_age_days: 30,
            cookie_secure: false,
        }
    }
}

impl Config {
    /// File (if any) + environment, then validated.
    pub fn load() -> Result<Self> {
        let path = std::env::var("TODO_HTMX_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, var: F) {
        if let Some(url) = var("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Some(key) = var("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = key;
        }
        if let Some(bind) = var("TODO_HTMX_BIND") {
            self.bind = bind;
        }
        if let Some(path) = var("TODO_HTMX_SESSION_DB") {
            self.session.db_path = PathBuf::from(path);
        }
        if let Some(secure) = var("TODO_HTMX_COOKIE_SECURE") {
            self.session.cookie_secure = matches!(secure.trim(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.supabase.url.trim().is_empty() {
            bail!("Supabase URL is not configured (set SUPABASE_URL or [supabase] url)");
        }
        if self.supabase.anon_key.trim().is_empty() {
            bail!("Supabase anon key is not configured (set SUPABASE_ANON_KEY or [supabase] anon_key)");
        }
        if self.session.max_age_days <= 0 {
            bail!("session.max_age_days must be positive");
        }
        Ok(())
    }
}
