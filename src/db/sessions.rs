use std::fmt;
use std::path::Path;

use anyhow::Result;
use bincode::{
    config::{BigEndian, WithOtherEndian},
    DefaultOptions, Options,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sled::Db as Sled;
use uuid::Uuid;

use crate::backend::AuthSession;

const PREFIX: &str = "session:";

/// Opaque id handed to the browser in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);
impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
    /// Anything that is not a uuid is treated as no session at all.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
    fn key(&self) -> String {
        format!("{}{}", PREFIX, self.0)
    }
}
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub auth: AuthSession,
    pub created_at: DateTime<Utc>,
}

/// Server-side session storage: session id -> backend tokens.
#[derive(Clone)]
pub struct SessionStore {
    handle: Sled,
    encoder: WithOtherEndian<DefaultOptions, BigEndian>,
}
impl SessionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let handle = sled::open(path)?;
        let encoder = bincode::options().with_big_endian();
        Ok(Self { handle, encoder })
    }

    pub fn create(&self, auth: AuthSession) -> Result<SessionId> {
        let id = SessionId::generate();
        let stored = StoredSession {
            auth,
            created_at: Utc::now(),
        };
        self.write(&id, &stored)?;
        Ok(id)
    }
    pub fn get(&self, id: &SessionId) -> Result<Option<StoredSession>> {
        let value = match self.handle.get(id.key())? {
            Some(value) => value,
            None => return Ok(None),
        };
        Ok(Some(self.encoder.deserialize(&value)?))
    }
    /// Swaps in refreshed tokens, keeping the original creation time.
    pub fn replace(&self, id: &SessionId, auth: AuthSession) -> Result<Option<StoredSession>> {
        let Some(mut stored) = self.get(id)? else {
            return Ok(None);
        };
        stored.auth = auth;
        self.write(id, &stored)?;
        Ok(Some(stored))
    }
    pub fn remove(&self, id: &SessionId) -> Result<()> {
        self.handle.remove(id.key())?;
        Ok(())
    }

    /// Drops sessions created more than `max_age` before `now`, plus any entry
    /// that no longer decodes. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>, max_age: Duration) -> Result<usize> {
        let mut stale = Vec::new();
        for item in self.handle.scan_prefix(PREFIX) {
            let (key, value) = item?;
            match self.encoder.deserialize::<StoredSession>(&value) {
                Ok(stored) if stored.created_at + max_age > now => {}
                Ok(_) => stale.push(key),
                Err(err) => {
                    tracing::warn!("dropping undecodable session entry: {}", err);
                    stale.push(key);
                }
            }
        }
        for key in &stale {
            self.handle.remove(key)?;
        }
        self.handle.flush()?;
        Ok(stale.len())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handle.scan_prefix(PREFIX).count()
    }

    fn write(&self, id: &SessionId, stored: &StoredSession) -> Result<()> {
        let value = self.encoder.serialize(stored)?;
        self.handle.insert(id.key(), value)?;
        Ok(())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish()
    }
}
