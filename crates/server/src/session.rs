//! Server-side sessions keyed by a random id carried in an HMAC-signed cookie.
//!
//! The browser only ever sees `<id>.<hex mac>`; the bound index name stays in
//! process memory and expires after the configured TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use tokio::sync::RwLock;
use tracing::debug;

pub const COOKIE_NAME: &str = "pdfqa_session";

const ID_BYTES: usize = 32;

type HmacSha256 = Hmac<Sha256>;

struct SessionEntry {
    index_name: String,
    expires_at: Instant,
}

/// Result of binding an index to a session.
#[derive(Debug)]
pub struct Binding {
    pub session_id: String,
    /// Index names no live session refers to anymore: the session's previous
    /// index and those of expired sessions.
    pub released: Vec<String>,
}

pub struct SessionStore {
    mac: HmacSha256,
    ttl: Duration,
    secure_cookie: bool,
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration, secure_cookie: bool) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid session secret: {e}"))?;
        Ok(Self {
            mac,
            ttl,
            secure_cookie,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Session id from a validly signed cookie, if any.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == COOKIE_NAME)
            .and_then(|(_, value)| self.verify(value))
    }

    /// Index bound to the session, unless absent or expired.
    ///
    /// Expired entries stay in place until the next `bind_index` purges them,
    /// so their index names can be handed back for cleanup.
    pub async fn index_name(&self, session_id: &str) -> Option<String> {
        let entries = self.entries.read().await;
        match entries.get(session_id) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.index_name.clone()),
            Some(_) => {
                debug!(component = "session", "session expired");
                None
            }
            None => None,
        }
    }

    /// Bind `index_name`, replacing any earlier binding. Reuses the caller's
    /// session when it has one, otherwise mints a new id. Expired sessions are
    /// purged on the way.
    pub async fn bind_index(&self, session_id: Option<String>, index_name: String) -> Binding {
        let id = session_id.unwrap_or_else(new_session_id);
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let mut dropped: Vec<String> = Vec::new();
        entries.retain(|key, entry| {
            let keep = entry.expires_at > now && *key != id;
            if !keep {
                dropped.push(entry.index_name.clone());
            }
            keep
        });
        entries.insert(
            id.clone(),
            SessionEntry {
                index_name,
                expires_at: now + self.ttl,
            },
        );

        let mut released: Vec<String> = Vec::new();
        for name in dropped {
            let in_use = entries.values().any(|e| e.index_name == name);
            if !in_use && !released.contains(&name) {
                released.push(name);
            }
        }
        Binding { session_id: id, released }
    }

    /// Sessions that have not expired.
    pub async fn active_count(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.expires_at > now).count()
    }

    /// `Set-Cookie` value carrying the signed id.
    pub fn cookie(&self, session_id: &str) -> String {
        let mut cookie = format!(
            "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.sign(session_id),
            self.ttl.as_secs()
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        format!("{session_id}.{}", hex::encode(mac.finalize().into_bytes()))
    }

    fn verify(&self, value: &str) -> Option<String> {
        let (id, signature) = value.split_once('.')?;
        if id.len() != ID_BYTES * 2 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id.to_string())
    }
}

fn new_session_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
