//! # Cursor Codec
//!
//! Opaque, tamper-evident pagination tokens. A cursor names the last sort
//! key a page returned plus a fingerprint of the query that produced it;
//! continuation resumes strictly *after* that key (keyset pagination), so
//! concurrent graph mutation can never re-deliver an item the caller has
//! already seen.
//!
//! Every decode failure is `InvalidCursor`. The codec never falls back to
//! "start over": a caller holding a stale or foreign cursor must find out.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Current cursor schema. Bumped when the wire shape changes; old cursors
/// are rejected rather than reinterpreted.
pub const CURSOR_VERSION: u8 = 1;

// ============================================================================
// Sort keys
// ============================================================================

/// The last-returned sort key of a page.
///
/// Page ordering and cursor comparison use the same key, so the two can
/// never disagree: warmth pages order by (milli desc, path id asc), search
/// pages by (name asc, node id asc).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "k", rename_all = "snake_case")]
pub enum SortKey {
    /// Warmth-ordered path pages. Scores travel as integral milli units so
    /// the round-trip is exact.
    Warmth { milli: i64, path_id: String },
    /// Name-ordered search pages.
    Name { name: String, node_id: String },
}

impl SortKey {
    /// True when `candidate` sorts strictly after `self` in page order.
    /// Keys of different shapes never admit each other.
    pub fn strictly_after(&self, candidate: &SortKey) -> bool {
        match (self, candidate) {
            (
                SortKey::Warmth { milli: last, path_id: last_id },
                SortKey::Warmth { milli, path_id },
            ) => milli < last || (milli == last && path_id > last_id),
            (
                SortKey::Name { name: last, node_id: last_id },
                SortKey::Name { name, node_id },
            ) => name > last || (name == last && node_id > last_id),
            _ => false,
        }
    }
}

/// Exact integral rendering of a warmth score for cursor transport.
pub fn score_to_milli(score: f64) -> i64 {
    (score * 1000.0).round() as i64
}

pub fn milli_to_score(milli: i64) -> f64 {
    milli as f64 / 1000.0
}

// ============================================================================
// Cursor state
// ============================================================================

/// Decoded continuation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    pub version: u8,
    pub key: SortKey,
    /// First 8 bytes of a SHA-256 over the query parameters that produced
    /// the page. Page size is deliberately not part of it.
    pub fingerprint: u64,
}

/// JSON body carried after the version byte.
#[derive(Serialize, Deserialize)]
struct Wire {
    key: SortKey,
    fp: u64,
}

impl CursorState {
    pub fn new(key: SortKey, fingerprint: u64) -> Self {
        Self { version: CURSOR_VERSION, key, fingerprint }
    }

    /// Render as an opaque token: one version byte, then the JSON payload,
    /// base64url without padding.
    pub fn encode(&self) -> Result<String> {
        let payload = serde_json::to_vec(&Wire { key: self.key.clone(), fp: self.fingerprint })
            .map_err(|e| Error::Internal(format!("cursor serialization: {e}")))?;
        let mut bytes = Vec::with_capacity(1 + payload.len());
        bytes.push(self.version);
        bytes.extend_from_slice(&payload);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parse and verify a token against the fingerprint of the query the
    /// caller is actually running.
    pub fn decode(token: &str, expected_fingerprint: u64) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| Error::InvalidCursor("malformed encoding".into()))?;
        let (&version, payload) = bytes
            .split_first()
            .ok_or_else(|| Error::InvalidCursor("empty cursor".into()))?;
        if version != CURSOR_VERSION {
            return Err(Error::InvalidCursor(format!("unknown version {version}")));
        }
        let wire: Wire = serde_json::from_slice(payload)
            .map_err(|_| Error::InvalidCursor("malformed payload".into()))?;
        if wire.fp != expected_fingerprint {
            return Err(Error::InvalidCursor(
                "cursor was issued for a different query".into(),
            ));
        }
        Ok(Self { version, key: wire.key, fingerprint: wire.fp })
    }
}

/// Fingerprint a query as the first 8 bytes of a SHA-256 over its parts.
///
/// Parts are separator-delimited, so `["a", "bc"]` and `["ab", "c"]` hash
/// differently. Callers pass an operation tag first, then the parameters
/// that define the result set (never the page size).
pub fn fingerprint<'a>(parts: impl IntoIterator<Item = &'a str>) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    let digest = hasher.finalize();
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(first)
}
