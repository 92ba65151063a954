//! # Token Issuance
//!
//! Independent of the traversal pipeline: issues and validates the scoped
//! access tokens the external authorization layer consumes. The principal
//! registry is an explicitly passed handle, never ambient state, so token
//! logic stays testable in isolation.
//!
//! Two token kinds exist and are structurally distinguishable by prefix:
//! `stk_` session tokens minted against a partner key (short-lived) and
//! `utk_` user tokens minted against a user's own key (long-lived).
//! Tokens are immutable once issued; revocation lives outside the core.

use std::collections::BTreeSet;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result};

/// Bytes of SHA-256 integrity tag appended to every token payload.
const TAG_LEN: usize = 32;

// ============================================================================
// Scopes
// ============================================================================

/// An ordered set of permission strings, e.g. `paths:read`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scope: impl Into<String>) {
        self.0.insert(scope.into());
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The first requested scope (in sort order) that `allowed` does not
    /// grant, if any.
    pub fn first_not_in<'a>(&'a self, allowed: &ScopeSet) -> Option<&'a str> {
        self.iter().find(|s| !allowed.contains(s))
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Principals
// ============================================================================

/// What kind of credential a principal authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// A partner integration key. Mints session tokens.
    PartnerKey,
    /// An end user's own key. Mints user tokens.
    UserKey,
}

/// A known credential holder. Only the key digest is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub key_digest: String,
    pub kind: PrincipalKind,
    pub allowed_scopes: ScopeSet,
    pub active: bool,
}

impl Principal {
    pub fn new(
        id: impl Into<String>,
        raw_key: &str,
        kind: PrincipalKind,
        allowed_scopes: ScopeSet,
    ) -> Self {
        Self {
            id: id.into(),
            key_digest: key_digest(raw_key),
            kind,
            allowed_scopes,
            active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Digest a raw credential for storage or lookup. Raw keys never persist.
pub fn key_digest(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Read-mostly lookup of principals by key digest.
#[async_trait]
pub trait PrincipalRegistry: Send + Sync + 'static {
    async fn lookup(&self, key_digest: &str) -> Result<Option<Principal>>;
}

/// In-memory registry for tests and embedded use.
#[derive(Default)]
pub struct MemoryPrincipalRegistry {
    principals: RwLock<HashMap<String, Principal>>,
}

impl MemoryPrincipalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, principal: Principal) {
        self.principals
            .write()
            .insert(principal.key_digest.clone(), principal);
    }
}

#[async_trait]
impl PrincipalRegistry for MemoryPrincipalRegistry {
    async fn lookup(&self, key_digest: &str) -> Result<Option<Principal>> {
        Ok(self.principals.read().get(key_digest).cloned())
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Token kind, recoverable from the opaque form's prefix alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Session,
    User,
}

impl TokenKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            TokenKind::Session => "stk_",
            TokenKind::User => "utk_",
        }
    }

    fn from_token(token: &str) -> Option<(TokenKind, &str)> {
        token
            .strip_prefix("stk_")
            .map(|rest| (TokenKind::Session, rest))
            .or_else(|| token.strip_prefix("utk_").map(|rest| (TokenKind::User, rest)))
    }
}

/// The signed content of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub token_id: Uuid,
    pub kind: TokenKind,
    /// Who the token acts as.
    pub subject: String,
    /// The principal whose credential minted it.
    pub principal_id: String,
    pub scopes: ScopeSet,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An issued token: the opaque wire form plus its decoded claims.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Token lifetimes by kind.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub session_ttl: Duration,
    pub user_ttl: Duration,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(1),
            user_ttl: Duration::days(90),
        }
    }
}

/// Issues and validates access tokens against a principal registry.
pub struct TokenIssuer<R: PrincipalRegistry> {
    registry: R,
    secret: Vec<u8>,
    config: IssuerConfig,
}

impl<R: PrincipalRegistry> TokenIssuer<R> {
    pub fn new(registry: R, secret: impl Into<Vec<u8>>) -> Self {
        Self::with_config(registry, secret, IssuerConfig::default())
    }

    pub fn with_config(
        registry: R,
        secret: impl Into<Vec<u8>>,
        config: IssuerConfig,
    ) -> Self {
        Self { registry, secret: secret.into(), config }
    }

    /// Issue a token for `subject` against a presented credential.
    ///
    /// The token kind follows the principal's kind: partner keys mint
    /// short-lived session tokens, user keys mint long-lived user tokens.
    pub async fn issue(
        &self,
        credential: &str,
        scopes: ScopeSet,
        subject: &str,
    ) -> Result<AccessToken> {
        let principal = self
            .registry
            .lookup(&key_digest(credential))
            .await?
            .filter(|p| p.active)
            .ok_or(Error::InvalidCredential)?;

        if let Some(scope) = scopes.first_not_in(&principal.allowed_scopes) {
            return Err(Error::ScopeNotGranted { scope: scope.to_string() });
        }

        let (kind, ttl) = match principal.kind {
            PrincipalKind::PartnerKey => (TokenKind::Session, self.config.session_ttl),
            PrincipalKind::UserKey => (TokenKind::User, self.config.user_ttl),
        };

        let issued_at = Utc::now();
        let claims = TokenClaims {
            token_id: Uuid::new_v4(),
            kind,
            subject: subject.to_string(),
            principal_id: principal.id.clone(),
            scopes,
            issued_at,
            expires_at: issued_at + ttl,
        };
        let token = self.seal(&claims)?;

        info!(
            principal = %principal.id,
            kind = ?kind,
            token_id = %claims.token_id,
            "issued access token"
        );
        Ok(AccessToken { token, claims })
    }

    /// Decode and verify a token, returning its claims.
    pub async fn validate(&self, token: &str) -> Result<TokenClaims> {
        self.validate_at(token, Utc::now())
    }

    fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims> {
        let (kind, body) = TokenKind::from_token(token)
            .ok_or_else(|| Error::InvalidToken("unrecognized prefix".into()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| Error::InvalidToken("malformed encoding".into()))?;
        if bytes.len() <= TAG_LEN {
            return Err(Error::InvalidToken("truncated token".into()));
        }
        let (payload, tag) = bytes.split_at(bytes.len() - TAG_LEN);
        if self.tag(payload) != tag {
            return Err(Error::InvalidToken("integrity check failed".into()));
        }

        let claims: TokenClaims = serde_json::from_slice(payload)
            .map_err(|_| Error::InvalidToken("malformed claims".into()))?;
        if claims.kind != kind {
            return Err(Error::InvalidToken("prefix does not match claims".into()));
        }
        if now >= claims.expires_at {
            return Err(Error::InvalidToken("token expired".into()));
        }
        Ok(claims)
    }

    /// claims JSON ++ SHA-256(secret ++ claims JSON), base64url, prefixed.
    fn seal(&self, claims: &TokenClaims) -> Result<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|e| Error::Internal(format!("claims serialization: {e}")))?;
        let mut bytes = payload.clone();
        bytes.extend_from_slice(&self.tag(&payload));
        Ok(format!("{}{}", claims.kind.prefix(), URL_SAFE_NO_PAD.encode(bytes)))
    }

    fn tag(&self, payload: &[u8]) -> [u8; TAG_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update([0x1f]);
        hasher.update(payload);
        hasher.finalize().into()
    }
}
