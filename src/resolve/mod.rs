//! # Identifier Resolution
//!
//! Turns a free-form partner-supplied string — profile URL, company domain,
//! company URL, or opaque ID — into a canonical graph node.
//!
//! Classification is an explicit tagged-variant step with ordered pattern
//! precedence, so every rule is exhaustively testable:
//!
//! 1. http(s) URL with an `/in/<handle>` path → profile URL
//! 2. any other http(s) URL → company URL (resolved by its host domain)
//! 3. non-URL with a known ID prefix → raw ID
//! 4. bare dotted hostname → company domain
//! 5. anything else → `UnresolvableIdentifier`
//!
//! Resolution itself is a pure lookup: classify, fetch through the store,
//! follow alias chains to the canonical node. No side effects.

use serde::{Deserialize, Serialize};

use crate::model::{EntityId, Node};
use crate::store::GraphStore;
use crate::{Error, Result};

/// The classified form of a free-form identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Public profile URL, kept verbatim for exact store lookup.
    ProfileUrl(String),
    /// Company website URL, reduced to its host domain.
    CompanyUrl(String),
    /// Bare company domain, lowercased.
    CompanyDomain(String),
    /// Type-prefixed canonical or alias ID.
    RawId(EntityId),
}

/// Classify a free-form identifier string. Fails with
/// `UnresolvableIdentifier` when no pattern matches.
pub fn classify(input: &str) -> Result<IdentifierKind> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::UnresolvableIdentifier { input: input.to_string() });
    }

    if let Some(rest) = strip_scheme(trimmed) {
        let (host, path) = match rest.split_once('/') {
            Some((host, path)) => (host, path),
            None => (rest, ""),
        };
        if host.is_empty() || !is_domain(strip_port(host)) {
            return Err(Error::UnresolvableIdentifier { input: input.to_string() });
        }
        // Profile URLs are checked before the generic company-URL rule.
        if is_profile_path(path) {
            return Ok(IdentifierKind::ProfileUrl(trimmed.to_string()));
        }
        let domain = strip_port(host).trim_start_matches("www.").to_lowercase();
        return Ok(IdentifierKind::CompanyUrl(domain));
    }

    if EntityId::has_known_prefix(trimmed) {
        return Ok(IdentifierKind::RawId(EntityId::parse(trimmed)?));
    }

    if is_domain(trimmed) {
        return Ok(IdentifierKind::CompanyDomain(trimmed.to_lowercase()));
    }

    Err(Error::UnresolvableIdentifier { input: input.to_string() })
}

/// Resolve a free-form identifier to its canonical node.
///
/// Raw IDs go through the store's alias index first, so an ID that was
/// merged away still lands on the surviving record. Fails with `NotFound`
/// when nothing matches after alias resolution.
pub async fn resolve_identifier<S: GraphStore>(store: &S, input: &str) -> Result<Node> {
    match classify(input)? {
        IdentifierKind::ProfileUrl(url) => store
            .node_by_profile_url(&url)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no profile matches {url}"))),
        IdentifierKind::CompanyUrl(domain) | IdentifierKind::CompanyDomain(domain) => store
            .node_by_company_domain(&domain)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no company matches {domain}"))),
        IdentifierKind::RawId(id) => {
            let canonical = store
                .resolve_alias(&id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("unknown entity {id}")))?;
            store
                .node(&canonical)
                .await?
                .ok_or_else(|| Error::NotFound(format!("unknown entity {canonical}")))
        }
    }
}

fn strip_scheme(s: &str) -> Option<&str> {
    for scheme in ["https://", "http://"] {
        // Byte-wise compare: an ASCII-equal prefix guarantees the slice
        // boundary below falls on a char boundary.
        if s.len() >= scheme.len()
            && s.as_bytes()[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
        {
            return Some(&s[scheme.len()..]);
        }
    }
    None
}

fn strip_port(host: &str) -> &str {
    host.split_once(':').map(|(h, _)| h).unwrap_or(host)
}

/// `/in/<handle>` with a non-empty handle marks a personal profile path.
fn is_profile_path(path: &str) -> bool {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    matches!(
        (segments.next(), segments.next()),
        (Some("in"), Some(handle)) if !handle.is_empty()
    )
}

/// Bare hostname: dotted, ASCII alphanumeric/hyphen labels, alphabetic
/// top-level label of length ≥ 2.
fn is_domain(s: &str) -> bool {
    let labels: Vec<&str> = s.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let valid_label = |label: &&str| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if !labels.iter().all(valid_label) {
        return false;
    }
    let tld = labels.last().expect("checked len >= 2");
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
