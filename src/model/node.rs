//! Node in the relationship graph — a person or a company.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What kind of entity a canonical ID refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Person,
    Company,
}

impl NodeKind {
    /// The canonical ID prefix for this kind (`per` / `com`).
    pub fn prefix(&self) -> &'static str {
        match self {
            NodeKind::Person => "per",
            NodeKind::Company => "com",
        }
    }
}

/// Canonical entity identifier — opaque and type-prefixed (`per_*` / `com_*`).
///
/// A canonical ID is never reused for two distinct real-world entities.
/// Alias IDs produced by upstream record merges share this format and
/// resolve to exactly one canonical ID through the store's alias index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse and validate a raw identifier string.
    ///
    /// Accepts `per_` / `com_` prefixed IDs whose body is alphanumeric.
    pub fn parse(raw: &str) -> Result<Self> {
        let body = raw
            .strip_prefix("per_")
            .or_else(|| raw.strip_prefix("com_"))
            .ok_or_else(|| Error::UnresolvableIdentifier { input: raw.to_string() })?;

        if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::UnresolvableIdentifier { input: raw.to_string() });
        }

        Ok(Self(raw.to_string()))
    }

    /// True if `raw` looks like a type-prefixed ID, without full validation.
    pub fn has_known_prefix(raw: &str) -> bool {
        raw.starts_with("per_") || raw.starts_with("com_")
    }

    pub fn kind(&self) -> NodeKind {
        if self.0.starts_with("per_") { NodeKind::Person } else { NodeKind::Company }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the relationship graph.
///
/// Display attributes come from the external graph store and are read-only
/// to the core. Alias IDs live in the store's alias index, not on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub name: String,
    /// Person headline, e.g. "VP Engineering at Acme".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    /// Company industry, e.g. "Enterprise Software".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Public profile URL for people.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    /// Primary web domain for companies, e.g. "acme.com".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_domain: Option<String>,
}

impl Node {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            headline: None,
            industry: None,
            location: None,
            profile_url: None,
            company_domain: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.id.kind()
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }

    pub fn with_company_domain(mut self, domain: impl Into<String>) -> Self {
        self.company_domain = Some(domain.into());
        self
    }
}
