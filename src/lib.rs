//! # warmpath — Relationship-Graph Warm-Introduction Core
//!
//! Answers "how is user X connected to target Y, through whom, and how
//! strong is that connection?" over an external relationship graph.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` is the narrow read-only contract
//!    between the core and whatever holds the social graph
//! 2. **Clean DTOs**: `Node`, `Edge`, `ConnectionPath` cross all boundaries
//! 3. **Deterministic output**: same graph snapshot in, same paths, scores,
//!    and orderings out — no hidden randomness anywhere in the pipeline
//! 4. **Bounded everything**: traversal depth (3), per-target paths,
//!    batch size, and batch concurrency are all explicit limits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warmpath::{Engine, EntityId, MemoryGraphStore, Node, ResolvePathsOptions};
//!
//! # async fn example() -> warmpath::Result<()> {
//! let store = MemoryGraphStore::new();
//! let me = store.add_node(Node::new(EntityId::parse("per_001")?, "Jo Founder"));
//! let vc = store.add_node(
//!     Node::new(EntityId::parse("com_123")?, "Acme Capital")
//!         .with_company_domain("acme.com"),
//! );
//! store.connect(&me, &vc, 7.5);
//!
//! let engine = Engine::new(store);
//! let page = engine
//!     .resolve_paths("per_001", "acme.com", ResolvePathsOptions::default())
//!     .await?;
//!
//! for path in &page.items {
//!     println!("{} ({}): {:.1}", path.id, path.degree, path.warmth_score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Role |
//! |-------|--------|------|
//! | Resolve | `resolve` | free-form identifier → canonical node |
//! | Traverse | `traverse` | bounded-degree simple-path discovery |
//! | Score | `score` | edge strength + path warmth |
//! | Rank | `rank` | introducer ordering |
//! | Paginate | `cursor` | opaque, tamper-evident continuation |
//!
//! `batch` fans the pipeline out across targets; `auth` is the parallel
//! token-issuance subsystem consumed by the external authorization layer.

// ============================================================================
// Modules
// ============================================================================

pub mod auth;
pub mod batch;
pub mod cursor;
pub mod model;
pub mod ops;
pub mod rank;
pub mod resolve;
pub mod score;
pub mod store;
pub mod traverse;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    ConnectionPath, Edge, EdgeId, EntityId, Introducer, Node, NodeKind, Page,
    PathId, WarmthLabel, MAX_DEGREE,
};

// ============================================================================
// Re-exports: Store
// ============================================================================

pub use store::{CompanyFilter, GraphStore, MemoryGraphStore, PersonFilter};

// ============================================================================
// Re-exports: Ops
// ============================================================================

pub use ops::{EngineConfig, PageLimits, ResolvePathsOptions, WarmthRanked};

// ============================================================================
// Re-exports: Supporting subsystems
// ============================================================================

pub use auth::{AccessToken, IssuerConfig, ScopeSet, TokenIssuer, TokenKind};
pub use batch::{BatchConfig, BatchItem};
pub use score::ScoringPolicy;
pub use traverse::{TraversalConfig, TraversalMode};

// ============================================================================
// Top-level Engine handle
// ============================================================================

/// The primary entry point. An `Engine` wraps a graph store and exposes the
/// partner-facing operations: path resolution, search, warmth sorting, and
/// batch fan-out (see `ops`).
///
/// The engine never mutates the graph; concurrent operations share the
/// store without coordination. Dropping an operation's future cancels it
/// promptly, including any queued batch members.
pub struct Engine<S: store::GraphStore> {
    store: S,
    config: ops::EngineConfig,
}

impl<S: store::GraphStore> Engine<S> {
    /// Create an engine with default limits and scoring policy.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ops::EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(store: S, config: ops::EngineConfig) -> Self {
        Self { store, config }
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ops::EngineConfig {
        &self.config
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Fixed error taxonomy the external response envelope renders from.
///
/// Every `Error` maps to exactly one kind; the wire string comes from
/// [`ErrorKind::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    AuthenticationError,
    AuthorizationError,
    RateLimitError,
    InternalError,
    ServiceUnavailableError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotFoundError => "not_found_error",
            ErrorKind::AuthenticationError => "authentication_error",
            ErrorKind::AuthorizationError => "authorization_error",
            ErrorKind::RateLimitError => "rate_limit_error",
            ErrorKind::InternalError => "internal_error",
            ErrorKind::ServiceUnavailableError => "service_unavailable_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Unresolvable identifier: {input:?}")]
    UnresolvableIdentifier { input: String },

    #[error("Validation error: {message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Scope not granted: {scope}")]
    ScopeNotGranted { scope: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    /// The taxonomy class this error renders as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnresolvableIdentifier { .. }
            | Error::Validation { .. }
            | Error::InvalidCursor(_) => ErrorKind::ValidationError,
            Error::NotFound(_) | Error::SourceNotFound(_) | Error::TargetNotFound(_) => {
                ErrorKind::NotFoundError
            }
            Error::InvalidCredential | Error::InvalidToken(_) => ErrorKind::AuthenticationError,
            Error::ScopeNotGranted { .. } => ErrorKind::AuthorizationError,
            Error::RateLimited => ErrorKind::RateLimitError,
            Error::Internal(_) => ErrorKind::InternalError,
            Error::StoreUnavailable(_) => ErrorKind::ServiceUnavailableError,
        }
    }

    /// The request field this error is attributable to, when one exists,
    /// so the envelope can emit a field-level errors array.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::UnresolvableIdentifier { .. } => Some("identifier"),
            Error::Validation { field, .. } => *field,
            Error::InvalidCursor(_) => Some("cursor"),
            Error::SourceNotFound(_) => Some("source"),
            Error::TargetNotFound(_) => Some("target"),
            Error::ScopeNotGranted { .. } => Some("scopes"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
