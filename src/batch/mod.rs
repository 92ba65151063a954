//! # Batch Orchestration
//!
//! Fans one per-target operation out across a bounded list of targets with
//! bounded concurrency. Results come back in the caller's input order, not
//! completion order, and one target's failure never touches its siblings.
//!
//! Structural problems with the request itself (empty list, cap exceeded,
//! blank source) fail the whole batch before anything is dispatched.
//! Dropping the returned future cancels in-flight and queued members alike.

use std::future::Future;

use futures::StreamExt;
use tracing::warn;

use crate::model::{ConnectionPath, NodeKind};
use crate::resolve::{classify, IdentifierKind};
use crate::{Error, Result};

/// Concurrent traversals in flight at once, unless overridden.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

/// Documented request caps, by target kind.
pub const DEFAULT_PERSON_TARGET_CAP: usize = 50;
pub const DEFAULT_COMPANY_TARGET_CAP: usize = 20;

/// Batch limits.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_in_flight: usize,
    pub person_target_cap: usize,
    pub company_target_cap: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            person_target_cap: DEFAULT_PERSON_TARGET_CAP,
            company_target_cap: DEFAULT_COMPANY_TARGET_CAP,
        }
    }
}

/// One target's outcome, in the caller's input position.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// The identifier exactly as the caller sent it.
    pub target: String,
    pub outcome: Result<Vec<ConnectionPath>>,
}

/// Reject structurally invalid batches before any work is dispatched.
///
/// Company-shaped identifiers (domains, company URLs, `com_` IDs) count
/// against the company cap; everything else, including identifiers that
/// will later fail to resolve, counts against the person cap.
pub fn check_preconditions(
    config: &BatchConfig,
    source: &str,
    targets: &[String],
) -> Result<()> {
    if source.trim().is_empty() {
        return Err(Error::Validation {
            field: Some("source"),
            message: "source identifier is empty".into(),
        });
    }
    if targets.is_empty() {
        return Err(Error::Validation {
            field: Some("targets"),
            message: "target list is empty".into(),
        });
    }

    let mut people = 0usize;
    let mut companies = 0usize;
    for target in targets {
        match classify(target) {
            Ok(IdentifierKind::CompanyUrl(_) | IdentifierKind::CompanyDomain(_)) => {
                companies += 1;
            }
            Ok(IdentifierKind::RawId(id)) if id.kind() == NodeKind::Company => companies += 1,
            _ => people += 1,
        }
    }

    if people > config.person_target_cap {
        return Err(Error::Validation {
            field: Some("targets"),
            message: format!(
                "{people} person targets exceed the cap of {}",
                config.person_target_cap
            ),
        });
    }
    if companies > config.company_target_cap {
        return Err(Error::Validation {
            field: Some("targets"),
            message: format!(
                "{companies} company targets exceed the cap of {}",
                config.company_target_cap
            ),
        });
    }
    Ok(())
}

/// Run `op` once per target with at most `max_in_flight` running at once.
///
/// Targets beyond the concurrency limit queue; the output vector lines up
/// index-for-index with `targets`. Per-target errors are captured into the
/// corresponding [`BatchItem`] and logged, never propagated.
pub async fn dispatch<F, Fut>(
    targets: Vec<String>,
    max_in_flight: usize,
    op: F,
) -> Vec<BatchItem>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<ConnectionPath>>>,
{
    futures::stream::iter(targets)
        .map(|target| {
            let fut = op(target.clone());
            async move {
                let outcome = fut.await;
                if let Err(e) = &outcome {
                    warn!(target = %target, error = %e, "batch member failed");
                }
                BatchItem { target, outcome }
            }
        })
        .buffered(max_in_flight.max(1))
        .collect()
        .await
}
