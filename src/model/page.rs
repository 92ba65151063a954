//! Page — one slice of a paginated result set.

use serde::{Deserialize, Serialize};

/// A page of results plus the continuation data the response envelope
/// needs: `cursor` (opaque, present when more results exist), `has_more`,
/// and the item `count` for this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub has_more: bool,
    pub count: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>, has_more: bool) -> Self {
        let count = items.len();
        Self { items, cursor, has_more, count }
    }

    /// A terminal page with no continuation.
    pub fn complete(items: Vec<T>) -> Self {
        Self::new(items, None, false)
    }
}
