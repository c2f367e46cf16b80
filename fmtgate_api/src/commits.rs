use serde::{Deserialize, Serialize};

/// Optional pair of revision identifiers supplied by the caller.
///
/// Either endpoint may be missing; [`CommitRange::resolve`] turns the pair
/// into a non-degenerate two-endpoint range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitRange {
    /// Older endpoint ("commit A").
    #[serde(default)]
    pub from: Option<String>,
    /// Newer endpoint ("commit B").
    #[serde(default)]
    pub to: Option<String>,
}

impl CommitRange {
    /// Build a range from raw, possibly empty, endpoint strings.
    #[must_use]
    pub fn new(from: Option<impl Into<String>>, to: Option<impl Into<String>>) -> Self {
        Self {
            from: normalize(from.map(Into::into)),
            to: normalize(to.map(Into::into)),
        }
    }

    /// Resolve the range into two concrete revisions.
    ///
    /// A missing endpoint takes the value of the other one; when both
    /// endpoints are equal the older one becomes its first parent (`rev^`).
    /// Returns `None` when neither endpoint was supplied.
    #[must_use]
    pub fn resolve(&self) -> Option<ResolvedRange> {
        let (from, to) = match (self.from.as_deref(), self.to.as_deref()) {
            (None, None) => return None,
            (Some(from), None) => (from, from),
            (None, Some(to)) => (to, to),
            (Some(from), Some(to)) => (from, to),
        };

        let from = if from == to {
            format!("{from}^")
        } else {
            from.to_owned()
        };

        Some(ResolvedRange {
            from,
            to: to.to_owned(),
        })
    }

    /// Whether neither endpoint was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Concrete revisions passed to a two-revision diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    /// Older revision.
    pub from: String,
    /// Newer revision.
    pub to: String,
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
