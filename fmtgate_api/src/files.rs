use std::collections::btree_set;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Separator placed between tokens of an include expression.
pub const INCLUDE_SEPARATOR: &str = ";";

/// Unique set of repository-relative paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    paths: BTreeSet<String>,
}

impl FileSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            paths: BTreeSet::new(),
        }
    }

    /// Insert a path, returning `false` when it was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
    }

    /// Whether the path is part of the set.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Number of paths in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set holds no paths.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate paths in set order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.paths.iter().map(String::as_str)
    }

    /// Paths present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.paths.intersection(&other.paths).cloned().collect()
    }
}

impl FromIterator<String> for FileSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for FileSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_owned).collect()
    }
}

impl Extend<String> for FileSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.paths.extend(iter);
    }
}

impl IntoIterator for FileSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Ordered tokens forming one include expression for a single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncludeBatch {
    /// Tool-relative path tokens or wildcard patterns.
    pub tokens: Vec<String>,
    /// Repository-relative paths the tokens were derived from.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl IncludeBatch {
    /// A batch holding a single raw pattern, such as `**/*`.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            tokens: vec![pattern.into()],
            sources: Vec::new(),
        }
    }

    /// Append a token derived from `source`.
    pub fn push(&mut self, token: impl Into<String>, source: impl Into<String>) {
        self.tokens.push(token.into());
        self.sources.push(source.into());
    }

    /// Encoded length in bytes of the expression after adding `token`.
    #[must_use]
    pub fn len_with(&self, token: &str) -> usize {
        let separator = if self.tokens.is_empty() {
            0
        } else {
            INCLUDE_SEPARATOR.len()
        };
        self.encoded_len() + separator + token.len()
    }

    /// Encoded length in bytes of [`IncludeBatch::expression`].
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let tokens: usize = self.tokens.iter().map(String::len).sum();
        tokens + self.tokens.len().saturating_sub(1) * INCLUDE_SEPARATOR.len()
    }

    /// The tokens joined into one expression string.
    #[must_use]
    pub fn expression(&self) -> String {
        self.tokens.join(INCLUDE_SEPARATOR)
    }

    /// Whether the batch has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}
