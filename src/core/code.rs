use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Number of leading characters that identify a code family
pub const FAMILY_LENGTH: usize = 3;

/// Codes inferred from one patient description. Never persisted.
pub type CodeSet = BTreeSet<String>;

/// Leading characters of a hierarchical code, uppercased.
///
/// `C50.911` and `C50.2` both belong to family `C50`, so a granular patient code
/// can match a coarser or differently granular criterion code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeFamily(String);

impl CodeFamily {
    /// Family of a single code. Returns `None` for blank input.
    ///
    /// Only ASCII letters are uppercased, so a family never exceeds
    /// [`FAMILY_LENGTH`] characters.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return None;
        }
        let prefix: String = trimmed
            .chars()
            .take(FAMILY_LENGTH)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Some(Self(prefix))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First character of the family, used to pick the scoring weight
    #[must_use]
    pub fn leading_char(&self) -> Option<char> {
        self.0.chars().next()
    }
}

impl std::fmt::Display for CodeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collapse a set of codes into their distinct families, in ascending order.
///
/// An empty result means there is nothing to match against.
pub fn resolve_families<'a, I>(codes: I) -> BTreeSet<CodeFamily>
where
    I: IntoIterator<Item = &'a String>,
{
    codes
        .into_iter()
        .filter_map(|code| CodeFamily::from_code(code))
        .collect()
}
