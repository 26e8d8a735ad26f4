use serde::{Deserialize, Serialize};

/// Registry identifier of a trial (e.g. an NCT ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialId(pub String);

impl TrialId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a criterion is a requirement for or a disqualification from a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriterionType {
    Inclusion,
    Exclusion,
}

impl std::fmt::Display for CriterionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inclusion => write!(f, "Inclusion"),
            Self::Exclusion => write!(f, "Exclusion"),
        }
    }
}

/// Clinical domain of a criterion.
///
/// Unknown categories coming from the ingestion pipeline deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Age,
    Condition,
    Education,
    Experience,
    Medication,
    Laboratory,
    Lifestyle,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Age => "Age",
            Self::Condition => "Condition",
            Self::Education => "Education",
            Self::Experience => "Experience",
            Self::Medication => "Medication",
            Self::Laboratory => "Laboratory",
            Self::Lifestyle => "Lifestyle",
            Self::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// Relationship between an entity and its threshold value, as recorded at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    GreaterThan,
    LessThan,
    Equal,
    Between,
    #[default]
    #[serde(other)]
    NotApplicable,
}
