use serde::{Deserialize, Deserializer, Serialize};

use crate::core::types::{Category, CriterionType, Operator, TrialId};

/// A single structured eligibility clause attached to a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(rename = "type")]
    pub kind: CriterionType,

    pub category: Category,

    /// Short medical entity name (e.g. "Type 2 diabetes")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,

    /// Hierarchical medical code; blank codes are read as absent
    #[serde(
        default,
        deserialize_with = "deserialize_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,

    #[serde(default)]
    pub operator: Operator,

    /// Inclusive age bounds in years, set on Age criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,

    /// Original clause text
    pub text: String,
}

impl Criterion {
    pub fn new(kind: CriterionType, category: Category, text: impl Into<String>) -> Self {
        Self {
            kind,
            category,
            entity: None,
            code: None,
            operator: Operator::NotApplicable,
            min_age: None,
            max_age: None,
            text: text.into(),
        }
    }

    pub fn inclusion(category: Category, text: impl Into<String>) -> Self {
        Self::new(CriterionType::Inclusion, category, text)
    }

    pub fn exclusion(category: Category, text: impl Into<String>) -> Self {
        Self::new(CriterionType::Exclusion, category, text)
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        let trimmed = code.trim();
        self.code = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn with_age_range(mut self, min_age: Option<u32>, max_age: Option<u32>) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    /// True for an Age criterion whose bounds exclude `age`. A missing bound
    /// never excludes.
    #[must_use]
    pub fn rejects_age(&self, age: u32) -> bool {
        self.category == Category::Age
            && (self.min_age.is_some_and(|min| age < min)
                || self.max_age.is_some_and(|max| age > max))
    }

    /// Case-insensitive prefix test of this criterion's code against a family
    #[must_use]
    pub fn code_starts_with(&self, family: &str) -> bool {
        self.code.as_deref().is_some_and(|code| {
            let mut code_chars = code.chars();
            family
                .chars()
                .all(|f| code_chars.next().is_some_and(|c| c.eq_ignore_ascii_case(&f)))
        })
    }
}

fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// A registered trial and its ordered criteria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub nct_id: TrialId,
    pub title: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

impl Trial {
    pub fn new(nct_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            nct_id: TrialId::new(nct_id),
            title: title.into(),
            criteria: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_criteria(mut self, criteria: Vec<Criterion>) -> Self {
        self.criteria = criteria;
        self
    }

    #[must_use]
    pub fn summary(&self) -> TrialSummary {
        TrialSummary {
            nct_id: self.nct_id.clone(),
            title: self.title.clone(),
        }
    }

    pub fn inclusion_count(&self) -> usize {
        self.criteria
            .iter()
            .filter(|c| c.kind == CriterionType::Inclusion)
            .count()
    }

    pub fn exclusion_count(&self) -> usize {
        self.criteria
            .iter()
            .filter(|c| c.kind == CriterionType::Exclusion)
            .count()
    }
}

/// Trial metadata returned alongside matching criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSummary {
    pub nct_id: TrialId,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_prefix_is_case_insensitive() {
        let c = Criterion::inclusion(Category::Condition, "Breast cancer").with_code("c50.9");
        assert!(c.code_starts_with("C50"));
        assert!(c.code_starts_with("c5"));
        assert!(!c.code_starts_with("C51"));
        assert!(!c.code_starts_with("C50.91"));
    }

    #[test]
    fn test_code_prefix_folds_ascii_only() {
        let c = Criterion::inclusion(Category::Condition, "x").with_code("ßab1");
        assert!(c.code_starts_with("ßAB"));
        assert!(!c.code_starts_with("SSA"));
    }

    #[test]
    fn test_uncoded_criterion_never_matches() {
        let c = Criterion::inclusion(Category::Age, "Adults 18 or older");
        assert!(!c.code_starts_with("C50"));
    }

    #[test]
    fn test_blank_code_deserializes_as_none() {
        let json = r#"{"type":"Exclusion","category":"Condition","code":"  ","text":"x"}"#;
        let c: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(c.code, None);
        assert_eq!(c.kind, CriterionType::Exclusion);
        assert_eq!(c.operator, Operator::NotApplicable);
    }

    #[test]
    fn test_unknown_category_is_other() {
        let json = r#"{"type":"Inclusion","category":"Genetics","text":"BRCA carrier"}"#;
        let c: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(c.category, Category::Other);
    }

    #[test]
    fn test_criteria_counts() {
        let trial = Trial::new("NCT1", "t").with_criteria(vec![
            Criterion::inclusion(Category::Condition, "a"),
            Criterion::inclusion(Category::Age, "b"),
            Criterion::exclusion(Category::Condition, "c"),
        ]);
        assert_eq!(trial.inclusion_count(), 2);
        assert_eq!(trial.exclusion_count(), 1);
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        let adults = Criterion::inclusion(Category::Age, "Aged 18 to 65").with_age_range(Some(18), Some(65));
        assert!(adults.rejects_age(17));
        assert!(!adults.rejects_age(18));
        assert!(!adults.rejects_age(65));
        assert!(adults.rejects_age(66));

        let open_ended = Criterion::inclusion(Category::Age, "Adults").with_age_range(Some(18), None);
        assert!(!open_ended.rejects_age(90));

        let not_age = Criterion::inclusion(Category::Condition, "x").with_age_range(Some(18), None);
        assert!(!not_age.rejects_age(5));
    }

    #[test]
    fn test_age_bounds_are_optional_in_json() {
        let json = r#"{"type":"Inclusion","category":"Age","min_age":18,"text":"Adults"}"#;
        let c: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(c.min_age, Some(18));
        assert_eq!(c.max_age, None);

        let out = serde_json::to_string(&Criterion::inclusion(Category::Lifestyle, "x")).unwrap();
        assert!(!out.contains("min_age"));
    }
}
