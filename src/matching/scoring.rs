use serde::{Deserialize, Serialize};

use crate::core::code::CodeFamily;

/// Largest accepted weight or penalty
pub const MAX_WEIGHT: i64 = 1_000_000;

/// Weight added per inclusion match, chosen by the first letter of the matched family,
/// and the penalty subtracted per conflicting exclusion family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Families C, D, I, J: neoplasms/blood, circulatory, respiratory
    pub primary: i64,
    /// Family R: symptoms and signs
    pub symptom: i64,
    /// Every other family, including Z status/history codes
    pub other: i64,
    /// Subtracted once per patient family with a conflicting exclusion
    pub exclusion_penalty: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            primary: 10,
            symptom: 5,
            other: 1,
            exclusion_penalty: 100,
        }
    }
}

impl ScoringWeights {
    /// Weight credited for an inclusion match produced by `family`
    #[must_use]
    pub fn weight_for(&self, family: &CodeFamily) -> i64 {
        match family.leading_char() {
            Some('C' | 'D' | 'I' | 'J') => self.primary,
            Some('R') => self.symptom,
            _ => self.other,
        }
    }

    /// Check the weights keep exclusion conflicts meaningful
    pub fn validate(&self) -> Result<(), String> {
        if self.primary < 0 || self.symptom < 0 || self.other < 0 {
            return Err("inclusion weights must not be negative".to_string());
        }
        if self.exclusion_penalty <= 0 {
            return Err("exclusion penalty must be positive".to_string());
        }
        let largest = self
            .primary
            .max(self.symptom)
            .max(self.other)
            .max(self.exclusion_penalty);
        if largest > MAX_WEIGHT {
            return Err(format!("weights must not exceed {MAX_WEIGHT}"));
        }
        Ok(())
    }
}
