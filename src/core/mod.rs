//! Core data types for clinical trial matching.
//!
//! - [`Trial`], [`Criterion`]: structured eligibility data, read-only to the engine
//! - [`TrialId`], [`CriterionType`], [`Category`], [`Operator`]: criterion metadata
//! - [`CodeFamily`], [`CodeSet`]: per-query medical codes and their families
//!
//! ## Code Families
//!
//! Medical codes are hierarchical: leading characters denote a broad
//! classification and later characters refine it.
//!
//! | Code     | Family | Meaning                          |
//! |----------|--------|----------------------------------|
//! | C50.911  | C50    | Malignant neoplasm of breast     |
//! | I10      | I10    | Essential hypertension           |
//! | R10.9    | R10    | Abdominal pain                   |
//!
//! Matching compares families rather than full codes.
//!
//! [`Trial`]: trial::Trial
//! [`Criterion`]: trial::Criterion
//! [`TrialId`]: types::TrialId
//! [`CriterionType`]: types::CriterionType
//! [`Category`]: types::Category
//! [`Operator`]: types::Operator
//! [`CodeFamily`]: code::CodeFamily
//! [`CodeSet`]: code::CodeSet

pub mod code;
pub mod trial;
pub mod types;
