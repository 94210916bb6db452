//! Safety checks on generated discharge narratives.
//!
//! Everything here is pure and reentrant: findings are ordinary return
//! values, never errors.

pub mod completeness;
pub mod hallucination;
pub mod output_check;
pub mod review;
pub mod synonyms;
pub mod text;
pub mod types;
pub mod vocabulary;
pub mod whitelist;

pub use completeness::{check_completeness, CompletenessWarning};
pub use hallucination::{validate, HallucinationValidator};
pub use output_check::{check_output, check_output_numbers, OutputCheck, OutputWarning};
pub use review::{review_record, InputReview};
pub use types::{MentionCategory, Severity, ValidationResult, Violation, ViolationReason};
pub use whitelist::Whitelist;
