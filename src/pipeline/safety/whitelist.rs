use std::collections::BTreeSet;

use crate::models::ClinicalRecord;
use crate::pipeline_config::ValidatorConfig;

use super::synonyms::{are_synonyms, name_variants};
use super::text::{contains_phrase, matching_form};
use super::types::MentionCategory;

/// Permitted codes and names for one category, in matching form.
#[derive(Debug, Clone, Default)]
pub struct CategoryWhitelist {
    codes: BTreeSet<String>,
    /// Record names as written.
    names: BTreeSet<String>,
    /// Names plus abbreviation/expansion variants.
    variants: BTreeSet<String>,
}

impl CategoryWhitelist {
    fn from_items<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut wl = Self::default();
        for (code, name) in items {
            let code = normalize_code(code);
            if !code.is_empty() {
                wl.codes.insert(code);
            }
            let name = matching_form(name);
            if name.is_empty() {
                continue;
            }
            wl.variants.extend(name_variants(&name));
            wl.names.insert(name);
        }
        wl
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// The phrase is a whitelisted name, directly or through a synonym.
    pub fn allows_name(&self, phrase: &str) -> bool {
        self.variants.contains(phrase) || self.names.iter().any(|n| are_synonyms(phrase, n))
    }

    /// The phrase embeds a whitelisted name, or is a fragment of one. Short
    /// overlaps do not count.
    pub fn overlaps(&self, phrase: &str, cfg: &ValidatorConfig) -> bool {
        self.variants.iter().any(|name| {
            (name.len() >= cfg.name_in_phrase_min_len && contains_phrase(phrase, name))
                || (phrase.len() >= cfg.phrase_in_name_min_len && contains_phrase(name, phrase))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.names.is_empty()
    }
}

/// Per-category whitelists derived from one record. Built fresh per
/// validation and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    pub dx: CategoryWhitelist,
    pub proc: CategoryWhitelist,
    pub med: CategoryWhitelist,
}

impl Whitelist {
    pub fn from_record(record: &ClinicalRecord) -> Self {
        let dx = CategoryWhitelist::from_items(
            record
                .admission_diagnoses
                .iter()
                .chain(&record.discharge_diagnoses)
                .map(|d| (d.code.as_str(), d.name.as_str())),
        );
        let proc = CategoryWhitelist::from_items(
            record.procedures.iter().map(|p| (p.code.as_str(), p.name.as_str())),
        );
        let med = CategoryWhitelist::from_items(
            record
                .discharge
                .medications
                .iter()
                .chain(&record.inpatient_medications)
                .map(|m| (m.code.as_str(), m.name.as_str())),
        );
        Self { dx, proc, med }
    }

    pub fn category(&self, category: MentionCategory) -> &CategoryWhitelist {
        match category {
            MentionCategory::Dx => &self.dx,
            MentionCategory::Proc => &self.proc,
            MentionCategory::Med => &self.med,
        }
    }

    /// Codes are accepted whichever category lists them.
    pub fn has_code(&self, code: &str) -> bool {
        MentionCategory::ALL.iter().any(|c| self.category(*c).has_code(code))
    }
}

/// Codes compare lowercase, diacritic-free, without outer punctuation.
pub fn normalize_code(code: &str) -> String {
    super::text::folded_lower(code.trim())
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}
