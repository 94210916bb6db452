//! Hallucination validator.
//!
//! Two passes over a generated narrative:
//! 1. every code-shaped token must be listed somewhere in the record;
//! 2. long phrases that look like a specific diagnosis, drug or procedure
//!    (clinical trigger plus a morphological suffix) must be supported by
//!    the whitelist of the category that suffix belongs to.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;

use crate::models::ClinicalRecord;
use crate::pipeline_config::ValidatorConfig;

use super::text::{code_tokens, matching_form, ngram_spans};
use super::types::{MentionCategory, ValidationResult, Violation, ViolationReason};
use super::whitelist::Whitelist;

static CIE10_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]\d{2}(\.\d{1,2})?$").expect("Invalid CIE-10 regex"));

static ATC_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]\d{2}[a-z]{2}\d{2}$").expect("Invalid ATC regex"));

/// Sentence ends: terminal punctuation followed by whitespace, or a line
/// break. Dots inside codes such as `J18.9` do not split.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.;!?](?:\s+|$)|\n").expect("Invalid sentence regex"));

static SEPARATED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]{3,10}[:\-][a-z0-9]{2,10}$").expect("Invalid separated code regex")
});

/// Category and lookup key of a code-shaped token.
fn classify_code(token: &str) -> Option<(MentionCategory, &str)> {
    if let Some(code) = token.strip_prefix("atc:") {
        return (!code.is_empty()).then_some((MentionCategory::Med, code));
    }
    if CIE10_CODE.is_match(token) {
        return Some((MentionCategory::Dx, token));
    }
    if ATC_CODE.is_match(token) {
        return Some((MentionCategory::Med, token));
    }
    let has_letter = token.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    if has_letter && has_digit && SEPARATED_CODE.is_match(token) {
        return Some((MentionCategory::Proc, token));
    }
    None
}

/// Validator with its heuristic configuration. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct HallucinationValidator {
    config: ValidatorConfig,
}

impl HallucinationValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Check `narrative` against the record it was generated from.
    pub fn validate(&self, narrative: &str, record: &ClinicalRecord) -> ValidationResult {
        let started = Instant::now();
        let whitelist = Whitelist::from_record(record);

        let mut violations = self.check_codes(narrative, &whitelist);
        violations.extend(self.check_phrases(narrative, &whitelist));

        let mut seen = HashSet::new();
        violations.retain(|v| seen.insert((v.category, v.mention.clone())));

        tracing::info!(
            violations = violations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Narrative validated"
        );

        ValidationResult::from_violations(violations)
    }

    fn check_codes(&self, narrative: &str, whitelist: &Whitelist) -> Vec<Violation> {
        code_tokens(narrative)
            .into_iter()
            .filter(|token| !self.config.code_exemptions.iter().any(|e| e == token))
            .filter_map(|token| {
                let (category, key) = classify_code(&token)?;
                if whitelist.has_code(key) || whitelist.has_code(&token) {
                    return None;
                }
                Some(Violation {
                    category,
                    mention: token.clone(),
                    reason: ViolationReason::UnauthorizedCode,
                })
            })
            .collect()
    }

    fn check_phrases(&self, narrative: &str, whitelist: &Whitelist) -> Vec<Violation> {
        SENTENCE_BREAK
            .split(narrative)
            .flat_map(|sentence| self.check_sentence(&matching_form(sentence), whitelist))
            .collect()
    }

    /// One violation per suffix-bearing word that sits in a flagged window.
    /// The mention never reaches past another suffix-bearing word.
    fn check_sentence(&self, text: &str, whitelist: &Whitelist) -> Vec<Violation> {
        let cfg = &self.config;
        let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
        let min_words = cfg.min_ngram.max(cfg.min_heuristic_words);
        let spans = ngram_spans(words.len(), min_words, cfg.max_ngram);

        let mut violations = Vec::new();
        for category in MentionCategory::ALL {
            let suffixes = self.suffixes(category);
            let allowed = whitelist.category(category);
            let anchors: Vec<usize> = (0..words.len())
                .filter(|&i| self.has_suffix(words[i], suffixes))
                .collect();
            if anchors.is_empty() {
                continue;
            }

            let flagged: Vec<(usize, usize)> = spans
                .iter()
                .copied()
                .filter(|&(start, end)| {
                    let window = &words[start..end];
                    if !window.iter().any(|w| self.is_trigger(w))
                        || !anchors.iter().any(|&a| start <= a && a < end)
                        || window.iter().any(|w| self.is_common_term(w))
                    {
                        return false;
                    }
                    let phrase = window.join(" ");
                    !(cfg.common_phrases.contains(&phrase)
                        || allowed.allows_name(&phrase)
                        || allowed.overlaps(&phrase, cfg))
                })
                .collect();

            for &anchor in &anchors {
                let containing: Vec<(usize, usize)> = flagged
                    .iter()
                    .copied()
                    .filter(|&(start, end)| start <= anchor && anchor < end)
                    .collect();
                if containing.is_empty() {
                    continue;
                }
                let (start, end) = containing
                    .iter()
                    .copied()
                    .filter(|&(start, end)| {
                        !anchors.iter().any(|&a| a != anchor && start <= a && a < end)
                    })
                    .max_by_key(|&(start, end)| (start, end - start))
                    .unwrap_or((anchor, anchor + 1));

                let significant = |i: usize| {
                    i == anchor || self.is_trigger(words[i]) || self.has_suffix(words[i], suffixes)
                };
                let first = (start..=anchor).find(|&i| significant(i)).unwrap_or(anchor);
                let last = (anchor..end).rev().find(|&i| significant(i)).unwrap_or(anchor);
                violations.push(Violation {
                    category,
                    mention: words[first..=last].join(" "),
                    reason: ViolationReason::UnlistedClinicalTerm,
                });
            }
        }
        violations
    }

    fn suffixes(&self, category: MentionCategory) -> &[String] {
        match category {
            MentionCategory::Dx => &self.config.diagnosis_suffixes,
            MentionCategory::Proc => &self.config.procedure_suffixes,
            MentionCategory::Med => &self.config.medication_suffixes,
        }
    }

    /// Exact trigger, prefix of a long trigger, or a number glued to a
    /// unit trigger ("500mg").
    fn is_trigger(&self, word: &str) -> bool {
        let unit = word.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ',');
        let glued = unit.len() < word.len() && !unit.is_empty();
        self.config.triggers.iter().any(|t| {
            word == t || (t.len() >= 4 && word.starts_with(t.as_str())) || (glued && unit == t)
        })
    }

    fn is_common_term(&self, word: &str) -> bool {
        self.config
            .common_terms
            .iter()
            .any(|t| word.starts_with(t.as_str()))
    }

    fn has_suffix(&self, word: &str, suffixes: &[String]) -> bool {
        if self.config.suffix_exemptions.iter().any(|e| e == word) {
            return false;
        }
        suffixes
            .iter()
            .any(|s| word.len() > s.len() && word.contains(s.as_str()))
    }
}

/// Validate with the default heuristics.
pub fn validate(narrative: &str, record: &ClinicalRecord) -> ValidationResult {
    HallucinationValidator::default().validate(narrative, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, Medication, Procedure};

    fn record() -> ClinicalRecord {
        ClinicalRecord {
            admission_reason: "Fiebre y tos".into(),
            admission_diagnoses: vec![Diagnosis {
                code: "J18.9".into(),
                name: "Neumonía adquirida en la comunidad".into(),
            }],
            discharge_diagnoses: vec![Diagnosis {
                code: "J18.9".into(),
                name: "Neumonía adquirida en la comunidad".into(),
            }],
            procedures: vec![Procedure {
                code: "PROC-01".into(),
                name: "Radiografia de torax".into(),
                date: None,
            }],
            inpatient_medications: vec![Medication {
                code: "J01CA04".into(),
                name: "Amoxicilina".into(),
                dose: "500 mg".into(),
                route: "VO".into(),
                frequency: "cada 8 horas".into(),
                duration: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn whitelisted_medication_with_code_passes() {
        let result = validate(
            "Se indica Amoxicilina (J01CA04) 500 mg cada 8 horas por 7 dias.",
            &record(),
        );
        assert!(result.ok, "unexpected violations: {:?}", result.violations);
    }

    #[test]
    fn unlisted_drug_phrase_is_one_medication_violation() {
        let result = validate("clindamicina endovenosa cada 8 horas", &record());
        assert!(!result.ok);
        assert_eq!(result.violations.len(), 1);
        let v = &result.violations[0];
        assert_eq!(v.category, MentionCategory::Med);
        assert_eq!(v.mention, "clindamicina endovenosa cada 8 horas");
        assert_eq!(v.reason, ViolationReason::UnlistedClinicalTerm);
    }

    #[test]
    fn short_triggered_phrase_is_not_flagged() {
        let result = validate("clindamicina cada 8", &record());
        assert!(result.ok);
    }

    #[test]
    fn repeated_violation_is_reported_once() {
        let narrative = "Clindamicina endovenosa cada 8 horas. Paciente evoluciona sin incidentes \
                         durante su estadia en sala. Clindamicina endovenosa cada 8 horas.";
        let result = validate(narrative, &record());
        assert_eq!(result.count(MentionCategory::Med), 1);
        assert_eq!(result.violations.len(), 1);
    }

    #[test]
    fn unknown_diagnosis_code_is_flagged() {
        let result = validate("Diagnostico de egreso: apendicitis aguda (K35.8).", &record());
        assert!(result.violations.iter().any(|v| v.category == MentionCategory::Dx
            && v.mention == "k35.8"
            && v.reason == ViolationReason::UnauthorizedCode));
    }

    #[test]
    fn known_codes_pass_in_any_form() {
        let result = validate(
            "Egresa con diagnostico J18.9, tratado con ATC:J01CA04 y procedimiento PROC-01.",
            &record(),
        );
        assert!(result.ok, "unexpected violations: {:?}", result.violations);
    }

    #[test]
    fn unknown_separated_code_is_procedure() {
        let result = validate("Se realizo procedimiento PRX-204 sin incidentes.", &record());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].category, MentionCategory::Proc);
        assert_eq!(result.violations[0].mention, "prx-204");
    }

    #[test]
    fn exempt_code_like_words_pass() {
        let result = validate("Antecedente de COVID-19 y deficit de vitamina B12.", &record());
        assert!(result.ok, "unexpected violations: {:?}", result.violations);
    }

    #[test]
    fn phrase_embedding_whitelisted_diagnosis_passes() {
        let mut rec = record();
        rec.discharge_diagnoses.push(Diagnosis {
            code: "K81.0".into(),
            name: "Colecistitis aguda litiásica".into(),
        });
        let result = validate(
            "Paciente con colecistitis aguda litiasica tratada con antibiotico cada 8 horas",
            &rec,
        );
        assert!(result.ok, "unexpected violations: {:?}", result.violations);
    }

    #[test]
    fn invented_diagnosis_is_dx_violation() {
        let result = validate(
            "Durante la hospitalizacion presenta pancreatitis aguda severa con insuficiencia renal",
            &record(),
        );
        assert_eq!(result.count(MentionCategory::Dx), 1);
        assert_eq!(result.count(MentionCategory::Med), 0);
    }

    #[test]
    fn common_findings_clear_the_phrase() {
        assert!(validate("Fiebre y mialgias 48hrs", &record()).ok);

        let result = validate("Refiere intensas mialgias 48hrs", &record());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].category, MentionCategory::Dx);
        assert_eq!(result.violations[0].mention, "mialgias 48hrs");
    }

    #[test]
    fn dosis_is_not_a_diagnosis_suffix() {
        let result = validate("Se ajusta dosis de paracetamol cada 8 horas segun dolor", &record());
        assert_eq!(result.count(MentionCategory::Dx), 0);
    }

    #[test]
    fn abbreviated_whitelisted_procedure_passes() {
        let mut rec = record();
        rec.procedures.push(Procedure {
            code: String::new(),
            name: "Tomografía computada de abdomen".into(),
            date: None,
        });
        let result = validate("Control con TAC de abdomen y colangiografia", &rec);
        assert!(result.ok, "unexpected violations: {:?}", result.violations);

        let without = validate("Control con TAC de abdomen y colangiografia", &record());
        assert_eq!(without.count(MentionCategory::Proc), 1);
    }

    #[test]
    fn narrower_heuristics_from_config() {
        let validator = HallucinationValidator::new(ValidatorConfig {
            min_heuristic_words: 7,
            ..Default::default()
        });
        let result = validator.validate("clindamicina endovenosa cada 8 horas", &record());
        assert!(result.ok);
    }

    #[test]
    fn glued_dose_counts_as_trigger() {
        let v = HallucinationValidator::default();
        assert!(v.is_trigger("500mg"));
        assert!(v.is_trigger("antibioticos"));
        assert!(!v.is_trigger("mgx"));
        assert!(!v.is_trigger("evolucion"));
    }

    #[test]
    fn distinct_invented_drugs_are_separate_violations() {
        let result = validate(
            "Recibe clindamicina 600 mg ev cada 8 horas y luego azitromicina 500 mg vo cada 24 horas.",
            &ClinicalRecord::default(),
        );
        let mentions: Vec<&str> = result.violations.iter().map(|v| v.mention.as_str()).collect();
        assert_eq!(
            mentions,
            vec!["clindamicina 600 mg ev cada", "azitromicina 500 mg vo cada"]
        );
        assert!(result
            .violations
            .iter()
            .all(|v| v.category == MentionCategory::Med));
    }

    #[test]
    fn back_to_back_repeat_is_one_violation() {
        let result = validate(
            "Se agrega metronidazol 500 mg ev cada 8 horas. Se agrega metronidazol 500 mg ev cada 8 horas.",
            &ClinicalRecord::default(),
        );
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].mention, "metronidazol 500 mg ev cada");
    }

    #[test]
    fn mentions_stay_within_ngram_bounds() {
        let cfg = ValidatorConfig::default();
        let result = validate(
            "Recibe clindamicina 600 mg ev cada 8 horas y luego azitromicina 500 mg vo cada 24 horas.",
            &ClinicalRecord::default(),
        );
        for v in &result.violations {
            assert!(v.mention.split(' ').count() <= cfg.max_ngram, "{}", v.mention);
        }
    }

    #[test]
    fn anatomia_patologica_is_not_a_procedure() {
        let result = validate("Control de anatomia patologica en 10 dias con cirugia", &record());
        assert_eq!(result.count(MentionCategory::Proc), 0);
        assert!(result.ok, "unexpected violations: {:?}", result.violations);

        let accented = validate("Pendiente informe anatómico en 10 dias tras cirugia", &record());
        assert!(accented.ok, "unexpected violations: {:?}", accented.violations);
    }
}
