//! Post-generation checks on free text against the context it was
//! generated from: unsupported numbers and durations, findings absent from
//! the record, formatting the discharge template forbids.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ClinicalRecord;

use super::types::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputWarningKind {
    UnsupportedNumber,
    UnsupportedDuration,
    UnsupportedFinding,
    ClinicalError,
    UnsupportedVitalSign,
    MissingDiagnosisCode,
    RepetitiveOutput,
    DisallowedFormatting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputWarning {
    pub kind: OutputWarningKind,
    pub message: String,
    pub severity: Severity,
}

impl OutputWarning {
    fn new(kind: OutputWarningKind, severity: Severity, message: String) -> Self {
        Self {
            kind,
            message,
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCheck {
    /// No high-severity warning.
    pub ok: bool,
    pub warnings: Vec<OutputWarning>,
}

struct NamedPattern {
    regex: Regex,
    name: &'static str,
}

fn named(regex_str: &str, name: &'static str) -> NamedPattern {
    NamedPattern {
        regex: Regex::new(regex_str).expect("Invalid output check regex"),
        name,
    }
}

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid number regex"));

static DURATIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)>\s*\d+\s*h(oras?)?\b", r"\(\s*>\s*\d+[^)]*\)"]
        .into_iter()
        .map(|p| Regex::new(p).expect("Invalid duration regex"))
        .collect()
});

/// Findings generators tend to invent; only a problem when the context
/// does not mention them.
static CONTEXT_FINDINGS: LazyLock<Vec<NamedPattern>> = LazyLock::new(|| {
    vec![
        named(r"(?i)\buci\b", "UCI"),
        named(r"(?i)unidad\s*de\s*cuidados?\s*intensivos?", "Unidad de Cuidados Intensivos"),
        named(r"(?i)staphylococcus", "Staphylococcus"),
        named(r"(?i)streptococcus", "Streptococcus"),
        named(r"(?i)\be\.?\s*coli\b", "E. coli"),
        named(r"(?i)pseudomonas", "Pseudomonas"),
        named(r"(?i)klebsiella", "Klebsiella"),
        named(r"(?i)hemocultivos?\s*(positivo|negativo)", "Hemocultivo"),
        named(r"(?i)urocultivos?\s*(positivo|negativo)", "Urocultivo"),
        named(r"(?i)\bcultivos?\s*(positivo|negativo)", "Cultivo"),
        named(r"(?i)\bsepsis\b", "Sepsis"),
        named(r"(?i)shock\s*s[eé]ptico", "Shock séptico"),
        named(r"(?i)ventilaci[oó]n\s*mec[aá]nica", "Ventilación mecánica"),
        named(r"(?i)intubaci[oó]n", "Intubación"),
        named(r"(?i)empeoramiento\s*(cl[ií]nico|inicial|progresivo)?", "empeoramiento clínico"),
        named(r"(?i)manejo\s*(respiratorio\s*)?urgente", "manejo urgente"),
        named(r"(?i)deterioro\s*(cl[ií]nico|progresivo|r[aá]pido)?", "deterioro clínico"),
        named(r"(?i)descompensaci[oó]n", "descompensación"),
        named(r"(?i)falla\s*(org[aá]nica|respiratoria|card[ií]aca)", "falla orgánica"),
        named(r"(?i)inestabilidad\s*hemodin[aá]mica", "inestabilidad hemodinámica"),
    ]
});

/// Always wrong regardless of context.
static CLINICAL_ERRORS: LazyLock<Vec<NamedPattern>> = LazyLock::new(|| {
    vec![named(
        r"(?i)amoxicilina\s*(iv|intravenosa|endovenosa|ev)\b",
        "Amoxicilina intravenosa (presentación inexistente)",
    )]
});

static VITAL_SIGNS: LazyLock<Vec<NamedPattern>> = LazyLock::new(|| {
    vec![
        named(r"(?i)\b(ta|pa)\s*[:=]?\s*\d+/\d+", "Presión arterial"),
        named(r"(?i)\bfc\s*[:=]?\s*\d+", "Frecuencia cardíaca"),
        named(r"(?i)\bfr\s*[:=]?\s*\d+", "Frecuencia respiratoria"),
        named(r"(?i)temperatura\s*[:=]?\s*\d+[.,]?\d*", "Temperatura"),
        named(r"(?i)\bsat\s*o?2?\s*[:=]?\s*\d+", "Saturación O2"),
    ]
});

static NUMBER_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3,}(?:-\d{1,4}){4,}\b").expect("Invalid number run regex")
});

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+\*\*").expect("Invalid bold regex"));

static BRACKETED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[[a-z]\d+[a-z]?\d*\]").expect("Invalid bracketed code regex")
});

/// Same word repeated this many times in a row marks degenerate output.
const MAX_REPEATED_WORDS: usize = 10;

/// Numbers and explicit durations in `output` that `context` never states.
///
/// Numbers up to 10 (enumerations, small doses) and from 2020 on (years)
/// are ignored.
pub fn check_output_numbers(context: &str, output: &str) -> Vec<OutputWarning> {
    let context_numbers: Vec<&str> = NUMBER.find_iter(context).map(|m| m.as_str()).collect();
    let mut warnings = Vec::new();
    let mut reported: Vec<&str> = Vec::new();

    for m in NUMBER.find_iter(output) {
        let num = m.as_str();
        let Ok(value) = num.parse::<u64>() else {
            continue;
        };
        if (11..2020).contains(&value) && !context_numbers.contains(&num) && !reported.contains(&num) {
            reported.push(num);
            warnings.push(OutputWarning::new(
                OutputWarningKind::UnsupportedNumber,
                Severity::Medium,
                format!("Number not supported by the record: {num}"),
            ));
        }
    }

    let context_lower = context.to_lowercase();
    for pattern in DURATIONS.iter() {
        for m in pattern.find_iter(output) {
            if !context_lower.contains(&m.as_str().to_lowercase()) {
                warnings.push(OutputWarning::new(
                    OutputWarningKind::UnsupportedDuration,
                    Severity::Medium,
                    format!("Possibly invented duration: \"{}\"", m.as_str()),
                ));
            }
        }
    }

    warnings
}

/// Full output review of a generated discharge text.
pub fn check_output(output: &str, context: &str, record: &ClinicalRecord) -> OutputCheck {
    let mut warnings = Vec::new();

    for dx in record.admission_diagnoses.iter().chain(&record.discharge_diagnoses) {
        if !dx.code.is_empty() && !output.contains(&dx.code) {
            warnings.push(OutputWarning::new(
                OutputWarningKind::MissingDiagnosisCode,
                Severity::Medium,
                format!("Diagnosis code missing from output: {}", dx.code),
            ));
        }
    }

    if NUMBER_RUN.is_match(output) {
        warnings.push(OutputWarning::new(
            OutputWarningKind::RepetitiveOutput,
            Severity::High,
            "Repetitive number pattern detected".to_string(),
        ));
    }
    if longest_word_run(output) > MAX_REPEATED_WORDS {
        warnings.push(OutputWarning::new(
            OutputWarningKind::RepetitiveOutput,
            Severity::High,
            "Repetitive tokens detected".to_string(),
        ));
    }

    if BOLD.is_match(output) {
        warnings.push(OutputWarning::new(
            OutputWarningKind::DisallowedFormatting,
            Severity::Medium,
            "Bold markup is not allowed".to_string(),
        ));
    }
    if BRACKETED_CODE.is_match(output) {
        warnings.push(OutputWarning::new(
            OutputWarningKind::DisallowedFormatting,
            Severity::Medium,
            "Bracketed codes are not allowed".to_string(),
        ));
    }

    for p in CONTEXT_FINDINGS.iter() {
        if p.regex.is_match(output) && !p.regex.is_match(context) {
            warnings.push(OutputWarning::new(
                OutputWarningKind::UnsupportedFinding,
                Severity::High,
                format!("\"{}\" is not documented in the record", p.name),
            ));
        }
    }
    for p in CLINICAL_ERRORS.iter() {
        if p.regex.is_match(output) {
            warnings.push(OutputWarning::new(
                OutputWarningKind::ClinicalError,
                Severity::High,
                format!("Clinical error: {}", p.name),
            ));
        }
    }
    for p in VITAL_SIGNS.iter() {
        if p.regex.is_match(output) && !p.regex.is_match(context) {
            warnings.push(OutputWarning::new(
                OutputWarningKind::UnsupportedVitalSign,
                Severity::Medium,
                format!("Possibly invented vital sign: {}", p.name),
            ));
        }
    }

    warnings.extend(check_output_numbers(context, output));

    let ok = !warnings.iter().any(|w| w.severity == Severity::High);
    if !ok {
        tracing::warn!(warnings = warnings.len(), "Generated output failed review");
    }
    OutputCheck { ok, warnings }
}

/// Length of the longest run of the same word (case-insensitive).
fn longest_word_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<String> = None;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        if previous.as_deref() == Some(word.as_str()) {
            current += 1;
        } else {
            current = 1;
            previous = Some(word);
        }
        longest = longest.max(current);
    }
    longest
}
