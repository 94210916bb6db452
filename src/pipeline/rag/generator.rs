use std::collections::VecDeque;
use std::sync::Mutex;

use super::RagError;
use super::types::LlmGenerate;
use crate::models::ClinicalRecord;
use crate::pipeline_config::GenerationConfig;

/// Evolution notes are summarized to this many characters.
const NOTE_SUMMARY_CHARS: usize = 100;

/// Deterministic discharge paragraph written straight from the record.
///
/// Used when no model backend is configured. Every clause comes from a
/// record field, so the output only mentions whitelisted terms.
pub struct TemplateNarrator;

impl TemplateNarrator {
    pub fn narrate(record: &ClinicalRecord) -> String {
        let mut parts: Vec<String> = Vec::new();

        let mut opening = String::new();
        if !record.admission_reason.is_empty() {
            opening = format!(
                "Paciente ingresa por {}",
                record.admission_reason.to_lowercase()
            );
        }
        if !record.admission_diagnoses.is_empty() {
            let dx = labels(record.admission_diagnoses.iter().map(|d| d.label()));
            let clause = format!("con diagnóstico de ingreso de {dx}");
            opening = if opening.is_empty() {
                capitalize(&clause)
            } else {
                format!("{opening} {clause}")
            };
        }
        if !opening.is_empty() {
            parts.push(opening);
        }

        if !record.procedures.is_empty() {
            let procs = labels(record.procedures.iter().map(|p| match p.date {
                Some(date) => format!("{} el {}", p.label(), date.format("%d/%m/%Y")),
                None => p.label(),
            }));
            parts.push(format!("Durante la hospitalización se realizaron: {procs}"));
        }

        if !record.inpatient_medications.is_empty() {
            let meds = labels(
                record
                    .inpatient_medications
                    .iter()
                    .map(|m| join_nonempty(&[&m.label(), &m.dose, &m.route, &m.frequency])),
            );
            parts.push(format!("Se indicó tratamiento con {meds}"));
        }

        if !record.evolution.is_empty() {
            let notes: Vec<String> = record
                .evolution
                .iter()
                .map(|e| {
                    let summary = summarize_note(&e.note);
                    match e.date {
                        Some(date) => format!("{}: {summary}", date.format("%d/%m/%Y")),
                        None => summary,
                    }
                })
                .collect();
            parts.push(format!("Evolución: {}", notes.join("; ")));
        }

        if !record.labs.is_empty() {
            let labs = labels(
                record
                    .labs
                    .iter()
                    .map(|l| format!("{}: {}", l.parameter, l.value)),
            );
            parts.push(format!("Exámenes de laboratorio relevantes: {labs}"));
        }

        if !record.discharge_diagnoses.is_empty() {
            let dx = labels(record.discharge_diagnoses.iter().map(|d| d.label()));
            parts.push(format!("Se egresa con diagnóstico de {dx}"));
        }

        let discharge = &record.discharge;
        if !discharge.medications.is_empty() {
            let meds = labels(discharge.medications.iter().map(|m| {
                let mut line = join_nonempty(&[&m.label(), &m.dose, &m.route, &m.frequency]);
                if let Some(duration) = &m.duration {
                    line.push_str(" por ");
                    line.push_str(duration);
                }
                line
            }));
            parts.push(format!("Indicaciones farmacológicas al alta: {meds}"));
        }
        if !discharge.controls.is_empty() {
            parts.push(format!("Controles: {}", discharge.controls.join(", ")));
        }
        if !discharge.recommendations.is_empty() {
            parts.push(format!(
                "Recomendaciones: {}",
                discharge.recommendations.join(", ")
            ));
        }

        if parts.is_empty() {
            return "No consignado.".to_string();
        }
        format!("{}.", parts.join(". "))
    }
}

fn labels(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn join_nonempty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whitespace-collapsed note, cut to the first 100 characters.
fn summarize_note(note: &str) -> String {
    let clean = note.split_whitespace().collect::<Vec<_>>().join(" ");
    match clean.char_indices().nth(NOTE_SUMMARY_CHARS) {
        Some((idx, _)) => format!("{}...", &clean[..idx]),
        None => clean,
    }
}

/// Mock generator for testing — replays scripted responses and records
/// every prompt it receives. The last response repeats once the script
/// runs out.
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new(response: &str) -> Self {
        Self::sequence(&[response])
    }

    pub fn sequence(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `GenerationFailed(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(message.to_string())])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl LlmGenerate for MockLlm {
    fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String, RagError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| RagError::GenerationFailed("Mock lock poisoned".to_string()))?;
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(RagError::GenerationFailed(message)),
            None => Ok(String::new()),
        }
    }
}
