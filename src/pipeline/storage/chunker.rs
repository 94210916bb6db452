use std::sync::LazyLock;

use regex::Regex;

use super::types::{Chunk, ChunkType, Chunker};
use crate::models::{ClinicalRecord, Diagnosis, Medication};

/// Splits a record into one summary passage, one passage per evolution
/// note, one labs passage and one discharge passage. Sections with no
/// source data produce no chunk.
pub struct RecordChunker;

impl RecordChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RecordChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for RecordChunker {
    fn chunk(&self, record: &ClinicalRecord, record_id: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        if let Some(text) = summary_text(record) {
            chunks.push(Chunk {
                key: format!("{record_id}::summary"),
                text,
                source_hint: format!("[DOC {record_id} | resumen]"),
                chunk_type: ChunkType::Summary,
                day: None,
            });
        }

        for (index, note) in record.evolution.iter().enumerate() {
            let day = index + 1;
            let date = note
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "No especificada".to_string());
            let mut text = format!(
                "[TIPO] Evolucion diaria\n[DIA] {day}\n[FECHA] {date}\n\n[TEXTO]\n{}",
                note.note
            );
            if let Some(author) = &note.author {
                text.push_str(&format!("\n\n[PROFESIONAL] {author}"));
            }
            chunks.push(Chunk {
                key: format!("{record_id}::evolution:{day}"),
                text,
                source_hint: format!("[DOC {record_id} | evolucion dia {day}]"),
                chunk_type: ChunkType::DailyEvolution,
                day: Some(day),
            });
        }

        if !record.labs.is_empty() {
            let mut text = String::from("[TIPO] Laboratorios\n\nLaboratorios resumen:\n");
            for lab in &record.labs {
                text.push_str(&format!("- {}: {}", lab.parameter, clean_lab_value(&lab.value)));
                if let Some(date) = lab.date {
                    text.push_str(&format!(" ({date})"));
                }
                text.push('\n');
            }
            chunks.push(Chunk {
                key: format!("{record_id}::labs"),
                text: text.trim_end().to_string(),
                source_hint: format!("[DOC {record_id} | laboratorios]"),
                chunk_type: ChunkType::Labs,
                day: None,
            });
        }

        if !record.discharge.is_empty() {
            chunks.push(Chunk {
                key: format!("{record_id}::discharge"),
                text: discharge_text(record),
                source_hint: format!("[DOC {record_id} | indicaciones alta]"),
                chunk_type: ChunkType::Discharge,
                day: None,
            });
        }

        chunks
    }
}

fn diagnosis_line(dx: &Diagnosis) -> String {
    match (dx.code.is_empty(), dx.name.is_empty()) {
        (false, false) => format!("- {}: {}", dx.code, dx.name),
        (true, _) => format!("- {}", dx.name),
        (false, true) => format!("- {}", dx.code),
    }
}

/// `- [CODE] name dose route frequency`, empty parts skipped.
fn medication_line(med: &Medication, with_duration: bool) -> String {
    let mut line = String::from("-");
    if !med.code.is_empty() {
        line.push_str(&format!(" [{}]", med.code));
    }
    line.push_str(&format!(" {}", med.posology()));
    if with_duration {
        if let Some(duration) = &med.duration {
            line.push_str(&format!(" por {duration}"));
        }
    }
    line
}

fn summary_text(record: &ClinicalRecord) -> Option<String> {
    if record.admission_reason.is_empty()
        && record.admission_diagnoses.is_empty()
        && record.discharge_diagnoses.is_empty()
        && record.procedures.is_empty()
        && record.inpatient_medications.is_empty()
    {
        return None;
    }

    let reason = if record.admission_reason.is_empty() {
        "No especificado"
    } else {
        record.admission_reason.as_str()
    };
    let mut text = format!("[TIPO] Epicrisis\n[MOTIVO] {reason}\n");

    let mut section = |title: &str, lines: Vec<String>| {
        if lines.is_empty() {
            return;
        }
        text.push_str(&format!("\n{title}:\n"));
        for line in lines {
            text.push_str(&line);
            text.push('\n');
        }
    };

    section(
        "Diagnostico de ingreso",
        record.admission_diagnoses.iter().map(diagnosis_line).collect(),
    );
    section(
        "Diagnostico de egreso",
        record.discharge_diagnoses.iter().map(diagnosis_line).collect(),
    );
    section(
        "Procedimientos",
        record
            .procedures
            .iter()
            .map(|p| {
                let mut line = if p.code.is_empty() {
                    format!("- {}", p.name)
                } else {
                    format!("- {}: {}", p.code, p.name)
                };
                if let Some(date) = p.date {
                    line.push_str(&format!(" ({date})"));
                }
                line
            })
            .collect(),
    );
    section(
        "Tratamientos intrahospitalarios",
        record
            .inpatient_medications
            .iter()
            .map(|m| medication_line(m, false))
            .collect(),
    );

    Some(text.trim_end().to_string())
}

fn discharge_text(record: &ClinicalRecord) -> String {
    let discharge = &record.discharge;
    let mut text = String::from("[TIPO] Indicaciones de alta\n");

    if !discharge.medications.is_empty() {
        text.push_str("\nMedicamentos:\n");
        for med in &discharge.medications {
            text.push_str(&medication_line(med, true));
            text.push('\n');
        }
    }
    if !discharge.controls.is_empty() {
        text.push_str("\nControles:\n");
        for control in &discharge.controls {
            text.push_str(&format!("- {control}\n"));
        }
    }
    if !discharge.recommendations.is_empty() {
        text.push_str("\nRecomendaciones:\n");
        for rec in &discharge.recommendations {
            text.push_str(&format!("- {rec}\n"));
        }
    }

    text.trim_end().to_string()
}

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d.,]+\s*)(.+)$").expect("Invalid lab value regex"));

/// Collapse a unit that was exported twice: "7.8 g/dL g/dL" → "7.8 g/dL",
/// "23.7% %" → "23.7%".
pub fn clean_lab_value(value: &str) -> String {
    let value = value.trim();
    let Some(caps) = NUMERIC_PREFIX.captures(value) else {
        return value.to_string();
    };
    let (number, unit) = (&caps[1], &caps[2]);
    let tokens: Vec<&str> = unit.split_whitespace().collect();
    let half = tokens.len() / 2;
    if tokens.len() >= 2 && tokens.len() % 2 == 0 && tokens[..half] == tokens[half..] {
        format!("{number}{}", tokens[..half].join(" "))
    } else {
        value.to_string()
    }
}
