//! Prompt texts sent to the generator.
//!
//! Prompts are in Chilean clinical Spanish, the language the narrative is
//! written in. Empty sections carry a fixed phrase so the model copies it
//! instead of inventing content.

use std::collections::HashSet;
use crate::models::{ClinicalRecord, Medication};
use crate::pipeline::safety::{MentionCategory, Violation};
use crate::pipeline::storage::types::Chunk;
use crate::pipeline_config::PROMPT_CHUNK_MAX_CHARS;

/// Evolution notes are cut to this many characters in the data block.
const EVOLUTION_NOTE_MAX_CHARS: usize = 180;

pub const NOT_RECORDED: &str = "No consignado";

const DISCHARGE_RULES: &str = "Transcribe estos datos clínicos en UN SOLO PÁRRAFO de texto plano.
REGLAS:
1. NO inventes datos que no estén listados abajo
2. NO uses formato: nada de ** negritas **, * cursivas *, [ corchetes ], guiones largos
3. Incluye TODOS los códigos entre paréntesis simples: (J18.9), (J01CA04)
4. NO inventes deterioro clínico, empeoramiento ni urgencias que no estén documentados

";

const DISCHARGE_CLOSING: &str = "Escribe la epicrisis en UN PÁRRAFO CONTINUO de texto plano.
OBLIGATORIO:
1. Incluir TODOS los diagnósticos de egreso con su código CIE-10: ejemplo \"neumonía lobar (J18.1), hipertensión esencial (I10)\"
2. Incluir TODOS los medicamentos de alta con su código ATC: ejemplo \"amoxicilina 500mg VO c/8h x7d (J01CA04)\"
3. NO usar asteriscos, corchetes ni negritas
4. NO inventar empeoramiento ni deterioro clínico

Epicrisis:";

/// Cut `text` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Discharge medications with repeated prescriptions removed, first one wins.
fn unique_medications(meds: &[Medication]) -> Vec<&Medication> {
    let mut seen = HashSet::new();
    meds.iter().filter(|m| seen.insert(m.dedup_key())).collect()
}

fn medication_line(med: &Medication) -> String {
    let mut line = med.posology();
    if !med.code.is_empty() {
        line.push_str(&format!(" ({})", med.code));
    }
    if let Some(duration) = &med.duration {
        line.push_str(&format!(" por {duration}"));
    }
    line
}

fn joined_or(items: Vec<String>, separator: &str, fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(separator)
    }
}

/// The `=== DATOS CLÍNICOS ===` block shared by the discharge and
/// correction prompts.
pub fn clinical_data_block(record: &ClinicalRecord) -> String {
    let mut out = String::from("=== DATOS CLÍNICOS ===\n\n");

    if let Some(stay) = record.hospital_stay() {
        out.push_str(&format!(
            "HOSPITALIZACIÓN: {} días (desde {} hasta {})\n",
            stay.days, stay.admitted, stay.discharged
        ));
    }

    let reason = if record.admission_reason.is_empty() {
        NOT_RECORDED
    } else {
        record.admission_reason.as_str()
    };
    out.push_str(&format!("MOTIVO DE INGRESO: {reason}\n"));

    let admission: Vec<String> = record.admission_diagnoses.iter().map(|d| d.label()).collect();
    out.push_str(&format!(
        "DIAGNÓSTICO DE INGRESO: {}\n",
        joined_or(admission, ", ", NOT_RECORDED)
    ));

    let procedures: Vec<String> = record
        .procedures
        .iter()
        .map(|p| match p.date {
            Some(date) => format!("{} el {}", p.label(), date.format("%d/%m/%Y")),
            None => p.label(),
        })
        .collect();
    out.push_str(&format!(
        "PROCEDIMIENTOS: {}\n",
        joined_or(
            procedures,
            ", ",
            "\"Sin procedimientos consignados\" (usar esta frase exacta)"
        )
    ));

    let treatments: Vec<String> = record
        .inpatient_medications
        .iter()
        .map(medication_line)
        .collect();
    out.push_str(&format!(
        "TRATAMIENTOS INTRAHOSPITALARIOS: {}\n",
        joined_or(
            treatments,
            "; ",
            "\"Sin tratamientos intrahospitalarios consignados\" (usar esta frase exacta)"
        )
    ));

    if !record.evolution.is_empty() {
        out.push_str("EVOLUCIÓN:\n");
        for note in &record.evolution {
            let date = note
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "No especificada".to_string());
            out.push_str(&format!(
                "- {date}: {}\n",
                truncate_chars(note.note.trim(), EVOLUTION_NOTE_MAX_CHARS)
            ));
        }
    }

    if !record.labs.is_empty() {
        let labs: Vec<String> = record
            .labs
            .iter()
            .map(|l| format!("{}: {}", l.parameter, l.value))
            .collect();
        out.push_str(&format!("LABORATORIOS: {}\n", labs.join("; ")));
    }

    if record.discharge_diagnoses.is_empty() {
        out.push_str(&format!("DIAGNÓSTICO DE EGRESO: {NOT_RECORDED}\n"));
    } else {
        out.push_str("\n*** DIAGNÓSTICOS DE EGRESO (OBLIGATORIO incluir todos con código CIE-10): ***\n");
        for dx in &record.discharge_diagnoses {
            out.push_str(&format!("  • {}\n", dx.label()));
        }
    }

    out.push_str("\n*** INDICACIONES AL ALTA: ***\n");
    let meds = unique_medications(&record.discharge.medications);
    if meds.is_empty() {
        out.push_str("MEDICAMENTOS: Sin medicamentos al alta\n");
    } else {
        out.push_str("MEDICAMENTOS (OBLIGATORIO incluir código ATC entre paréntesis para cada uno):\n");
        for med in meds {
            out.push_str(&format!("  • {}\n", medication_line(med)));
        }
    }

    let controls = record.discharge.controls.clone();
    out.push_str(&format!(
        "CONTROLES: {}\n",
        joined_or(controls, "; ", "\"No consignado\" (usar esta frase exacta)")
    ));
    let recommendations = record.discharge.recommendations.clone();
    out.push_str(&format!(
        "RECOMENDACIONES: {}\n",
        joined_or(recommendations, "; ", "\"No consignadas\" (usar esta frase exacta)")
    ));

    out.push_str("\n=== FIN DATOS ===\n");
    out
}

/// First-pass prompt for the discharge narrative.
pub fn build_discharge_prompt(record: &ClinicalRecord) -> String {
    let mut prompt = String::from(DISCHARGE_RULES);
    prompt.push_str(&clinical_data_block(record));
    prompt.push('\n');
    prompt.push_str(DISCHARGE_CLOSING);
    prompt
}

/// Second-pass prompt listing what the validator rejected and the only
/// diagnoses, procedures and medications the rewrite may mention.
pub fn build_correction_prompt(record: &ClinicalRecord, violations: &[Violation]) -> String {
    let mut prompt = String::from(
        "Tu texto anterior contiene menciones NO permitidas (alucinaciones) o fuera de la lista blanca.\n\nVIOLACIONES DETECTADAS:\n",
    );
    for v in violations {
        prompt.push_str(&format!("- {}: \"{}\"\n", v.category.label_es(), v.mention));
    }

    let dx: Vec<String> = record
        .admission_diagnoses
        .iter()
        .chain(&record.discharge_diagnoses)
        .map(|d| d.label())
        .collect();
    let procs: Vec<String> = record.procedures.iter().map(|p| p.label()).collect();
    let meds: Vec<String> = record
        .inpatient_medications
        .iter()
        .chain(&record.discharge.medications)
        .map(|m| m.label())
        .collect();

    prompt.push_str("\nDebes reescribir el informe de alta en 1 solo párrafo CUMPLIENDO:\n");
    for (category, items) in [
        (MentionCategory::Dx, dx),
        (MentionCategory::Proc, procs),
        (MentionCategory::Med, meds),
    ] {
        let noun = match category {
            MentionCategory::Dx => "diagnósticos",
            MentionCategory::Proc => "procedimientos",
            MentionCategory::Med => "medicamentos",
        };
        prompt.push_str(&format!(
            "- Solo puedes mencionar {noun} de esta lista: {}\n",
            joined_or(items, ", ", NOT_RECORDED)
        ));
    }

    prompt.push_str(
        "\nSi necesitas algo fuera de las listas, escribe \"No consignado\".\nIncluye SIEMPRE los códigos entre paréntesis.\n\nReescribe completo el informe usando los mismos datos.\n\n",
    );
    prompt.push_str(&clinical_data_block(record));
    prompt.push_str("\nEpicrisis:");
    prompt
}

/// Extractive question-answering prompt over retrieved passages.
pub fn build_question_prompt(question: &str, chunks: &[Chunk]) -> String {
    let mut prompt = String::from(
        "TAREA: extrae 4 frases EXACTAS del CONTEXTO.\nFORMATO: 4 lineas con \"- \" y luego una sola linea: \"Fuente: <sourceHint>\".\nPROHIBIDO: inventar, resumir, interpretar.\n\nCONTEXTO:\n",
    );
    for (i, chunk) in chunks.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}\n{}\n\n",
            i + 1,
            chunk.source_hint,
            truncate_chars(&chunk.text, PROMPT_CHUNK_MAX_CHARS)
        ));
    }
    prompt.push_str(&format!("Pregunta: {question}\nRespuesta:\n"));
    prompt
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{Diagnosis, DischargeInstructions, EvolutionNote, Procedure};
    use crate::pipeline::safety::ViolationReason;
    use crate::pipeline::storage::types::ChunkType;

    fn amoxicilina() -> Medication {
        Medication {
            code: "J01CA04".into(),
            name: "Amoxicilina".into(),
            dose: "500 mg".into(),
            route: "VO".into(),
            frequency: "cada 8 horas".into(),
            duration: Some("7 dias".into()),
        }
    }

    fn record() -> ClinicalRecord {
        ClinicalRecord {
            admission_reason: "Fiebre y tos".into(),
            admission_diagnoses: vec![Diagnosis {
                code: "J18.9".into(),
                name: "Neumonia".into(),
            }],
            procedures: vec![Procedure {
                code: "87.44".into(),
                name: "Radiografia de torax".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 2),
            }],
            evolution: vec![
                EvolutionNote {
                    date: NaiveDate::from_ymd_opt(2024, 3, 1),
                    note: "x".repeat(200),
                    author: None,
                },
                EvolutionNote {
                    date: NaiveDate::from_ymd_opt(2024, 3, 5),
                    note: "Afebril, alta".into(),
                    author: None,
                },
            ],
            discharge_diagnoses: vec![Diagnosis {
                code: "J18.9".into(),
                name: "Neumonia resuelta".into(),
            }],
            discharge: DischargeInstructions {
                medications: vec![amoxicilina(), amoxicilina()],
                controls: vec![],
                recommendations: vec!["Reposo".into()],
            },
            ..Default::default()
        }
    }

    #[test]
    fn discharge_prompt_contains_data_and_fixed_phrases() {
        let prompt = build_discharge_prompt(&record());
        assert!(prompt.contains("HOSPITALIZACIÓN: 4 días (desde 2024-03-01 hasta 2024-03-05)"));
        assert!(prompt.contains("MOTIVO DE INGRESO: Fiebre y tos"));
        assert!(prompt.contains("DIAGNÓSTICO DE INGRESO: Neumonia (J18.9)"));
        assert!(prompt.contains("Radiografia de torax (87.44) el 02/03/2024"));
        assert!(prompt.contains("\"Sin tratamientos intrahospitalarios consignados\""));
        assert!(prompt.contains("  • Neumonia resuelta (J18.9)"));
        assert!(prompt.contains("CONTROLES: \"No consignado\""));
        assert!(prompt.contains("RECOMENDACIONES: Reposo"));
        assert!(prompt.ends_with("Epicrisis:"));
    }

    #[test]
    fn discharge_prompt_dedupes_medications() {
        let prompt = build_discharge_prompt(&record());
        let line = "  • Amoxicilina 500 mg VO cada 8 horas (J01CA04) por 7 dias";
        assert_eq!(prompt.matches(line).count(), 1);
    }

    #[test]
    fn evolution_notes_are_truncated() {
        let prompt = build_discharge_prompt(&record());
        let expected = format!("- 2024-03-01: {}...", "x".repeat(180));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"x".repeat(181)));
    }

    #[test]
    fn empty_record_uses_not_recorded_phrases() {
        let prompt = build_discharge_prompt(&ClinicalRecord::default());
        assert!(prompt.contains("MOTIVO DE INGRESO: No consignado"));
        assert!(prompt.contains("DIAGNÓSTICO DE EGRESO: No consignado"));
        assert!(prompt.contains("MEDICAMENTOS: Sin medicamentos al alta"));
        assert!(!prompt.contains("HOSPITALIZACIÓN"));
    }

    #[test]
    fn correction_prompt_lists_violations_and_allowed_terms() {
        let violations = vec![Violation {
            category: MentionCategory::Med,
            mention: "clindamicina endovenosa".into(),
            reason: ViolationReason::UnlistedClinicalTerm,
        }];
        let prompt = build_correction_prompt(&record(), &violations);
        assert!(prompt.contains("- Medicamento: \"clindamicina endovenosa\""));
        assert!(prompt.contains("diagnósticos de esta lista: Neumonia (J18.9), Neumonia resuelta (J18.9)"));
        assert!(prompt.contains("procedimientos de esta lista: Radiografia de torax (87.44)"));
        assert!(prompt.contains("medicamentos de esta lista: Amoxicilina (J01CA04)"));
        assert!(prompt.contains("=== DATOS CLÍNICOS ==="));
    }

    #[test]
    fn question_prompt_numbers_sources_and_compacts_text() {
        let chunks = vec![
            Chunk {
                key: "ep::labs".into(),
                text: "a".repeat(1_500),
                source_hint: "[DOC ep | laboratorios]".into(),
                chunk_type: ChunkType::Labs,
                day: None,
            },
            Chunk {
                key: "ep::summary".into(),
                text: "corto".into(),
                source_hint: "[DOC ep | resumen]".into(),
                chunk_type: ChunkType::Summary,
                day: None,
            },
        ];
        let prompt = build_question_prompt("¿Cual fue la hemoglobina?", &chunks);
        assert!(prompt.contains("1. [DOC ep | laboratorios]\n"));
        assert!(prompt.contains(&format!("{}...", "a".repeat(1_200))));
        assert!(!prompt.contains(&"a".repeat(1_201)));
        assert!(prompt.contains("2. [DOC ep | resumen]\ncorto\n"));
        assert!(prompt.ends_with("Pregunta: ¿Cual fue la hemoglobina?\nRespuesta:\n"));
    }

    #[test]
    fn truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("ñandú", 3), "ñan...");
        assert_eq!(truncate_chars("ñandú", 5), "ñandú");
    }
}
