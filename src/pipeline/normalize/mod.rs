//! Record normalization.
//!
//! `normalize` turns whatever the clinical data export produced into a
//! [`ClinicalRecord`]. It is total: malformed fields degrade to empty values
//! and incomplete entries are dropped, never filled with placeholders.
//! Applying it to its own serialized output is a no-op.

pub mod coerce;
pub mod fields;

use serde_json::Value;

use crate::models::{
    ClinicalRecord, Diagnosis, DischargeInstructions, EvolutionNote, LabResult, Medication,
    Procedure,
};

use coerce::{field, list, object, text};

/// Normalize a raw clinical record.
///
/// Accepts the canonical field names (as produced by serializing a
/// `ClinicalRecord`) and the legacy Spanish export names.
pub fn normalize(raw: &Value) -> ClinicalRecord {
    let discharge = object(
        field(raw, &["discharge", "indicaciones_alta"]),
        "discharge",
    );

    let record = ClinicalRecord {
        admission_reason: fields::clean_text(&text(field(
            raw,
            &["admission_reason", "motivo_ingreso"],
        ))),
        admission_diagnoses: diagnoses(field(raw, &["admission_diagnoses", "diagnostico_ingreso"])),
        procedures: procedures(field(raw, &["procedures", "procedimientos"])),
        inpatient_medications: medications(
            field(raw, &["inpatient_medications", "tratamientos_intrahosp"]),
            "inpatient_medications",
        ),
        evolution: evolution(field(raw, &["evolution", "evolucion"])),
        labs: labs(field(raw, &["labs", "laboratorios_relevantes"])),
        discharge_diagnoses: diagnoses(field(raw, &["discharge_diagnoses", "diagnostico_egreso"])),
        discharge: DischargeInstructions {
            medications: medications(
                field(&discharge, &["medications", "medicamentos"]),
                "discharge.medications",
            ),
            controls: strings(field(&discharge, &["controls", "controles"]), "discharge.controls"),
            recommendations: strings(
                field(&discharge, &["recommendations", "recomendaciones"]),
                "discharge.recommendations",
            ),
        },
    };

    tracing::debug!(
        admission_dx = record.admission_diagnoses.len(),
        discharge_dx = record.discharge_diagnoses.len(),
        procedures = record.procedures.len(),
        evolution = record.evolution.len(),
        labs = record.labs.len(),
        "Clinical record normalized"
    );

    record
}

fn strings(value: Option<&Value>, name: &str) -> Vec<String> {
    list(value, name)
        .iter()
        .map(|item| fields::clean_text(&text(Some(item))))
        .filter(|s| !s.is_empty())
        .collect()
}

fn diagnoses(value: Option<&Value>) -> Vec<Diagnosis> {
    list(value, "diagnoses")
        .iter()
        .map(|dx| Diagnosis {
            code: fields::diagnosis_code(&text(field(dx, &["code", "codigo"]))),
            name: fields::clean_text(&text(field(dx, &["name", "nombre"]))),
        })
        .filter(|dx| !dx.code.is_empty() || !dx.name.is_empty())
        .collect()
}

fn procedures(value: Option<&Value>) -> Vec<Procedure> {
    let mut items: Vec<Procedure> = list(value, "procedures")
        .iter()
        .map(|p| Procedure {
            code: fields::clean_text(&text(field(p, &["code", "codigo"]))),
            name: fields::clean_text(&text(field(p, &["name", "nombre"]))),
            date: fields::date(&text(field(p, &["date", "fecha"]))),
        })
        .filter(|p| !p.name.is_empty())
        .collect();
    // Stable: undated entries first, same-day entries keep input order.
    items.sort_by_key(|p| p.date);
    items
}

fn medications(value: Option<&Value>, name: &str) -> Vec<Medication> {
    list(value, name)
        .iter()
        .map(|m| {
            let duration = fields::clean_text(&text(field(m, &["duration", "duracion"])));
            Medication {
                code: fields::medication_code(&text(field(m, &["code", "codigo"]))),
                name: fields::clean_text(&text(field(m, &["name", "nombre"]))),
                dose: fields::dose(&text(field(m, &["dose", "dosis"]))),
                route: fields::route(&text(field(m, &["route", "via"]))),
                frequency: fields::clean_text(&text(field(m, &["frequency", "frecuencia"]))),
                duration: (!duration.is_empty()).then_some(duration),
            }
        })
        .filter(|m| !m.name.is_empty())
        .collect()
}

fn evolution(value: Option<&Value>) -> Vec<EvolutionNote> {
    let mut items: Vec<EvolutionNote> = list(value, "evolution")
        .iter()
        .map(|e| {
            let author = fields::clean_text(&text(field(e, &["author", "profesional"])));
            EvolutionNote {
                date: fields::date(&text(field(e, &["date", "fecha"]))),
                note: fields::clean_text(&text(field(e, &["note", "nota"]))),
                author: (!author.is_empty()).then_some(author),
            }
        })
        .filter(|e| !e.note.is_empty())
        .collect();
    items.sort_by_key(|e| e.date);
    items
}

fn labs(value: Option<&Value>) -> Vec<LabResult> {
    list(value, "labs")
        .iter()
        .map(|l| LabResult {
            parameter: fields::clean_text(&text(field(l, &["parameter", "parametro"]))),
            value: fields::clean_text(&text(field(l, &["value", "valor"]))),
            date: fields::date(&text(field(l, &["date", "fecha"]))),
        })
        .filter(|l| !l.parameter.is_empty() && !l.value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn legacy_export() -> Value {
        json!({
            "motivo_ingreso": "  Fiebre y   tos\n productiva ",
            "diagnostico_ingreso": "[{\"codigo\": \" j18.9 \", \"nombre\": \"Neumonía\"}]",
            "procedimientos": [
                {"codigo": "PROC-02", "nombre": "Ecografia abdominal", "fecha": "2024-03-05"},
                {"codigo": "PROC-01", "nombre": "Radiografia de torax", "fecha": "2024-03-01"},
                {"codigo": "PROC-03", "nombre": "", "fecha": "2024-03-02"}
            ],
            "tratamientos_intrahosp": [
                {"codigo": "j01ca04", "nombre": "Amoxicilina", "dosis": "500 miligramos", "via": "via oral", "frecuencia": "cada 8 horas"},
                {"codigo": "X", "nombre": null}
            ],
            "evolucion": [
                {"fecha": "2024-03-03", "nota": "Mejoria clinica", "profesional": "Dr. Soto"},
                {"fecha": "2024-03-01", "nota": "Ingresa febril"},
                {"fecha": "2024-03-02", "nota": "   "}
            ],
            "laboratorios_relevantes": [
                {"parametro": "PCR", "valor": 12.5, "fecha": "2024-03-01"},
                {"parametro": "Hemoglobina", "valor": ""}
            ],
            "diagnostico_egreso": [{"codigo": "", "nombre": ""}, {"codigo": "j18.9", "nombre": "Neumonia"}],
            "indicaciones_alta": {
                "medicamentos": [{"codigo": "N02BE01", "nombre": "Paracetamol", "dosis": "1 gramo", "via": "oral", "frecuencia": "cada 8 horas", "duracion": "5 dias"}],
                "controles": ["Control en 7 dias", "", null],
                "recomendaciones": "[\"Reposo relativo\"]"
            }
        })
    }

    #[test]
    fn normalizes_legacy_export() {
        let record = normalize(&legacy_export());

        assert_eq!(record.admission_reason, "Fiebre y tos productiva");
        assert_eq!(record.admission_diagnoses.len(), 1);
        assert_eq!(record.admission_diagnoses[0].code, "J18.9");
        assert_eq!(record.admission_diagnoses[0].name, "Neumonía");

        let med = &record.inpatient_medications[0];
        assert_eq!(record.inpatient_medications.len(), 1);
        assert_eq!(med.code, "J01CA04");
        assert_eq!(med.dose, "500 mg");
        assert_eq!(med.route, "VO");
        assert_eq!(med.duration, None);

        assert_eq!(record.labs.len(), 1);
        assert_eq!(record.labs[0].value, "12.5");

        assert_eq!(record.discharge_diagnoses.len(), 1);
        let discharge_med = &record.discharge.medications[0];
        assert_eq!(discharge_med.dose, "1 g");
        assert_eq!(discharge_med.duration.as_deref(), Some("5 dias"));
        assert_eq!(record.discharge.controls, vec!["Control en 7 dias"]);
        assert_eq!(record.discharge.recommendations, vec!["Reposo relativo"]);
    }

    #[test]
    fn procedures_and_evolution_sorted_by_date() {
        let record = normalize(&legacy_export());

        let names: Vec<&str> = record.procedures.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Radiografia de torax", "Ecografia abdominal"]);

        let notes: Vec<&str> = record.evolution.iter().map(|e| e.note.as_str()).collect();
        assert_eq!(notes, vec!["Ingresa febril", "Mejoria clinica"]);
        assert_eq!(record.evolution[1].author.as_deref(), Some("Dr. Soto"));
    }

    #[test]
    fn missing_and_malformed_fields_become_empty() {
        let record = normalize(&json!({
            "diagnostico_egreso": "{broken",
            "procedimientos": 7,
            "indicaciones_alta": null
        }));
        assert_eq!(record, ClinicalRecord::default());
    }

    #[test]
    fn non_object_input_is_empty_record() {
        assert_eq!(normalize(&json!("nope")), ClinicalRecord::default());
        assert_eq!(normalize(&Value::Null), ClinicalRecord::default());
    }

    #[test]
    fn canonical_names_are_accepted() {
        let record = normalize(&json!({
            "admission_reason": "Dolor toracico",
            "discharge_diagnoses": [{"code": "i21.0", "name": "Infarto agudo"}]
        }));
        assert_eq!(record.admission_reason, "Dolor toracico");
        assert_eq!(record.discharge_diagnoses[0].code, "I21.0");
    }

    #[test]
    fn normalize_is_idempotent_on_fixture() {
        let once = normalize(&legacy_export());
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    fn free_text() -> impl Strategy<Value = String> {
        prop_oneof![
            "[ a-zA-Z0-9áéíóúñ.,:/\\-\t\n\u{0001}]{0,24}",
            Just(String::new()),
        ]
    }

    fn raw_medication() -> impl Strategy<Value = Value> {
        (
            "[a-zA-Z0-9 .\\-]{0,9}",
            free_text(),
            prop_oneof![
                Just("500 miligramos"), Just("1 gramo"), Just("100 microgramos"),
                Just("5 mililitros"), Just("2 litros"), Just("10 unidades"), Just(" 20 mg "), Just(""),
            ],
            prop_oneof![
                Just("via oral"), Just("Intravenoso"), Just("subdermica"), Just("SC"),
                Just("Tópica"), Just("nebulizacion"), Just(""),
            ],
            free_text(),
            proptest::option::of(free_text()),
        )
            .prop_map(|(code, name, dose, route, frequency, duration)| {
                json!({
                    "codigo": code, "nombre": name, "dosis": dose,
                    "via": route, "frecuencia": frequency, "duracion": duration
                })
            })
    }

    fn raw_date() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("2024-03-01".to_string()),
            Just("02/03/2024".to_string()),
            Just("2024-03-03T12:00:00".to_string()),
            Just("no date".to_string()),
            Just(String::new()),
        ]
    }

    fn raw_record() -> impl Strategy<Value = Value> {
        (
            free_text(),
            proptest::collection::vec(("[a-zA-Z0-9 .\\-]{0,8}", free_text()), 0..4),
            proptest::collection::vec((free_text(), free_text(), raw_date()), 0..4),
            proptest::collection::vec(raw_medication(), 0..4),
            proptest::collection::vec((raw_date(), free_text(), proptest::option::of(free_text())), 0..4),
            proptest::collection::vec(free_text(), 0..3),
            any::<bool>(),
        )
            .prop_map(|(reason, dx, procs, meds, evo, controls, encode_lists)| {
                let dx: Vec<Value> = dx
                    .into_iter()
                    .map(|(c, n)| json!({"codigo": c, "nombre": n}))
                    .collect();
                let procs: Vec<Value> = procs
                    .into_iter()
                    .map(|(c, n, d)| json!({"codigo": c, "nombre": n, "fecha": d}))
                    .collect();
                let evo: Vec<Value> = evo
                    .into_iter()
                    .map(|(d, n, a)| json!({"fecha": d, "nota": n, "profesional": a}))
                    .collect();
                let dx_field = if encode_lists {
                    Value::String(Value::Array(dx.clone()).to_string())
                } else {
                    Value::Array(dx.clone())
                };
                json!({
                    "motivo_ingreso": reason,
                    "diagnostico_ingreso": dx_field,
                    "diagnostico_egreso": dx,
                    "procedimientos": procs,
                    "tratamientos_intrahosp": meds.clone(),
                    "evolucion": evo,
                    "indicaciones_alta": {"medicamentos": meds, "controles": controls}
                })
            })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in raw_record()) {
            let once = normalize(&raw);
            let reserialized = serde_json::to_value(&once).unwrap();
            let twice = normalize(&reserialized);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_codes_respect_alphabet(raw in raw_record()) {
            let record = normalize(&raw);
            for dx in record.admission_diagnoses.iter().chain(&record.discharge_diagnoses) {
                prop_assert!(dx.code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.'));
                prop_assert!(!dx.code.is_empty() || !dx.name.is_empty());
            }
            for med in record.inpatient_medications.iter().chain(&record.discharge.medications) {
                prop_assert!(med.code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
                prop_assert!(!med.name.is_empty());
            }
        }
    }
}
