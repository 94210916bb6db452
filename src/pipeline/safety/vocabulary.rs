//! Default word lists for the hallucination heuristics.
//!
//! All entries are already in matching form (lowercase, no diacritics).
//! They seed [`crate::pipeline_config::ValidatorConfig`] and can be
//! replaced per deployment.

/// Tokens that mark a phrase as clinical. Entries of four or more letters
/// also match as word prefixes ("antibiotico" covers "antibioticos").
pub const MEDICAL_TRIGGERS: &[&str] = &[
    "mg", "ev", "vo", "im", "sc", "cada", "hrs", "horas", "dias",
    "diagnostico", "neumonia", "insuficiencia", "fractura", "sepsis",
    "cirugia", "procedimiento", "tac", "rx", "ecg", "endoscopia",
    "antibiotico", "analgesia", "infeccion", "diabetes", "hipertension",
    "cardiopatia", "nefropatia", "hepatopatia", "anemia", "leucocitosis",
];

/// Descriptive phrases that are never a violation on their own.
pub const COMMON_PHRASES: &[&str] = &[
    "dias de", "dias del", "horas de", "horas del", "cada dia", "cada hora",
    "de evolucion", "evolucion caracterizado", "evolucion favorable",
    "con diagnostico", "diagnostico de", "sin diagnostico",
    "con procedimiento", "procedimiento de", "con cirugia", "cirugia de",
    "con antibiotico", "antibiotico por", "con analgesia", "analgesia con",
    "con tratamiento", "tratamiento con", "tratamiento antibiotico",
    "en tratamiento", "a tratamiento", "del tratamiento",
    "con medicamento", "medicamento por", "indicaciones farmacologicas",
];

/// Frequent findings and symptoms that progress notes mention without
/// coding them.
pub const COMMON_CLINICAL_TERMS: &[&str] = &[
    "ascitis", "ictericia", "edema", "derrame", "disnea", "taquicardia",
    "hipertension", "hipotension", "fiebre", "dolor", "nauseas", "vomitos",
    "diarrea", "constipacion", "cefalea", "mareos",
];

pub const DIAGNOSIS_SUFFIXES: &[&str] = &["itis", "osis", "emia", "penia", "patia", "algia"];

pub const MEDICATION_SUFFIXES: &[&str] = &[
    "micina", "cilina", "azol", "prazol", "tropin", "oxacino", "vastatina", "sartan",
];

pub const PROCEDURE_SUFFIXES: &[&str] = &["tomia", "scopia", "plastia", "grafia", "stomia"];

/// Ordinary words that happen to carry a clinical suffix.
pub const SUFFIX_EXEMPTIONS: &[&str] = &[
    "dosis", "academia", "nostalgia", "simpatia", "empatia", "fotografia", "geografia",
    "anatomia", "anatomica", "anatomico", "anatomicas", "anatomicos",
];

/// Code-shaped tokens that are common vocabulary, not record codes.
pub const CODE_EXEMPTIONS: &[&str] = &["covid-19", "b12"];
