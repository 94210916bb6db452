//! Chilean clinical abbreviations and their expansions.

use super::text::find_phrase;

/// Abbreviation followed by its equivalent spellings, in matching form.
pub const CLINICAL_SYNONYMS: &[(&str, &[&str])] = &[
    // Imaging
    ("tac", &["tomografia computada", "tc", "scanner"]),
    ("rx", &["radiografia", "rayos x"]),
    // Units
    ("uci", &["unidad de cuidados intensivos", "upc"]),
    ("uti", &["unidad de tratamiento intensivo"]),
    // Routes
    ("ev", &["endovenoso", "intravenoso", "iv"]),
    ("vo", &["via oral", "oral"]),
    ("im", &["intramuscular"]),
    ("sc", &["subcutaneo", "subcutanea"]),
    // Conditions
    ("pcr", &["paro cardiorrespiratorio", "paro cardiorespiratorio"]),
    ("irc", &["insuficiencia renal cronica"]),
    ("ira", &["insuficiencia renal aguda"]),
    ("icc", &["insuficiencia cardiaca congestiva"]),
    ("epoc", &["enfermedad pulmonar obstructiva cronica"]),
    ("avc", &["accidente vascular cerebral", "ave"]),
    ("iam", &["infarto agudo al miocardio"]),
    ("tec", &["traumatismo encefalocraneano"]),
    ("hta", &["hipertension arterial"]),
    ("dm", &["diabetes mellitus"]),
    ("dm2", &["diabetes mellitus tipo 2"]),
    // Vital signs
    ("pa", &["presion arterial"]),
    ("fc", &["frecuencia cardiaca"]),
    ("fr", &["frecuencia respiratoria"]),
    ("sat o2", &["saturacion de oxigeno", "sao2"]),
    ("temp", &["temperatura"]),
];

fn group_members(key: &'static str, alts: &'static [&'static str]) -> Vec<&'static str> {
    std::iter::once(key).chain(alts.iter().copied()).collect()
}

/// Every spelling equivalent to `term`, including itself. Unknown terms
/// yield just themselves.
pub fn equivalents(term: &str) -> Vec<String> {
    CLINICAL_SYNONYMS
        .iter()
        .find(|(key, alts)| *key == term || alts.contains(&term))
        .map(|&(key, alts)| group_members(key, alts).into_iter().map(str::to_string).collect())
        .unwrap_or_else(|| vec![term.to_string()])
}

pub fn are_synonyms(a: &str, b: &str) -> bool {
    a == b || equivalents(a).iter().any(|e| e == b)
}

/// Spellings of a whitelisted name with one abbreviation swapped for each
/// of its equivalents: "tomografia computada de torax" also admits
/// "tac de torax". The name itself comes first.
pub fn name_variants(name: &str) -> Vec<String> {
    let mut variants = vec![name.to_string()];
    for &(key, alts) in CLINICAL_SYNONYMS {
        let members = group_members(key, alts);
        for member in &members {
            let Some(at) = find_phrase(name, member) else {
                continue;
            };
            for replacement in members.iter().filter(|m| *m != member) {
                let variant = format!(
                    "{}{}{}",
                    &name[..at],
                    replacement,
                    &name[at + member.len()..]
                );
                if !variants.contains(&variant) {
                    variants.push(variant);
                }
            }
        }
    }
    variants
}
