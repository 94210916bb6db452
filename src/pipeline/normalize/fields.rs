use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Trim, collapse whitespace runs and drop control characters.
///
/// Whitespace controls (tab, newline) act as separators; the rest are removed.
pub fn clean_text(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFD-decompose and drop combining marks: "Neumonía" → "Neumonia".
pub fn fold_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// CIE-10 code: uppercase, only `[A-Z0-9.]` survives.
pub fn diagnosis_code(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '.')
        .collect()
}

/// ATC code: uppercase, only `[A-Z0-9]` survives.
pub fn medication_code(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

// Order matters: compound prefixes before the bare unit they contain.
static DOSE_UNITS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)miligram[oa]s?", "mg"),
        (r"(?i)microgr?am[oa]s?", "mcg"),
        (r"(?i)gram[oa]s?", "g"),
        (r"(?i)mililitros?", "ml"),
        (r"(?i)litros?", "L"),
        (r"(?i)unidades?", "UI"),
    ]
    .into_iter()
    .map(|(pattern, unit)| (Regex::new(pattern).expect("valid dose regex"), unit))
    .collect()
});

/// Fold spelled-out Spanish units to their abbreviations.
pub fn dose(raw: &str) -> String {
    let mut text = clean_text(raw);
    for (pattern, unit) in DOSE_UNITS.iter() {
        if pattern.is_match(&text) {
            text = pattern.replace_all(&text, *unit).into_owned();
        }
    }
    text
}

/// Canonical route abbreviation; unknown routes are kept uppercased.
pub fn route(raw: &str) -> String {
    let text = clean_text(raw);
    if text.is_empty() {
        return text;
    }
    let key = fold_diacritics(&text.to_lowercase());
    let canonical = match key.as_str() {
        "oral" | "via oral" | "vo" => "VO",
        "endovenoso" | "endovenosa" | "intravenoso" | "intravenosa" | "ev" | "iv" => "EV",
        "intramuscular" | "im" => "IM",
        "subcutaneo" | "subcutanea" | "sc" => "SC",
        "sublingual" | "sl" => "SL",
        "topico" | "topica" => "TOP",
        "inhalatoria" => "INH",
        "nebulizacion" => "NBZ",
        "rectal" => "REC",
        _ => return text.to_uppercase(),
    };
    canonical.to_string()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Calendar date from the formats clinical exports use. Anything else is
/// `None`, never a guessed date.
pub fn date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_and_strips_controls() {
        assert_eq!(clean_text("  Neumonia \t\n  grave\u{0007} "), "Neumonia grave");
        assert_eq!(clean_text("a\u{0001}b"), "ab");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn fold_diacritics_strips_accents() {
        assert_eq!(fold_diacritics("Neumonía adquirida en la comunidad"), "Neumonia adquirida en la comunidad");
        assert_eq!(fold_diacritics("subcutánea"), "subcutanea");
    }

    #[test]
    fn diagnosis_code_is_uppercase_and_filtered() {
        assert_eq!(diagnosis_code("  j18.9 "), "J18.9");
        assert_eq!(diagnosis_code("i21-0"), "I210");
    }

    #[test]
    fn medication_code_drops_punctuation() {
        assert_eq!(medication_code("j01ca04"), "J01CA04");
        assert_eq!(medication_code("J01.CA.04"), "J01CA04");
    }

    #[test]
    fn dose_folds_spanish_units() {
        assert_eq!(dose("500 miligramos"), "500 mg");
        assert_eq!(dose("1 Gramo"), "1 g");
        assert_eq!(dose("100 microgramos"), "100 mcg");
        assert_eq!(dose("5 mililitros"), "5 ml");
        assert_eq!(dose("1 litro"), "1 L");
        assert_eq!(dose("10 unidades"), "10 UI");
    }

    #[test]
    fn route_maps_known_values() {
        assert_eq!(route("via oral"), "VO");
        assert_eq!(route("Vía Oral"), "VO");
        assert_eq!(route("Intravenoso"), "EV");
        assert_eq!(route("iv"), "EV");
        assert_eq!(route("subcutánea"), "SC");
        assert_eq!(route("nebulizacion"), "NBZ");
    }

    #[test]
    fn route_keeps_unknown_uppercased() {
        assert_eq!(route("subdermica"), "SUBDERMICA");
        assert_eq!(route(""), "");
    }

    #[test]
    fn route_is_stable_on_canonical_values() {
        for canonical in ["VO", "EV", "IM", "SC", "SL", "TOP", "INH", "NBZ", "REC"] {
            assert_eq!(route(canonical), canonical);
        }
    }

    #[test]
    fn date_accepts_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(date("2024-03-15"), expected);
        assert_eq!(date("2024-03-15T10:30:00"), expected);
        assert_eq!(date("2024-03-15T10:30:00-03:00"), expected);
        assert_eq!(date("15/03/2024"), expected);
        assert_eq!(date("2024-03-15 08:00:00"), expected);
    }

    #[test]
    fn date_rejects_garbage() {
        assert_eq!(date("ayer"), None);
        assert_eq!(date("2024-13-45"), None);
        assert_eq!(date(""), None);
    }
}
