//! Character substitution, applied before any other canonicalization step

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Transliteration table applied character by character
///
/// `WestEuropean` folds German umlauts to their two-letter spelling
/// (`ä` -> `ae`, `ß` -> `ss`) and strips the accents of the other
/// western European letters (`é` -> `e`, `ñ` -> `n`). Characters without
/// an entry pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterSubstituter {
    /// Built-in western European table
    WestEuropean,
    /// Caller supplied table; every key must be exactly one character
    Custom(BTreeMap<String, String>),
}

#[rustfmt::skip]
const WEST_EUROPEAN: &[(char, &str)] = &[
    ('ä', "ae"), ('ö', "oe"), ('ü', "ue"), ('Ä', "Ae"), ('Ö', "Oe"), ('Ü', "Ue"),
    ('ß', "ss"), ('æ', "ae"), ('Æ', "Ae"), ('œ', "oe"), ('Œ', "Oe"),
    ('à', "a"), ('á', "a"), ('â', "a"), ('ã', "a"), ('å', "a"),
    ('À', "A"), ('Á', "A"), ('Â', "A"), ('Ã', "A"), ('Å', "A"),
    ('è', "e"), ('é', "e"), ('ê', "e"), ('ë', "e"),
    ('È', "E"), ('É', "E"), ('Ê', "E"), ('Ë', "E"),
    ('ì', "i"), ('í', "i"), ('î', "i"), ('ï', "i"),
    ('Ì', "I"), ('Í', "I"), ('Î', "I"), ('Ï', "I"),
    ('ò', "o"), ('ó', "o"), ('ô', "o"), ('õ', "o"), ('ø', "o"),
    ('Ò', "O"), ('Ó', "O"), ('Ô', "O"), ('Õ', "O"), ('Ø', "O"),
    ('ù', "u"), ('ú', "u"), ('û', "u"), ('Ù', "U"), ('Ú', "U"), ('Û', "U"),
    ('ý', "y"), ('ÿ', "y"), ('Ý', "Y"),
    ('ç', "c"), ('Ç', "C"), ('ñ', "n"), ('Ñ', "N"),
];

/// Compiled substitution table
#[derive(Debug, Clone)]
pub(crate) struct SubstitutionTable {
    map: FxHashMap<char, String>,
}

impl SubstitutionTable {
    /// Build the lookup table; fails on a custom key that is not a single character
    pub(crate) fn compile(substituter: &CharacterSubstituter) -> Result<Self, String> {
        let map = match substituter {
            CharacterSubstituter::WestEuropean => WEST_EUROPEAN
                .iter()
                .map(|(from, to)| (*from, to.to_string()))
                .collect(),
            CharacterSubstituter::Custom(entries) => {
                let mut map = FxHashMap::default();
                for (from, to) in entries {
                    let mut chars = from.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => {
                            map.insert(c, to.clone());
                        }
                        _ => {
                            return Err(format!(
                                "substitution key '{}' must be exactly one character",
                                from
                            ))
                        }
                    }
                }
                map
            }
        };
        Ok(SubstitutionTable { map })
    }

    /// Replace every mapped character; borrows when nothing matches
    pub(crate) fn substitute<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.chars().any(|c| self.map.contains_key(&c)) {
            return Cow::Borrowed(text);
        }
        let mut out = String::with_capacity(text.len() + 8);
        for c in text.chars() {
            match self.map.get(&c) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_west_european_umlauts() {
        let table = SubstitutionTable::compile(&CharacterSubstituter::WestEuropean).unwrap();
        assert_eq!(table.substitute("Müller"), "Mueller");
        assert_eq!(table.substitute("Straße"), "Strasse");
        assert_eq!(table.substitute("Ärger"), "Aerger");
    }

    #[test]
    fn test_west_european_accents() {
        let table = SubstitutionTable::compile(&CharacterSubstituter::WestEuropean).unwrap();
        assert_eq!(table.substitute("café crème"), "cafe creme");
        assert_eq!(table.substitute("niño"), "nino");
    }

    #[test]
    fn test_untouched_text_is_borrowed() {
        let table = SubstitutionTable::compile(&CharacterSubstituter::WestEuropean).unwrap();
        assert!(matches!(table.substitute("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_custom_table() {
        let mut entries = BTreeMap::new();
        entries.insert("&".to_string(), " and ".to_string());
        let table = SubstitutionTable::compile(&CharacterSubstituter::Custom(entries)).unwrap();
        assert_eq!(table.substitute("salt&pepper"), "salt and pepper");
    }

    #[test]
    fn test_custom_table_rejects_long_keys() {
        let mut entries = BTreeMap::new();
        entries.insert("ab".to_string(), "c".to_string());
        let err = SubstitutionTable::compile(&CharacterSubstituter::Custom(entries)).unwrap_err();
        assert!(err.contains("'ab'"));
    }
}
