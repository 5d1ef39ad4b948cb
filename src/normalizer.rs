//! Accent- and case-folding of emails ahead of rule evaluation

use unicode_normalization::UnicodeNormalization;

use crate::models::{Email, EmailField};

/// Remove diacritical marks, leaving letter case untouched ("Ápplé" -> "Apple")
///
/// Decomposes to NFD, drops accent marks and recomposes. Marks that are part
/// of a letter (Devanagari vowel signs, Thai vowels, kana voicing) are kept,
/// so `が` stays distinct from `か`.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|ch| !is_diacritic(*ch)).nfc().collect()
}

/// Combining Diacritical Marks and its supplement/extension blocks
fn is_diacritic(ch: char) -> bool {
    matches!(
        ch,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}

/// Normalize an email in place for keyword matching
///
/// Labels are lower-cased, then every text field is diacritic-stripped.
/// Text fields keep their case; rule patterns are case-insensitive.
pub fn normalize_email(email: &mut Email) -> &mut Email {
    for label in email.labels.iter_mut() {
        *label = label.to_lowercase();
    }

    for field in EmailField::ALL {
        let value = email.field_mut(field);
        if !value.is_empty() {
            *value = strip_diacritics(value);
        }
    }

    email
}
