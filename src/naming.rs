//! Display names for codepoint-named assets.
//!
//! An identifier such as `1F1FA-1F1F8` is decoded into its characters, the
//! canonical Unicode name of the resulting symbol is looked up, and the
//! all-caps name is turned into a title through [`REWRITE_RULES`]. Naming
//! never fails: undecodable identifiers get a generated label instead.

use crate::asset::IDENTIFIER_DELIMITER;
use log::warn;
use thiserror::Error;

/// Longest display name produced
pub const MAX_NAME_LEN: usize = 50;

/// Label used when a name cleans up to nothing
pub const UNKNOWN_NAME: &str = "Unknown Emoji";

/// Identifiers whose first codepoint starts with this prefix are treated as flags
pub const FLAG_PREFIX: &str = "1F1";

/// Version of the naming rules; bump whenever [`REWRITE_RULES`] or the
/// fallback labels change, since either changes the names of existing tokens
pub const NAMING_RULES_VERSION: u32 = 1;

/// Ordered prefix rewrites applied to canonical names.
///
/// Each rule only matches at the start of the string and is tried once, in
/// order, against the output of the previous rule. Reordering changes names.
pub const REWRITE_RULES: &[(&str, &str)] = &[
    ("EMOJI MODIFIER SEQUENCE", ""),
    ("REGIONAL INDICATOR SYMBOL LETTERS", "Flag"),
    ("REGIONAL INDICATOR SYMBOL LETTER", "Flag"),
    ("KEYCAP", "Keycap"),
    ("INPUT SYMBOL FOR", "Input Symbol"),
    ("A BUTTON (BLOOD TYPE)", "A Button (Blood Type)"),
    ("B BUTTON (BLOOD TYPE)", "B Button (Blood Type)"),
    ("O BUTTON (BLOOD TYPE)", "O Button (Blood Type)"),
    ("AB BUTTON (BLOOD TYPE)", "AB Button (Blood Type)"),
    ("CL BUTTON", "CL Button"),
    ("COOL BUTTON", "Cool Button"),
    ("FREE BUTTON", "Free Button"),
    ("ID BUTTON", "ID Button"),
    ("NEW BUTTON", "New Button"),
    ("NG BUTTON", "NG Button"),
    ("OK BUTTON", "OK Button"),
    ("SOS BUTTON", "SOS Button"),
    ("UP! BUTTON", "Up! Button"),
    ("VS BUTTON", "Vs Button"),
    ("HASH KEY", "Hash Key"),
    ("ASTERISK KEY", "Asterisk Key"),
    ("MINUS SIGN", "Minus Sign"),
    ("COPYRIGHT SIGN", "Copyright"),
    ("REGISTERED SIGN", "Registered"),
    ("MAHJONG TILE RED DRAGON", "Mahjong Red Dragon"),
    ("PLAYING CARD JOKER", "Joker"),
    ("INPUT LATIN LETTERS", "Input Latin Letters"),
    ("INPUT LATIN SMALL LETTER", "Input Latin Small Letter"),
    ("INPUT LATIN CAPITAL LETTER", "Input Latin Capital Letter"),
    ("INPUT LATIN CAPITAL LETTERS", "Input Latin Capital Letters"),
    ("INPUT LATIN SMALL LETTERS", "Input Latin Small Letters"),
    ("INPUT NUMBERS", "Input Numbers"),
    ("INPUT SYMBOLS", "Input Symbols"),
    ("P BUTTON", "P Button"),
];

const COMBINING_ENCLOSING_KEYCAP: char = '\u{20E3}';
const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// Reasons an identifier could not be resolved to a canonical name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("empty codepoint in identifier")]
    EmptyPart,

    #[error("'{0}' is not a hexadecimal codepoint")]
    InvalidHex(String),

    #[error("U+{0:X} is not a valid scalar value")]
    InvalidCodepoint(u32),

    #[error("U+{0:04X} has no assigned name")]
    Unassigned(u32),

    #[error("no name for sequence {0}")]
    UnnamedSequence(String),
}

/// Derive the display name for an asset identifier
///
/// Always returns a non-empty string of at most [`MAX_NAME_LEN`] characters.
pub fn derive_name(identifier: &str) -> String {
    match resolve_name(identifier) {
        Ok(name) => name,
        Err(err) => {
            warn!("Could not get Unicode name for {}: {}", identifier, err);
            fallback_name(identifier)
        }
    }
}

/// The fallible naming path: decode, look up, and clean up
pub fn resolve_name(identifier: &str) -> Result<String, NameError> {
    let chars = parse_codepoints(identifier)?;
    let canonical = canonical_name(&chars)?;
    Ok(clean_name(&canonical))
}

/// Label for identifiers whose name cannot be resolved
pub fn fallback_name(identifier: &str) -> String {
    let mut parts = identifier.split(IDENTIFIER_DELIMITER);
    let first = parts.next().unwrap_or_default();
    let is_sequence = parts.next().is_some();

    let label = if is_sequence && first.to_ascii_uppercase().starts_with(FLAG_PREFIX) {
        format!("Flag: {identifier}")
    } else {
        format!("Emoji {identifier}")
    };
    truncate_name(&label)
}

/// Decode a `-`-delimited list of hexadecimal codepoints
pub fn parse_codepoints(identifier: &str) -> Result<Vec<char>, NameError> {
    identifier
        .split(IDENTIFIER_DELIMITER)
        .map(|part| {
            if part.is_empty() {
                return Err(NameError::EmptyPart);
            }
            let value = u32::from_str_radix(part, 16)
                .map_err(|_| NameError::InvalidHex(part.to_string()))?;
            char::from_u32(value).ok_or(NameError::InvalidCodepoint(value))
        })
        .collect()
}

/// Canonical all-caps name of a single character or a composed symbol
pub fn canonical_name(chars: &[char]) -> Result<String, NameError> {
    if let [single] = chars {
        return char_name(*single);
    }

    let significant: Vec<char> = chars
        .iter()
        .copied()
        .filter(|c| !is_variation_selector(*c))
        .collect();

    match significant.as_slice() {
        [single] => char_name(*single),
        [base, COMBINING_ENCLOSING_KEYCAP] => Ok(format!("KEYCAP {}", char_name(*base)?)),
        [base, modifier] if is_skin_tone_modifier(*modifier) => Ok(format!(
            "EMOJI MODIFIER SEQUENCE {} {}",
            char_name(*base)?,
            char_name(*modifier)?
        )),
        letters if letters.len() > 1 && letters.iter().all(|c| is_regional_indicator(*c)) => {
            let code: String = letters
                .iter()
                .filter_map(|c| char::from_u32(u32::from(b'A') + (*c as u32 - REGIONAL_INDICATOR_A)))
                .collect();
            Ok(format!("REGIONAL INDICATOR SYMBOL LETTERS {code}"))
        }
        _ => Err(NameError::UnnamedSequence(
            chars
                .iter()
                .map(|c| format!("{:X}", *c as u32))
                .collect::<Vec<_>>()
                .join(" "),
        )),
    }
}

/// Apply the rewrite table, trim, and bound the length
pub fn clean_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    for (prefix, replacement) in REWRITE_RULES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = format!("{replacement}{rest}");
        }
    }

    let cleaned = truncate_name(cleaned.trim());
    if cleaned.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        cleaned
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > MAX_NAME_LEN {
        let head: String = name.chars().take(MAX_NAME_LEN - 3).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

fn char_name(c: char) -> Result<String, NameError> {
    unicode_names2::name(c)
        .map(|name| name.to_string())
        .ok_or(NameError::Unassigned(c as u32))
}

fn is_variation_selector(c: char) -> bool {
    matches!(c, '\u{FE0E}' | '\u{FE0F}')
}

fn is_skin_tone_modifier(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}
