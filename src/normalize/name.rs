use once_cell::sync::Lazy;
use regex::Regex;

static HYPHEN_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").expect("valid regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));
static PHONE_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(?\d{3}\)?[-.\s]?\d{3}[-.]?\d{4}").expect("valid regex"));
static EXTENSION_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*ext\.?\s*\d+").expect("valid regex"));

/// Strings that spreadsheets and LLMs use to mean "no value"
const NULL_SENTINELS: [&str; 5] = ["nan", "none", "null", "fff", "n/a"];

pub fn is_null_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || NULL_SENTINELS.iter().any(|s| trimmed.eq_ignore_ascii_case(s))
}

/// Trim a raw field; blanks and null sentinels become `None`.
pub fn clean_input(raw: &str) -> Option<String> {
    if is_null_sentinel(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

/// Remove phone numbers and extensions that sales staff type into name fields.
pub fn strip_contact_noise(raw: &str) -> String {
    let without_ext = EXTENSION_IN_NAME.replace_all(raw, "");
    PHONE_IN_NAME.replace_all(&without_ext, "").trim().to_string()
}

/// Capitalise the first letter of each alphabetic run, lowercase the rest.
/// `o'brien` becomes `O'Brien` and `ewing-ervin` becomes `Ewing-Ervin`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

/// Normalise a name for output: hyphen spacing collapsed, digits dropped,
/// whitespace squeezed, title-cased. Sentinels and empty results are `None`.
pub fn clean_name_for_display(raw: &str) -> Option<String> {
    if is_null_sentinel(raw) {
        return None;
    }
    let joined = HYPHEN_SPACING.replace_all(raw.trim(), "-");
    let no_digits = DIGITS.replace_all(&joined, "");
    let squeezed = no_digits.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = squeezed.trim_matches(|c: char| c == '-' || c == '_' || c.is_whitespace());
    if trimmed.is_empty() || !trimmed.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    Some(title_case(trimmed))
}

fn is_middle_initial(token: &str) -> bool {
    let len = token.chars().count();
    (len == 1 && token.chars().all(|c| c.is_alphabetic()))
        || (len == 2 && token.ends_with('.') && token.chars().next().map_or(false, |c| c.is_alphabetic()))
}

/// Split a free-text person name into `(first, last)`, both display-cleaned.
///
/// Handles `LAST, FIRST`, a middle initial folded into the first name
/// (`JOHN Q SMITH` gives `John Q.` / `Smith`) and spaced hyphens
/// (`EWING - ERVIN` stays one `Ewing-Ervin` token).
pub fn split_name(full_name: &str) -> (Option<String>, Option<String>) {
    if is_null_sentinel(full_name) {
        return (None, None);
    }
    let normalized = HYPHEN_SPACING.replace_all(full_name.trim(), "-").to_string();

    if let Some((last, first)) = normalized.split_once(',') {
        let first = first.trim();
        let last = last.trim();
        if first.is_empty() {
            return split_name(last);
        }
        let first_token = first.split_whitespace().next().unwrap_or(first);
        return (
            clean_name_for_display(first_token).or_else(|| clean_name_for_display(first)),
            clean_name_for_display(last),
        );
    }

    let tokens: Vec<&str> = normalized
        .split_whitespace()
        .filter(|t| !t.chars().all(|c| c == '-' || c == '_' || c == '.'))
        .collect();

    match tokens.len() {
        0 => (None, None),
        1 => (clean_name_for_display(tokens[0]), None),
        2 => (clean_name_for_display(tokens[0]), clean_name_for_display(tokens[1])),
        _ => {
            if is_middle_initial(tokens[1]) {
                let initial = tokens[1].trim_end_matches('.').to_uppercase();
                let first = clean_name_for_display(tokens[0]).map(|f| format!("{} {}.", f, initial));
                (first, clean_name_for_display(&tokens[2..].join(" ")))
            } else {
                (clean_name_for_display(tokens[0]), clean_name_for_display(&tokens[1..].join(" ")))
            }
        }
    }
}
