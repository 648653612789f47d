use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'\-]+@(?:[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$")
        .expect("valid regex")
});

/// Local-parts that never identify a person and are rejected outright
const REJECTED_LOCAL_PARTS: [&str; 6] = ["info", "sales", "admin", "contact", "support", "help"];

/// Placeholder values sales staff type when the real address is unknown
const GARBAGE_TOKENS: [&str; 6] = ["fff", "nan", "null", "none", "error", "test"];

/// Shared or role mailboxes; valid for export but a hint that no person is behind them
const GENERIC_MAILBOXES: [&str; 9] = [
    "info",
    "sales",
    "support",
    "admin",
    "noreply",
    "workplace-support",
    "help",
    "contact",
    "service",
];

/// Local part of an address, or the whole string when there is no `@`.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Shape check plus the blacklist of role and placeholder local-parts.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.matches('@').count() != 1 || !EMAIL_SHAPE.is_match(email) {
        return false;
    }

    let lower = email.to_lowercase();
    let local = local_part(&lower);

    if REJECTED_LOCAL_PARTS.contains(&local) {
        return false;
    }
    if local.chars().count() < 2 || local.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    !local
        .split(|c: char| matches!(c, '.' | '_' | '-' | '+'))
        .any(|segment| GARBAGE_TOKENS.contains(&segment))
}

/// True for role addresses like `info@` or `workplace-support@`.
pub fn is_generic_mailbox(email: &str) -> bool {
    let lower = email.trim().to_lowercase();
    GENERIC_MAILBOXES.contains(&local_part(&lower))
}

/// Pull the address out of `Name <addr>`; other text is returned trimmed.
fn unwrap_angle_brackets(piece: &str) -> &str {
    match (piece.find('<'), piece.find('>')) {
        (Some(start), Some(end)) if end > start => piece[start + 1..end].trim(),
        _ => piece.trim(),
    }
}

fn letters_only(value: &str) -> String {
    value.chars().filter(|c| c.is_alphabetic()).flat_map(|c| c.to_lowercase()).collect()
}

/// Does this address look like it belongs to the named contact?
fn matches_contact(email: &str, contact: &str) -> bool {
    let local = letters_only(local_part(email));
    let contact_compact = letters_only(contact);
    if local.len() < 2 || contact_compact.is_empty() {
        return false;
    }
    if local.contains(&contact_compact) || contact_compact.contains(&local) {
        return true;
    }
    contact
        .split_whitespace()
        .map(letters_only)
        .any(|token| token.len() >= 3 && local.contains(&token))
}

/// Reduce a raw email cell to a single valid address.
///
/// Handles `Name <addr>` wrappers and `;`/`,` separated lists. When several
/// addresses survive validation, the one matching `contact_name` wins,
/// otherwise the first. Returns `None` when nothing valid remains.
pub fn clean_email(raw: &str, contact_name: Option<&str>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let candidates: Vec<&str> = raw
        .split(|c| c == ';' || c == ',')
        .map(unwrap_angle_brackets)
        .filter(|piece| !piece.is_empty())
        .filter(|piece| is_valid_email(piece))
        .collect();

    if candidates.len() > 1 {
        if let Some(contact) = contact_name.filter(|c| !c.trim().is_empty()) {
            if let Some(matched) = candidates.iter().find(|e| matches_contact(e, contact)) {
                return Some(matched.to_string());
            }
        }
    }

    candidates.first().map(|e| e.to_string())
}
