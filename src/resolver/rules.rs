//! Deterministic name extraction, the last tier of the cascade.
//!
//! Source priority: contact name, then customer name (only when it is not a
//! business), then the email local-part to fill whatever is still missing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::business::{is_company_name, is_valid_last_name};
use crate::normalize::email::{is_generic_mailbox, local_part};
use crate::normalize::name::{clean_name_for_display, split_name, strip_contact_noise, title_case};
use crate::types::{NameInput, NameResult, ResolutionMethod};

static MULTI_PERSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*&\s*|\s+and\s+|\s*\+\s*").expect("valid regex"));

type NamePair = (Option<String>, Option<String>);

fn letters_lower(value: &str) -> String {
    value.chars().filter(|c| c.is_alphabetic()).flat_map(|c| c.to_lowercase()).collect()
}

fn first_token_lower(first: &str) -> String {
    letters_lower(first.split_whitespace().next().unwrap_or(first))
}

/// `first.last`, `first_last` or `first-last` local-parts.
fn separated_name(local: &str) -> Option<(String, String)> {
    for separator in ['.', '_', '-'] {
        if !local.contains(separator) {
            continue;
        }
        let mut parts = local.split(separator);
        let (Some(a), Some(b)) = (parts.next(), parts.next()) else {
            continue;
        };
        if a.chars().count() < 2 || b.chars().count() < 2 {
            continue;
        }
        let (Some(first), Some(last)) = (clean_name_for_display(a), clean_name_for_display(b)) else {
            continue;
        };
        if first.chars().count() < 2 || last.chars().count() < 2 {
            continue;
        }
        if is_company_name(&first) || !is_valid_last_name(&last) {
            continue;
        }
        return Some((first, last));
    }
    None
}

/// Two-letter word openings: `chris`, `brian` and `steve` are names, not
/// an initial glued to a surname.
const NAME_ONSETS: [&str; 31] = [
    "bl", "br", "ch", "cl", "cr", "dr", "dw", "fl", "fr", "gl", "gn", "gr", "gw", "kn", "kr", "ph",
    "pl", "pr", "sc", "sh", "sk", "sl", "sm", "sn", "sp", "st", "sw", "th", "tr", "tw", "wh",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// True when a lowercase local-part opens like an ordinary word, the way
/// `jane`, `matt` or `chris` do. `mholland` and `tgarlock` do not.
fn reads_as_first_name(local: &str) -> bool {
    let mut chars = local.chars();
    let (Some(a), Some(b)) = (chars.next(), chars.next()) else {
        return true;
    };
    if is_vowel(a) {
        return !is_vowel(b);
    }
    is_vowel(b) || NAME_ONSETS.iter().any(|onset| local.starts_with(onset))
}

/// `tgarlock` read as initial `T` plus surname `Garlock`.
fn initial_and_surname(local: &str) -> Option<(String, String)> {
    if local.chars().count() <= 3 || !local.chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    if reads_as_first_name(local) {
        return None;
    }
    let mut chars = local.chars();
    let initial = chars.next()?.to_uppercase().collect::<String>();
    let rest: String = chars.collect();
    if rest.chars().count() < 3 {
        return None;
    }
    let surname = title_case(&rest);
    if is_company_name(&surname) || !is_valid_last_name(&surname) {
        return None;
    }
    Some((initial, surname))
}

/// The whole local-part, digits removed, as a first name.
fn first_name_only(local: &str) -> Option<String> {
    let stripped: String = local.chars().filter(|c| !c.is_ascii_digit()).collect();
    if stripped.chars().count() < 2 || !stripped.chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    let name = title_case(&stripped);
    if is_company_name(&name) {
        return None;
    }
    Some(name)
}

/// Derive a name from an email local-part.
///
/// With `strict` set only the unambiguous `first.last` shape is trusted, which
/// keeps handles like `SABSV1111` from turning into a person.
pub fn extract_name_from_email(email: &str, strict: bool) -> NamePair {
    let email = email.trim();
    if !email.contains('@') || is_generic_mailbox(email) {
        return (None, None);
    }
    let local = local_part(email).to_lowercase();

    if let Some((first, last)) = separated_name(&local) {
        return (Some(first), Some(last));
    }
    if strict {
        return (None, None);
    }
    if let Some((initial, surname)) = initial_and_surname(&local) {
        return (Some(initial), Some(surname));
    }
    (first_name_only(&local), None)
}

/// Last name from the email, accepted only when the email agrees with `first`.
fn last_name_from_email(first: &str, email: &str) -> Option<String> {
    if is_generic_mailbox(email) {
        return None;
    }
    let first_token = first_token_lower(first);
    if first_token.is_empty() {
        return None;
    }
    let local = local_part(email.trim()).to_lowercase();

    if let Some((email_first, email_last)) = separated_name(&local) {
        return (letters_lower(&email_first) == first_token).then_some(email_last);
    }

    let local = local.trim_end_matches(|c: char| c.is_ascii_digit());
    // "sandy@..." for Sandy is the first name again, not S. Andy
    if local.starts_with(&first_token) {
        return None;
    }
    let (initial, surname) = initial_and_surname(local)?;
    first_token
        .starts_with(&initial.to_lowercase())
        .then_some(surname)
}

/// How well a candidate person matches the email local-part.
fn email_match_score(first: Option<&str>, last: Option<&str>, local: &str) -> u8 {
    let local = letters_lower(local);
    if local.is_empty() {
        return 0;
    }
    if let Some(last) = last.map(letters_lower).filter(|l| l.len() >= 2) {
        if local.contains(&last) {
            return 3;
        }
    }
    if let Some(first) = first.map(first_token_lower).filter(|f| !f.is_empty()) {
        if first.len() >= 2 && local.contains(&first) {
            return 2;
        }
        if first.chars().next() == local.chars().next() {
            return 1;
        }
    }
    0
}

fn person_name(text: &str) -> NamePair {
    let (first, last) = split_name(text);
    (first, last.filter(|l| is_valid_last_name(l)))
}

/// Pick one person out of `KOREY KOENIG-DAMIENS & TAMERA`.
fn pick_person(field: &str, email_local: Option<&str>) -> NamePair {
    let candidates: Vec<NamePair> = MULTI_PERSON
        .split(field)
        .map(str::trim)
        .filter(|part| !part.is_empty() && !is_company_name(part))
        .map(person_name)
        .filter(|(first, _)| first.is_some())
        .collect();

    let mut best: Option<(u8, &NamePair)> = None;
    for candidate in &candidates {
        let score = email_local
            .map(|local| email_match_score(candidate.0.as_deref(), candidate.1.as_deref(), local))
            .unwrap_or(0);
        if best.map_or(true, |(best_score, _)| score > best_score) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, pair)| pair.clone()).unwrap_or((None, None))
}

/// Split a free-text name field into a person name, or nothing for businesses.
pub fn names_from_field(field: &str, email_local: Option<&str>) -> NamePair {
    let field = strip_contact_noise(field);
    if field.is_empty() || field.contains('@') || is_company_name(&field) {
        return (None, None);
    }
    if MULTI_PERSON.is_match(&field) {
        return pick_person(&field, email_local);
    }
    person_name(&field)
}

/// Like [`names_from_field`] but tolerates `PERSON - COMPANY` fields.
fn names_from_contact(field: &str, email_local: Option<&str>) -> NamePair {
    let cleaned = strip_contact_noise(field);
    if let Some((left, right)) = cleaned.split_once(" - ") {
        match (is_company_name(left), is_company_name(right)) {
            (false, true) => return names_from_field(left, email_local),
            (true, false) => return names_from_field(right, email_local),
            _ => {}
        }
    }
    names_from_field(&cleaned, email_local)
}

fn looks_like_person(field: &str) -> bool {
    let cleaned = strip_contact_noise(field);
    if cleaned.is_empty() || cleaned.contains('@') {
        return false;
    }
    match cleaned.split_once(" - ") {
        Some((left, right)) if !is_company_name(left) || !is_company_name(right) => true,
        _ => !is_company_name(&cleaned),
    }
}

/// Rule-based tier. Cannot fail; a row with no person behind it yields no names.
pub fn resolve_with_rules(input: &NameInput) -> NameResult {
    let email = input.email.as_deref().map(str::trim).filter(|e| e.contains('@'));
    let email_local = email
        .filter(|e| !is_generic_mailbox(e))
        .map(|e| local_part(e).to_lowercase());

    let contact = input.contact_name.as_deref();
    let contact_is_person = contact.map(looks_like_person).unwrap_or(false);

    let (mut first, mut last) = match contact.filter(|_| contact_is_person) {
        Some(contact) => names_from_contact(contact, email_local.as_deref()),
        None => (None, None),
    };

    let customer = input.customer_name.as_deref();
    let customer_is_business = customer.map(is_company_name).unwrap_or(false);
    if let Some(customer) = customer.filter(|_| !customer_is_business) {
        let (customer_first, customer_last) = names_from_field(customer, email_local.as_deref());
        match first.as_deref() {
            None => {
                first = customer_first;
                last = customer_last;
            }
            Some(known) if last.is_none() => {
                let agrees = customer_first
                    .as_deref()
                    .map(|f| first_token_lower(f) == first_token_lower(known))
                    .unwrap_or(false);
                if agrees {
                    last = customer_last;
                }
            }
            _ => {}
        }
    }

    if let Some(email) = email {
        match first.as_deref() {
            None => {
                let strict = customer_is_business || (contact.is_some() && !contact_is_person);
                let (email_first, email_last) = extract_name_from_email(email, strict);
                first = email_first;
                last = email_last;
            }
            Some(known) if last.is_none() => last = last_name_from_email(known, email),
            _ => {}
        }
    }

    let last = last.filter(|l| is_valid_last_name(l));
    NameResult::from_tier(first, last, ResolutionMethod::RuleBased)
}
