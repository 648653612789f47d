//! Business-vs-person classification for name fields.
//!
//! The keyword lists here are the only ones in the crate. Matching is on whole
//! tokens or whole phrases, so a surname that merely contains a keyword, like
//! `Barone` or `Rock`, is not flagged.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Single-token organisational, legal and industry terms
const COMPANY_KEYWORDS: &[&str] = &[
    // legal forms
    "LLC", "INC", "CORP", "CORPORATION", "LTD", "CO", "COMPANY", "ENTERPRISES", "HOLDINGS",
    "INTERNATIONAL", "PARTNERS", "GROUP",
    // events and hospitality
    "EVENTS", "EVENT", "EVEENTS", "CENTER", "CENTRE", "RENTAL", "RENTALS", "CATERING",
    "CATERED", "CATERERS", "VENUE", "BARTENDING", "CLUBHOUSE", "RESTAURANT", "STEAKHOUSE", "CAFE",
    "DELI", "HOTEL", "PLAZA", "ARENA", "ZOO", "BAKERY", "GRILL", "KITCHEN", "CELLARS", "WINERY",
    "BHAVAN", "MANTRA", "PICNIC", "PRODUCTIONS", "ENTERTAINMENT", "STUDIO", "STUDIOS", "DECOR",
    "DESIGN", "DESIGNS", "CREATIONS", "PRINT", "TILE", "GYMNASTICS", "GOLF", "STREAMLINEVENTS",
    // services and industry
    "SERVICES", "SERVICE", "SOLUTIONS", "SYSTEM", "SYSTEMS", "NETWORK", "TECHNOLOGY",
    "TECHNOLOGIES", "TECH", "INNOVATION", "INNOVATIONS", "RESEARCH", "CONSTRUCTION", "SECURITY",
    "CAPITAL", "MARKET", "CLOUD", "REAL-TIME",
    // institutions
    "UNIVERSITY", "COLLEGE", "SCHOOL", "ACADEMY", "ELEMENTARY", "INSTITUTE", "INSTITUTION",
    "HOSPITAL", "CLINIC", "MEDICAL", "HEALTH", "FOUNDATION", "ASSOCIATION", "ORGANIZATION",
    "ALLIANCE", "SOCIETY", "CLUB", "LEAGUE", "FEDERATION", "UNION", "GUILD", "SORORITY",
    "FRATERNITY", "LODGE", "COMMUNITY", "RESIDENCE", "SENIOR", "LIVING", "PTA", "YMCA", "HOA",
    // religious bodies
    "CHURCH", "MINISTRY", "PARISH", "DIOCESE", "CONGREGATION", "SYNAGOGUE", "TEMPLE", "MOSQUE",
    "CATHEDRAL", "CHAPEL", "MONASTERY", "SEMINARY", "FELLOWSHIP",
    // government
    "GOVERNMENT", "CITY", "COUNTY", "DISTRICT", "DEPARTMENT", "DEPT", "DIVISION", "BUREAU",
    "AGENCY", "AUTHORITY", "COMMISSION", "BOARD", "COUNCIL", "COMMITTEE", "OFFICE",
    // groups of people
    "TEAM", "STAFF", "PERSONNEL", "EMPLOYEES", "VOLUNTEERS",
    // recurring fragments from customer lists
    "MODERN", "SOUTHERN", "PACIFIC", "AMERICAS", "CLIMATE", "WEEK", "EXPECTATIONS", "MILPITAS",
    "FREMONT",
];

/// Multi-word phrases that only mean "business" together
const COMPANY_PHRASES: &[&str] = &[
    "WINE BAR",
    "REAL ESTATE",
    "BOOSTER CLUB",
    "EVENT CENTER",
    "EXTERNAL RELATIONS",
    "HUMAN RESOURCES",
    "ACCOUNTS PAYABLE",
    "ACCOUNTS RECEIVABLE",
    "DE ANZA",
    "LOS GATOS",
    "PASSION FOR",
    "& CO",
];

/// Tokens that are never accepted as a person's last name
const LAST_NAME_DENY_LIST: &[&str] = &[
    "SENIOR", "LIVING", "MODERN", "CLIMATE", "WEEK", "RESEARCH", "CORPORATION", "PRINT",
    "SOLUTIONS", "ENTERTAINMENT", "SOUTHERN", "KITCHEN", "SECURITY", "CLOUD", "WEST",
    "GYMNASTICS", "OF", "OR", "MILPITAS", "ELEMENTARY", "MONDAY", "INC", "VENTS", "EVEENTS",
    "DESIGN", "DECOR", "AMERICAS", "ANZA", "TILE", "SYSTEMS", "DE", "MAGGIORE", "X", "DELI",
    "CAFE", "CREATIONS", "REAL-TIME", "INNOVATIONS", "STREAMLINEVENTS", "EXPECTATIONS", "R&J",
    "CONSTRUCTION", "PACIFIC", "ARENA", "HOTEL", "PLAZA", "ZOO", "STEAKHOUSE", "WINE", "BAR",
    "RESTAURANT", "CATERING", "VENUE", "EVENTS", "CENTER", "SERVICES",
];

static COMPANY_KEYWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| COMPANY_KEYWORDS.iter().copied().collect());

static DENY_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| LAST_NAME_DENY_LIST.iter().copied().collect());

/// Upper-case tokens of a name with surrounding punctuation stripped.
fn tokens(upper: &str) -> Vec<String> {
    upper
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | '(' | ')' | ';' | ':' | '"'))
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '\'' | '!' | '?')))
        .filter(|t| !t.is_empty() && !matches!(*t, "-" | "_"))
        .map(str::to_string)
        .collect()
}

fn token_is_keyword(token: &str) -> bool {
    if COMPANY_KEYWORD_SET.contains(token) {
        return true;
    }
    // "STREAMLINE-EVENTS", "R&D-GROUP"
    token.contains('-') && token.split('-').any(|part| COMPANY_KEYWORD_SET.contains(part))
}

fn contains_keyword(words: &[String]) -> bool {
    if words.iter().any(|w| token_is_keyword(w)) {
        return true;
    }
    let padded = format!(" {} ", words.join(" "));
    COMPANY_PHRASES.iter().any(|p| padded.contains(&format!(" {} ", p)))
}

/// Keyword or phrase match only, without the structural heuristics.
pub fn has_business_keyword(name: &str) -> bool {
    contains_keyword(&tokens(&name.trim().to_uppercase()))
}

/// Heuristic: does this look like an organisation rather than a person?
pub fn is_company_name(name: &str) -> bool {
    let upper = name.trim().to_uppercase();
    if upper.is_empty() {
        return false;
    }

    let words = tokens(&upper);
    if contains_keyword(&words) {
        return true;
    }

    let multi_person = words.iter().any(|w| w == "&" || w == "AND") || upper.contains('&');
    let word_limit = if multi_person { 6 } else { 3 };
    if words.len() > word_limit {
        return true;
    }

    if upper.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }

    words.first().map(String::as_str) == Some("THE") && words.len() > 2
}

/// A last name is kept only if it is plausibly a surname.
pub fn is_valid_last_name(last_name: &str) -> bool {
    let upper = last_name.trim().to_uppercase();
    let len = upper.chars().count();
    if len <= 1 || len > 50 {
        return false;
    }
    if !upper.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    if DENY_SET.contains(upper.as_str()) {
        return false;
    }
    if upper.starts_with("X-") || upper.contains('/') {
        return false;
    }
    // Run-together company handles such as ISIONARYEVENTSANDDESIGNS
    if len > 20 && !upper.contains(|c: char| c == '-' || c.is_whitespace()) {
        return false;
    }
    !is_company_name(&upper)
}
