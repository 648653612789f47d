use crate::types::CellValue;

/// Digits-only phone: exactly 10 digits, or 11 with a leading `1`.
pub fn clean_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    // Numbers that went through a float column come back as "4085063875.0"
    let trimmed = trimmed.strip_suffix(".0").filter(|s| s.chars().all(|c| c.is_ascii_digit())).unwrap_or(trimmed);

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.chars().all(|c| c == '0') {
        return None;
    }
    match digits.len() {
        10 => Some(digits),
        11 if digits.starts_with('1') => Some(digits),
        _ => None,
    }
}

/// Cell-aware variant: numeric cells are rendered as integers first.
pub fn clean_phone_cell(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty | CellValue::Bool(_) | CellValue::DateTime(_) => None,
        CellValue::Number(n) if !n.is_finite() => None,
        other => clean_phone(&other.as_text()),
    }
}

/// Display mask for a cleaned phone number.
pub fn format_phone(digits: &str) -> String {
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..]),
        11 => format!("{} ({}) {}-{}", &digits[0..1], &digits[1..4], &digits[4..7], &digits[7..]),
        _ => digits.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_phone_formats() {
        assert_eq!(clean_phone("408.506.3875"), Some("4085063875".to_string()));
        assert_eq!(clean_phone("(408) 506-3875"), Some("4085063875".to_string()));
        assert_eq!(clean_phone("1-408-506-3875"), Some("14085063875".to_string()));
        assert_eq!(clean_phone("4085063875.0"), Some("4085063875".to_string()));
    }

    #[test]
    fn test_clean_phone_rejects_placeholders() {
        assert_eq!(clean_phone("0"), None);
        assert_eq!(clean_phone("0000000000"), None);
        assert_eq!(clean_phone(""), None);
        assert_eq!(clean_phone("123"), None);
        assert_eq!(clean_phone("24085063875"), None);
        assert_eq!(clean_phone("n/a"), None);
    }

    #[test]
    fn test_clean_phone_cell() {
        assert_eq!(clean_phone_cell(&CellValue::Number(4085063875.0)), Some("4085063875".to_string()));
        assert_eq!(clean_phone_cell(&CellValue::Number(f64::NAN)), None);
        assert_eq!(clean_phone_cell(&CellValue::Empty), None);
        assert_eq!(clean_phone_cell(&CellValue::Text("408 506 3875".into())), Some("4085063875".to_string()));
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("4085063875"), "(408) 506-3875");
        assert_eq!(format_phone("14085063875"), "1 (408) 506-3875");
    }
}
