/// Source column headers as they appear in the sales export
pub const COL_SALESPERSON: &str = "Salesperson";
pub const COL_DEL: &str = "DEL";
pub const COL_PU: &str = "PU";
pub const COL_EMAIL: &str = "Email";
pub const COL_CONTACT_NAME: &str = "Contact Name";
pub const COL_CUSTOMER_NAME: &str = "Customer Name";
pub const COL_PHONE: &str = "Phone";
pub const COL_TYPE: &str = "Type";
pub const COL_BUSINESS_TYPE: &str = "Business Type";
pub const COL_ADDRESS_1: &str = "Address 1";
pub const COL_ADDRESS_2: &str = "Address 2";
pub const COL_CITY: &str = "City";
pub const COL_STATE: &str = "State";
pub const COL_ZIP: &str = "Zip";

/// Other spellings accepted for a source column when the exact header is missing
pub const COLUMN_ALIASES: [(&str, &[&str]); 4] = [
    (COL_EMAIL, &["Email Address", "E-mail", "E-mail Address"]),
    (COL_PHONE, &["Phone Number", "Telephone", "Phone #"]),
    (COL_CONTACT_NAME, &["Contact"]),
    (COL_ZIP, &["Zip Code", "Postal Code"]),
];

/// Columns used to recognise the header row when probing the top of a sheet
pub const HEADER_KEY_COLUMNS: [&str; 6] = [
    COL_EMAIL,
    COL_CONTACT_NAME,
    COL_CUSTOMER_NAME,
    COL_PHONE,
    COL_CITY,
    COL_STATE,
];

/// Number of leading rows probed for a header
pub const HEADER_PROBE_ROWS: usize = 5;
/// Key columns that must be present for a row to count as the header
pub const HEADER_MIN_MATCHES: usize = 3;

// Contact export workbook
pub const CONTACT_SHEET_NAME: &str = "Email Contact Export";
pub const REMOVED_SHEET_NAME: &str = "Removed";
pub const REMOVAL_REASON_HEADER: &str = "Removal Reason";
pub const CONTACT_FILE_SUFFIX: &str = "Email Contact Export";
pub const CONTACT_OUTPUT_COLUMNS: [&str; 12] = [
    "Email",
    "Business type",
    "First name",
    "Last name",
    "Customer name",
    "Phone number",
    "Sales person",
    "Address 1",
    "Address 2",
    "City",
    "State",
    "Zip",
];

// Survey workbook
pub const SURVEY_SHEET_NAME: &str = "Cleaned Data";
pub const SURVEY_OUTPUT_COLUMNS: [&str; 5] = [
    "Email",
    "First Name",
    "Last Name",
    "Phone",
    "Assisting Team Member",
];

pub const PHONE_NUMBER_FORMAT: &str = "(000) 000-0000";
pub const PHONE_NUMBER_FORMAT_WITH_COUNTRY: &str = "0 (000) 000-0000";
/// Mask for source date cells copied to the Removed sheet
pub const DATE_NUMBER_FORMAT: &str = "m/d/yyyy";

pub const ACCOUNTS_RECEIVABLE: &str = "ACCOUNTS RECEIVABLE";

// Store locations for the survey export
pub const LOCATION_DUBLIN: &str = "Dublin";
pub const LOCATION_MILPITAS: &str = "Milpitas";

/// Accepted input extensions
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// Output workbook name for the contact export
pub fn contact_output_filename(input_stem: &str) -> String {
    format!("{} - {}.xlsx", input_stem, CONTACT_FILE_SUFFIX)
}

/// Output workbook name for one survey location
pub fn survey_output_filename(location: &str, date_range: &str) -> String {
    format!("{} - {} - Clean.xlsx", location, date_range)
}

/// Get all supported store locations
pub fn get_locations() -> Vec<&'static str> {
    vec![LOCATION_DUBLIN, LOCATION_MILPITAS]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filenames() {
        assert_eq!(
            contact_output_filename("Alert 7.1.25"),
            "Alert 7.1.25 - Email Contact Export.xlsx"
        );
        assert_eq!(
            survey_output_filename("Dublin", "7.1.25-7.31.25"),
            "Dublin - 7.1.25-7.31.25 - Clean.xlsx"
        );
    }
}
