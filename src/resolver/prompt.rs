use crate::types::NameInput;

const INSTRUCTIONS: &str = r#"You are a data cleaning expert. Extract the best person's name from the provided fields.

CRITICAL: Return ONLY valid JSON. NO comments, explanations, or additional text.

ANALYSIS PROCESS:
1. CHECK Customer Name for "LASTNAME, FIRSTNAME" format. It takes HIGHEST priority when it is a person name.
2. EXAMINE Contact Name. If it is a clear person name (not a company), use it as the PRIMARY source.
3. ANALYZE the Email only to fill in a missing first or last name.
4. NEVER use company name fragments as person names.
5. PRIORITY ORDER: Customer Name (person format) > Contact Name > Email extraction.

NAME FORMATS:
- "SAW, NAHA" becomes first="Naha", last="Saw"
- "HAN, VICTOR" becomes first="Victor", last="Han" (prefer it over an incomplete Contact Name)
- "ERICKSON, MELISSA" becomes first="Melissa", last="Erickson"
- "JOHN SMITH" becomes first="John", last="Smith"
- "SUZANNE EWING - ERVIN" becomes first="Suzanne", last="Ewing-Ervin"
- "MARTINEZ-GARCIA" stays "Martinez-Garcia"; keep hyphenated last names as one unit

MULTIPLE PEOPLE ("&" or "AND"):
- Pick the person whose name matches the email address.
- "KOREY KOENIG-DAMIENS & TAMERA" + "tgarlock@berkeley.edu" = first="Tamera", last="Garlock"
- "JOHN & JANE SMITH" + "jsmith@email.com" = first="Jane", last="Smith"

COMPLETING NAMES FROM EMAIL:
- "MIRIAM" + "mholland@sccoe.org" = first="Miriam", last="Holland"
- "SHEILA" + "SHEILA.SALENGA@domain.com" = first="Sheila", last="Salenga"
- "JACKIE" + "JKOLANDER@company.com" = first="Jackie", last="Kolander"
- "BLANCA" + "blanca.ortiz0@wdc.com" = first="Blanca", last="Ortiz"
- "sandy@domain.com" with a business Customer Name and no Contact Name = first="Sandy", last=null
- "STACY ROCK" = first="Stacy", last="Rock" (clear person name, even with a business email)

BUSINESS NAMES:
- NEVER extract person names from business names such as "SRI ANANDA BHAVAN RESTAURANT" or "MANTRA INDIA".
- NEVER return business fragments as names: Capital, Modern, Senior Living, Elementary, Solutions, Systems, Research Corporation, Print Solutions, Design Decor, Southern Kitchen, Climate Week, Real-Time Innovations, De Anza, Maggiore Tile, Streamlinevents, Cloud Kitchen, West Gymnastics, Deli Cafe, Southern Creations.
- Company indicators include: LLC, INC, CORP, GROUP, CENTER, CATERING, ENTERTAINMENT, RESTAURANT, SCHOOL, CHURCH, UNIVERSITY, COLLEGE, HOSPITAL, CLINIC, FOUNDATION, ASSOCIATION, INSTITUTE, DISTRICT, COUNTY, OFFICE, DEPARTMENT, AGENCY, COUNCIL, COMMITTEE, TEAM, STAFF, HOTEL, CAFE, DELI, PLAZA, ARENA.
- Random-looking addresses such as "SABSV1111@gmail.com" suggest no person name.
- When Customer Name is a business, Contact Name is empty and the email has no clear person name, return null for both names.

MISSING INFORMATION:
- If no reliable last name can be found, return null for last_name.
- Incomplete but accurate beats complete but wrong."#;

const EXAMPLES: &str = r#"EXAMPLES:
{"first_name": "Mercedes", "last_name": "Holland"}
{"first_name": "Melissa", "last_name": "Erickson"}
{"first_name": "Naha", "last_name": "Saw"}
{"first_name": "Miriam", "last_name": "Holland"}
{"first_name": "Sheila", "last_name": "Salenga"}
{"first_name": "Jackie", "last_name": "Kolander"}
{"first_name": "Victor", "last_name": "Han"}
{"first_name": "Sandy", "last_name": null}
{"first_name": "Stacy", "last_name": "Rock"}
{"first_name": "Sridhar", "last_name": "Lakshmikanthan"}
{"first_name": "Tamera", "last_name": "Garlock"}
{"first_name": null, "last_name": null}"#;

/// Escape embedded double quotes so the field stays on one quoted line.
fn quoted(value: Option<&str>) -> String {
    value.unwrap_or("").replace('"', "'")
}

/// Build the name-extraction prompt shared by both LLM tiers.
pub fn build_name_prompt(input: &NameInput) -> String {
    format!(
        "{}\n\nINPUT DATA:\nContact Name: \"{}\"\nCustomer Name: \"{}\"\nEmail: \"{}\"\n\n{}\n\nRESPONSE FORMAT: Return ONLY the JSON object {{\"first_name\": ..., \"last_name\": ...}}. No explanations, comments, or reasoning.",
        INSTRUCTIONS,
        quoted(input.contact_name.as_deref()),
        quoted(input.customer_name.as_deref()),
        quoted(input.email.as_deref()),
        EXAMPLES,
    )
}
