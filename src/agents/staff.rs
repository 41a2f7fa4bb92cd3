//! Staff directory agent.
//!
//! Answers field lookups phrased in natural language: "psa Tomasz
//! Greplowski", "What is the PSA Licence expiry date for Bartosz
//! Stanczuk?", "Give me contact number for Adam Quirke". Field aliases
//! resolve against the columns actually present in the tracker, so a
//! renamed sheet degrades to "column missing" instead of wrong answers.

use crate::agents::AgentReply;
use crate::data::staff::StaffDirectory;

const LICENCE_COLUMN: &str = "PSA Licence";
const EXPIRY_COLUMN: &str = "PSA Licence exp. DD/MM/YYYY";

/// Natural-language alias -> canonical column. Checked in order; earlier
/// entries win when several aliases appear in one query.
const SINGLE_ALIASES: &[(&str, &str)] = &[
    // PSA
    ("psa licence", LICENCE_COLUMN),
    ("psa", LICENCE_COLUMN),
    ("psa number", LICENCE_COLUMN),
    ("psa no", LICENCE_COLUMN),
    ("psa id", LICENCE_COLUMN),
    ("psa license", LICENCE_COLUMN),
    // PSA expiry
    ("psa licence expiry date", EXPIRY_COLUMN),
    ("psa licence expiry", EXPIRY_COLUMN),
    ("psa expiry", EXPIRY_COLUMN),
    ("expiry", EXPIRY_COLUMN),
    ("expiration", EXPIRY_COLUMN),
    ("psa license expiry", EXPIRY_COLUMN),
    // Other fields present in the tracker
    ("contact number", "Contact Number"),
    ("emergency contact", "Contact Number in case of Emergency"),
    ("first aid", "First Aid Certified"),
    ("first aid expiry", "Date of first Aid expire"),
    ("badge", "Received Access Badge"),
    ("radio earpiece", "Radio Earpiece Received"),
    ("safepass", "Safepass"),
    ("ert training", "Emergency Response Team (ERT) Training"),
    ("manual handling", "Manual Handling Training"),
    ("navy coat", "Navy Blue winter Coat Received 2024"),
    ("bgu sign off", "BGU Sign Off"),
    ("l-dap", "L-Dap"),
    ("ldap", "L-Dap"),
    ("pin", "Employee PIN (0****)"),
    ("employee pin", "Employee PIN (0****)"),
];

/// Aliases that imply returning several fields at once: a bare "psa"
/// means both the licence number and its expiry.
const GROUP_ALIASES: &[(&str, &[&str])] = &[
    ("psa", &[LICENCE_COLUMN, EXPIRY_COLUMN]),
    ("psa licence", &[LICENCE_COLUMN, EXPIRY_COLUMN]),
    ("psa license", &[LICENCE_COLUMN, EXPIRY_COLUMN]),
];

/// Fields suggested when a name matched but no field alias did.
const SUGGESTED_FIELDS: &[&str] = &[
    LICENCE_COLUMN,
    EXPIRY_COLUMN,
    "Contact Number",
    "Contact Number in case of Emergency",
    "Date of first Aid expire",
];

/// Which columns the query asks for, resolved against the tracker.
///
/// Precedence: explicit expiry wording beats everything (so "psa expiry"
/// returns only the expiry), then the "psa" group (number + expiry), then
/// any other single alias, then the first column containing "exp" as a
/// last resort.
fn infer_fields(directory: &StaffDirectory, query: &str) -> Vec<String> {
    let t = query.to_lowercase();

    for (key, column) in SINGLE_ALIASES {
        if (key.contains("expiry") || key.contains("expiration")) && t.contains(key) {
            return directory.columns_present(&[column]);
        }
    }

    for (key, group) in GROUP_ALIASES {
        if t.contains(key) {
            return directory.columns_present(group);
        }
    }

    let hits: Vec<&str> = SINGLE_ALIASES
        .iter()
        .filter(|(key, _)| t.contains(key))
        .map(|(_, column)| *column)
        .collect();
    if !hits.is_empty() {
        return directory.columns_present(&hits);
    }

    if let Some(col) = directory.first_column_containing("exp") {
        return vec![col.to_string()];
    }

    vec![]
}

pub fn run(directory: &StaffDirectory, query: &str) -> AgentReply {
    let Some(row) = directory.find_best_name_in_text(query) else {
        return AgentReply::NoMatch(
            "I couldn't find a matching employee name in your question. \
             Try e.g. 'psa John Smith' or 'What is the PSA Licence expiry date for Jane Doe?'."
                .to_string(),
        );
    };

    let display_name = directory.display_name(row).to_string();

    let mut fields = infer_fields(directory, query);
    if fields.is_empty() && query.to_lowercase().contains("psa") {
        fields = directory.columns_present(&[LICENCE_COLUMN, EXPIRY_COLUMN]);
    }

    if fields.is_empty() {
        let suggestions: Vec<String> =
            SUGGESTED_FIELDS.iter().map(|s| format!("'{s}'")).collect();
        return AgentReply::Answer(format!(
            "Tell me which field you want. Examples: {}",
            suggestions.join("; ")
        ));
    }

    let pairs: Vec<(String, String)> = fields
        .iter()
        .map(|field| {
            let value = directory
                .value(row, field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or("N/A");
            (field.clone(), value.to_string())
        })
        .collect();

    if let [(label, value)] = pairs.as_slice() {
        return AgentReply::Answer(format!("{label} for {display_name}: {value}"));
    }

    let mut lines = vec![format!("{display_name}:")];
    for (label, value) in &pairs {
        lines.push(format!("- {label}: {value}"));
    }
    AgentReply::Answer(lines.join("\n"))
}
