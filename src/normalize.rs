use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{BranchId, Category, MembershipLevel, RecordDraft, RecordStatus};

/// Loosely-typed input row, as produced by a spreadsheet import adapter or a
/// raw store dump: arbitrary casing, optional fields, free-text dates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub joined_on: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowErrors {
    pub row_number: usize,
    pub errors: Vec<ValidationError>,
}

/// An accepted row with its 1-based source row number, so downstream failure
/// reports can point back at the import file.
#[derive(Debug, Clone)]
pub struct AcceptedRow {
    pub row_number: usize,
    pub draft: RecordDraft,
}

#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub total_rows: usize,
    pub accepted: Vec<AcceptedRow>,
    pub rejected: Vec<RowErrors>,
}

/// Normalizes every row and reports all errors at once instead of failing
/// fast. Pure transform; nothing is written.
pub fn normalize_rows(
    rows: &[RawRow],
    category: Category,
    default_branch: Option<&BranchId>,
) -> NormalizedBatch {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        match normalize_row(row, category, default_branch) {
            Ok(draft) => accepted.push(AcceptedRow { row_number, draft }),
            Err(errors) => rejected.push(RowErrors { row_number, errors }),
        }
    }
    NormalizedBatch {
        total_rows: rows.len(),
        accepted,
        rejected,
    }
}

/// Turns one loose row into a canonical draft, or every field error found.
/// Defaults (status, join date) are applied only on the accepted path.
pub fn normalize_row(
    row: &RawRow,
    category: Category,
    default_branch: Option<&BranchId>,
) -> Result<RecordDraft, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let display_name = trimmed(&row.display_name);
    if display_name.is_none() {
        errors.push(error("display_name", "required"));
    }

    let email = match trimmed(&row.email) {
        Some(value) if !is_valid_email(&value) => {
            errors.push(error("email", format!("invalid email address: {value}")));
            None
        }
        other => other,
    };
    let phone = match trimmed(&row.phone) {
        Some(value) if !is_valid_phone(&value) => {
            errors.push(error("phone", format!("invalid phone number: {value}")));
            None
        }
        other => other,
    };
    if row_has_no_contact(&row.email, &row.phone) {
        errors.push(error("contact", "at least one of email or phone is required"));
    }

    let branch_id = match trimmed(&row.branch) {
        Some(value) => match value.parse::<BranchId>() {
            Ok(branch) => Some(branch),
            Err(err) => {
                errors.push(error("branch", err.to_string()));
                None
            }
        },
        None => match default_branch {
            Some(branch) => Some(branch.clone()),
            None => {
                errors.push(error("branch", "missing and no default branch configured"));
                None
            }
        },
    };

    let status = match trimmed(&row.status) {
        Some(value) => match value.parse::<RecordStatus>() {
            Ok(status) if status.valid_for(category) => Some(status),
            Ok(status) => {
                errors.push(error(
                    "status",
                    format!("{status} is not a {category} status"),
                ));
                None
            }
            Err(err) => {
                errors.push(error("status", err.to_string()));
                None
            }
        },
        None => Some(RecordStatus::default_for(category)),
    };

    let level = match category {
        Category::Member => match trimmed(&row.level) {
            Some(value) => match value.parse::<MembershipLevel>() {
                Ok(level) => Some(level),
                Err(err) => {
                    errors.push(error("level", err.to_string()));
                    None
                }
            },
            None => Some(MembershipLevel::Disciple),
        },
        Category::Visitor => {
            if trimmed(&row.level).is_some() {
                errors.push(error("level", "visitors do not carry a membership level"));
            }
            None
        }
    };

    let joined_on = match trimmed(&row.joined_on) {
        Some(value) => match parse_date(&value) {
            Some(date) => Some(date),
            None => {
                errors.push(error("joined_on", format!("unparsable date: {value}")));
                None
            }
        },
        None => Some(Utc::now().date_naive()),
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // unwraps cannot fire: every None above pushed an error
    Ok(RecordDraft {
        category,
        branch_id: branch_id.expect("validated"),
        display_name: display_name.expect("validated"),
        status: status.expect("validated"),
        level: if category == Category::Member {
            level
        } else {
            None
        },
        email,
        phone,
        joined_on: joined_on.expect("validated"),
    })
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn row_has_no_contact(email: &Option<String>, phone: &Option<String>) -> bool {
    trimmed(email).is_none() && trimmed(phone).is_none()
}

fn error(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

fn is_valid_email(value: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap().is_match(value)
}

// at least 7 digits; only digits, +, -, parentheses and spaces
fn is_valid_phone(value: &str) -> bool {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    digits >= 7
        && value
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '(' | ')' | ' '))
}

// Validated by parseability, not by one fixed format.
fn parse_date(value: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}
