//! Form validators that gate writes into the buy-flow state.
//!
//! Values are checked as typed and never normalized: a dashed SSN is stored
//! with its dashes.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static SSN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").expect("valid SSN pattern"));
static TAX_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-?\d{7}$").expect("valid tax id pattern"));
static MOBILE_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("valid mobile number pattern"));

pub const MIN_PASSWORD_LEN: usize = 6;

/// Inline message for a single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Please enter your identification number")]
    MissingIdentification,
    #[error("Please enter a valid Social Security Number (XXX-XX-XXXX)")]
    InvalidSsn,
    #[error("Please enter a valid Tax ID Number (XX-XXXXXXX)")]
    InvalidTaxId,
}

/// Reasons the plan page refuses to add to cart, checked in this order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select a data plan")]
    MissingRatePlan,
    #[error("Please choose a phone number option")]
    MissingNumberOption,
    #[error("Please enter a valid mobile number")]
    InvalidMobileNumber,
    #[error("Please enter who this device is for")]
    MissingDeviceFor,
    #[error("Unknown data plan: {0}")]
    UnknownRatePlan(String),
    #[error("Unknown protection plan: {0}")]
    UnknownProtectionPlan(String),
}

/// Sign-in form errors; every failing field is reported at once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{}", join_messages(.username, .password))]
pub struct SignInErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl SignInErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

fn join_messages(username: &Option<String>, password: &Option<String>) -> String {
    [username.as_deref(), password.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentificationType {
    Ssn,
    TaxId,
}

pub fn is_valid_ssn(value: &str) -> bool {
    SSN_PATTERN.is_match(value)
}

pub fn is_valid_tax_id(value: &str) -> bool {
    TAX_ID_PATTERN.is_match(value)
}

/// Exactly ten digits, no separators. Meant to run on every keystroke.
pub fn is_valid_mobile_number(value: &str) -> bool {
    MOBILE_NUMBER_PATTERN.is_match(value)
}

pub fn validate_identification(kind: IdentificationType, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::MissingIdentification);
    }
    match kind {
        IdentificationType::Ssn if !is_valid_ssn(value) => Err(FieldError::InvalidSsn),
        IdentificationType::TaxId if !is_valid_tax_id(value) => Err(FieldError::InvalidTaxId),
        _ => Ok(()),
    }
}

pub fn validate_sign_in(username: &str, password: &str) -> Result<(), SignInErrors> {
    let mut errors = SignInErrors::default();

    if username.trim().is_empty() {
        errors.username = Some("Username is required".to_string());
    }

    if password.is_empty() {
        errors.password = Some("Password is required".to_string());
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.password = Some(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
