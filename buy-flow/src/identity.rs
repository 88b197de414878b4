//! Customer check pages: sign-in for existing customers and identity
//! protection.

use serde::{Deserialize, Serialize};

use crate::{
    state::CustomerDetailsPatch,
    validation::{
        FieldError, IdentificationType, SignInErrors, validate_identification, validate_sign_in,
    },
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub stay_signed_in: bool,
}

/// Signed-in user kept for the rest of the session. Holds no password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub is_authenticated: bool,
    pub stay_signed_in: bool,
}

impl SignInForm {
    pub fn sign_in(&self) -> Result<UserInfo, SignInErrors> {
        validate_sign_in(&self.username, &self.password)?;
        Ok(UserInfo {
            username: self.username.clone(),
            is_authenticated: true,
            stay_signed_in: self.stay_signed_in,
        })
    }
}

/// Marks the customer as an existing account holder.
pub fn existing_customer() -> CustomerDetailsPatch {
    CustomerDetailsPatch {
        is_existing_customer: Some(true),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityForm {
    pub identification_type: IdentificationType,
    #[serde(default)]
    pub identification_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityInfo {
    pub identification_type: IdentificationType,
    pub identification_number: String,
    pub verified: bool,
}

impl IdentityForm {
    /// The number is stored exactly as typed.
    pub fn verify(&self) -> Result<IdentityInfo, FieldError> {
        validate_identification(self.identification_type, &self.identification_number)?;
        Ok(IdentityInfo {
            identification_type: self.identification_type,
            identification_number: self.identification_number.clone(),
            verified: true,
        })
    }
}
