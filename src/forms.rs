//! Client-side validation of the login, register and edit-profile forms.
//!
//! Runs before anything reaches the session container; each failure maps to
//! one short message the UI shows as-is.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user::{parse_age, ProfilePatch, RegistrationDraft, Specialty, UserRecord};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormError {
    #[error("please fill in all fields")]
    MissingFields,
    #[error("name is required")]
    NameRequired,
    #[error("please enter a valid email")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("please enter a valid age")]
    InvalidAge,
    #[error("please select a specialty")]
    SpecialtyRequired,
    #[error("there are no changes to save")]
    NoChanges,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_email(email: &str) -> Result<String, FormError> {
    let email = email.trim();
    if email.is_empty() || !is_valid_email(email) {
        return Err(FormError::InvalidEmail);
    }
    Ok(email.to_string())
}

fn check_name(name: &str) -> Result<String, FormError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FormError::NameRequired);
    }
    Ok(name.to_string())
}

fn check_specialty(tag: &str) -> Result<Specialty, FormError> {
    tag.parse().map_err(|_| FormError::SpecialtyRequired)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Returns the trimmed email to look up.
    pub fn validate(&self) -> Result<String, FormError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(FormError::MissingFields);
        }
        check_email(&self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub age: String,
    #[serde(default)]
    pub specialty: String,
}

impl RegisterForm {
    pub fn into_draft(self) -> Result<RegistrationDraft, FormError> {
        let name = check_name(&self.name)?;
        let email = check_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if parse_age(&self.age).is_none() {
            return Err(FormError::InvalidAge);
        }
        let specialty = check_specialty(&self.specialty)?;

        Ok(RegistrationDraft {
            name,
            email,
            password: self.password,
            age: self.age.trim().to_string(),
            specialty,
        })
    }
}

/// The edit-profile form, prefilled from the current record.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub age: String,
    pub specialty: String,
}

impl ProfileForm {
    pub fn from_user(user: &UserRecord) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age.to_string(),
            specialty: user.specialty.tag().to_string(),
        }
    }

    /// Validate and keep only the fields that differ from `current`.
    pub fn diff(&self, current: &UserRecord) -> Result<ProfilePatch, FormError> {
        let name = check_name(&self.name)?;
        let email = check_email(&self.email)?;
        let age = parse_age(&self.age).ok_or(FormError::InvalidAge)?;
        let specialty = check_specialty(&self.specialty)?;

        let patch = ProfilePatch {
            name: (name != current.name).then_some(name),
            email: (email != current.email).then_some(email),
            age: (age != current.age).then_some(age),
            specialty: (specialty != current.specialty).then_some(specialty),
        };
        if patch.is_empty() {
            return Err(FormError::NoChanges);
        }
        Ok(patch)
    }
}
