//! Sign-in and sign-up form validation.

use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{FieldError, ValidationError};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Sign-in form.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
    pub remember_me: bool,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
            remember_me: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.password.expose_secret().is_empty() {
            errors.push(FieldError {
                field: "password",
                message: "Password is required.",
            });
        }
        finish(errors)
    }
}

/// Sign-up form.
#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: SecretString,
    pub accepted_terms: bool,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.first_name.trim().chars().count() < 2 {
            errors.push(FieldError {
                field: "first_name",
                message: "First name must be at least 2 characters.",
            });
        }
        if self.last_name.trim().chars().count() < 2 {
            errors.push(FieldError {
                field: "last_name",
                message: "Last name must be at least 2 characters.",
            });
        }
        check_email(&self.email, &mut errors);
        if self.phone.trim().chars().count() < 10 {
            errors.push(FieldError {
                field: "phone",
                message: "Please enter a valid phone number.",
            });
        }

        let password = self.password.expose_secret();
        if password.chars().count() < 8 {
            errors.push(FieldError {
                field: "password",
                message: "Password must be at least 8 characters.",
            });
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one uppercase letter.",
            });
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one lowercase letter.",
            });
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one number.",
            });
        }

        if !self.accepted_terms {
            errors.push(FieldError {
                field: "terms",
                message: "You must agree to the terms and conditions.",
            });
        }

        finish(errors)
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !EMAIL.is_match(email.trim()) {
        errors.push(FieldError {
            field: "email",
            message: "Please enter a valid email address.",
        });
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ValidationError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}
