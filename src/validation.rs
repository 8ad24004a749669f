//! Payload validation for signup, login, profile and password changes.
//!
//! Every form produces either normalized values or a [`FieldErrors`] map keyed by
//! the offending field, which renders as the `errors` object of the response.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

pub const PASSWORD_SYMBOLS: &str = r#"!@#$%^&*(),.?":{}|<>"#;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_FIELD_LENGTH: usize = 255;

pub const REQUIRED: &str = "This field is required.";
pub const EMAIL_TAKEN: &str = "A user with this email already exists.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn extend(&mut self, field: &str, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.add(field, message);
        }
    }

    /// Records the error of `result` under `field` and yields the value on success.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

fn required(value: Option<String>) -> Result<String, String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| REQUIRED.to_string())
}

/// Checks the address shape and returns it lower-cased.
pub fn validate_email(raw: &str) -> Result<String, String> {
    let email = raw.trim();
    if email.len() > MAX_FIELD_LENGTH || !EMAIL_RE.is_match(email) {
        return Err("Please enter a valid email address.".to_string());
    }
    Ok(email.to_lowercase())
}

pub fn validate_full_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.chars().count() < 2 {
        return Err("Full name must be at least 2 characters long.".to_string());
    }
    if name.chars().count() > MAX_FIELD_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {MAX_FIELD_LENGTH} characters."
        ));
    }
    Ok(name.to_string())
}

/// The five composition rules plus an upper length bound. Reports the first
/// rule that fails.
pub fn check_password_rules(password: &str) -> Result<(), String> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters long.".to_string());
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters long."
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit.".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err("Password must contain at least one special character.".to_string());
    }
    Ok(())
}

/// Account attributes a password must not resemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributes<'a> {
    pub email: Option<&'a str>,
    pub full_name: Option<&'a str>,
}

/// Generic strength check run after the composition rules.
pub trait PasswordPolicy: Send + Sync {
    /// Returns one message per violated rule; empty when the password is acceptable.
    fn validate(&self, password: &str, attrs: &UserAttributes<'_>) -> Vec<String>;
}

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "12345678", "123456789", "1234567890", "111111", "000000", "abc123",
    "abc123!", "admin123", "admin123!", "baseball", "changeme", "changeme1!", "dragon",
    "football", "football1!", "iloveyou", "iloveyou1!", "letmein", "letmein1!", "master",
    "monkey", "passw0rd", "passw0rd!", "password", "password1", "password1!",
    "password12!", "password123", "password123!", "p@ssw0rd", "p@ssw0rd1", "p@ssword1",
    "qazwsx", "qwerty", "qwerty1!", "qwerty123", "qwerty123!", "shadow", "sunshine",
    "superman", "trustno1", "welcome", "welcome1!", "welcome123!",
];

#[derive(Debug, Clone)]
pub struct StandardPasswordPolicy {
    /// Similarity ratio at or above which a password is considered derived from an attribute.
    pub max_similarity: f64,
}

impl Default for StandardPasswordPolicy {
    fn default() -> Self {
        Self { max_similarity: 0.7 }
    }
}

impl PasswordPolicy for StandardPasswordPolicy {
    fn validate(&self, password: &str, attrs: &UserAttributes<'_>) -> Vec<String> {
        let mut problems = Vec::new();
        let lowered = password.to_lowercase();

        let named = [(attrs.email, "email address"), (attrs.full_name, "full name")];
        for (value, label) in named {
            let Some(value) = value else { continue };
            if self.resembles(&lowered, value) {
                problems.push(format!("The password is too similar to the {label}."));
            }
        }

        if COMMON_PASSWORDS.contains(&lowered.trim()) {
            problems.push("This password is too common.".to_string());
        }

        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            problems.push("This password is entirely numeric.".to_string());
        }

        problems
    }
}

impl StandardPasswordPolicy {
    fn resembles(&self, password: &str, attribute: &str) -> bool {
        let attribute = attribute.to_lowercase();
        let password_len = password.chars().count();
        attribute
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|part| !part.is_empty())
            .chain(std::iter::once(attribute.as_str()))
            .filter(|part| self.reachable(password_len, part.chars().count()))
            .any(|part| similarity(password, part) >= self.max_similarity)
    }

    /// The best possible ratio for two lengths is `2 * min / (a + b)`; parts
    /// that cannot reach the threshold are never compared.
    fn reachable(&self, a: usize, b: usize) -> bool {
        let total = a + b;
        total > 0 && 2.0 * a.min(b) as f64 / total as f64 >= self.max_similarity
    }
}

/// `2 * matched / total` over recursively found longest common blocks.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                cur[j + 1] = prev[j] + 1;
                if cur[j + 1] > best.2 {
                    best = (i + 1 - cur[j + 1], j + 1 - cur[j + 1], cur[j + 1]);
                }
            }
        }
        prev = cur;
    }
    best
}

fn strong_password(
    password: Option<String>,
    attrs: &UserAttributes<'_>,
    policy: &dyn PasswordPolicy,
) -> Result<String, Vec<String>> {
    let password = required(password).map_err(|e| vec![e])?;
    check_password_rules(&password).map_err(|e| vec![e])?;
    let problems = policy.validate(&password, attrs);
    if problems.is_empty() { Ok(password) } else { Err(problems) }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(self, policy: &dyn PasswordPolicy) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();

        let email = errors.check(
            "email",
            required(self.email).and_then(|e| validate_email(&e)),
        );
        let full_name = errors.check(
            "full_name",
            required(self.full_name).and_then(|n| validate_full_name(&n)),
        );

        // Only attributes that passed their own checks are compared.
        let attrs = UserAttributes {
            email: email.as_deref(),
            full_name: full_name.as_deref(),
        };
        let password = match strong_password(self.password, &attrs, policy) {
            Ok(p) => Some(p),
            Err(problems) => {
                errors.extend("password", problems);
                None
            }
        };
        let confirm = errors.check("confirm_password", required(self.confirm_password));

        if let (Some(password), Some(confirm)) = (&password, &confirm) {
            if password != confirm {
                errors.add("confirm_password", "Passwords do not match.");
            }
        }

        match (email, full_name, password) {
            (Some(email), Some(full_name), Some(password)) if errors.is_empty() => Ok(NewAccount {
                email,
                full_name,
                password,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = errors.check(
            "email",
            required(self.email).and_then(|e| {
                validate_email(&e).map_err(|_| "Enter a valid email address.".to_string())
            }),
        );
        let password = errors.check("password", required(self.password));

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(errors),
        }
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl ProfileForm {
    pub fn validate(self) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = self
            .email
            .and_then(|e| errors.check("email", validate_email(&e)));
        let full_name = self
            .full_name
            .and_then(|n| errors.check("full_name", validate_full_name(&n)));
        errors.into_result()?;
        Ok(ProfileChanges { email, full_name })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}

impl ChangePasswordForm {
    /// Returns the accepted new password. `verify_current` checks a candidate
    /// against the stored hash.
    pub fn validate(
        self,
        attrs: &UserAttributes<'_>,
        policy: &dyn PasswordPolicy,
        verify_current: impl FnOnce(&str) -> Result<bool, AppError>,
    ) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();

        let current = errors.check("current_password", required(self.current_password));
        if let Some(current) = &current {
            if !verify_current(current)? {
                errors.add("current_password", "Current password is incorrect.");
            }
        }

        let new_password = match strong_password(self.new_password, attrs, policy) {
            Ok(p) => Some(p),
            Err(problems) => {
                errors.extend("new_password", problems);
                None
            }
        };
        let confirm = errors.check(
            "confirm_new_password",
            required(self.confirm_new_password),
        );

        if let (Some(new_password), Some(confirm)) = (&new_password, &confirm) {
            if new_password != confirm {
                errors.add("confirm_new_password", "New passwords do not match.");
            }
        }
        if let (Some(new_password), Some(current)) = (&new_password, &current) {
            if new_password == current {
                errors.add(
                    "new_password",
                    "New password must be different from current password.",
                );
            }
        }

        match new_password {
            Some(new_password) if errors.is_empty() => Ok(new_password),
            _ => Err(AppError::validation(errors)),
        }
    }
}
