//! Input checks applied to account payloads before they reach the store.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex"));

// The regex crate has no lookahead, so the character-class requirements are
// checked separately from the allowed alphabet.
static PASSWORD_ALPHABET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$").expect("password regex"));

const PASSWORD_SPECIALS: &str = "@$!%*?&";

pub const INVALID_CPF: &str = "Invalid CPF";
pub const WEAK_PASSWORD: &str =
    "Password must be at least 8 characters and include uppercase and lowercase letters, numbers and special characters";
pub const INVALID_EMAIL: &str = "Invalid e-mail format";

/// Brazilian taxpayer id: 11 digits, two mod-11 check digits, not all equal.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 { return false; }
    if digits.iter().all(|d| *d == digits[0]) { return false; }

    let check = |len: usize| -> u32 {
        let weight_start = len as u32 + 1;
        let sum: u32 = digits[..len].iter().enumerate().map(|(i, d)| d * (weight_start - i as u32)).sum();
        let digit = 11 - (sum % 11);
        if digit > 9 { 0 } else { digit }
    };
    check(9) == digits[9] && check(10) == digits[10]
}

pub fn validate_password_strength(password: &str) -> bool {
    PASSWORD_ALPHABET_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn validate_email(email: &str) -> bool { EMAIL_RE.is_match(email) }

pub fn require_cpf(cpf: &str) -> AppResult<()> {
    if validate_cpf(cpf) { Ok(()) } else { Err(AppError::user("invalid_cpf", INVALID_CPF)) }
}

pub fn require_strong_password(password: &str) -> AppResult<()> {
    if validate_password_strength(password) { Ok(()) } else { Err(AppError::user("weak_password", WEAK_PASSWORD)) }
}

pub fn require_email(email: &str) -> AppResult<()> {
    if validate_email(email) { Ok(()) } else { Err(AppError::user("invalid_email", INVALID_EMAIL)) }
}
