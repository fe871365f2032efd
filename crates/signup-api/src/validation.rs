//! Registration field validation.
//!
//! Each field owns an ordered chain of [`Rule`]s. The chain for a field stops
//! at its first failing rule and reports that rule's message; fields are
//! checked independently and reported in declaration order.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use signup_db::{Database, DbError};
use signup_types::api::{RegisterRequest, ValidationErrors};

pub const EMAIL_IN_USE: &str = "Email in use";

const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;
const MAX_EMAIL_LEN: usize = 254;

static LOCAL_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
        .unwrap()
});

/// Two or more labels, alphabetic TLD.
static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
        }
    }

    /// Absent and null both read as the empty string.
    fn value(self, req: &RegisterRequest) -> &str {
        let value = match self {
            Field::Username => &req.username,
            Field::Email => &req.email,
            Field::Password => &req.password,
        };
        value.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    NotEmpty,
    /// Bounds in characters, inclusive.
    Length { min: usize, max: Option<usize> },
    EmailFormat,
    /// At least one ASCII digit, one lowercase and one uppercase letter.
    MixedCharacters,
    /// No stored user has this exact email. Needs a storage lookup.
    EmailAvailable,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub check: Check,
    pub message: &'static str,
}

impl Rule {
    pub const fn new(check: Check, message: &'static str) -> Self {
        Self { check, message }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRules {
    pub field: Field,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("email lookup task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct Validator {
    chains: Vec<FieldRules>,
}

impl Validator {
    pub fn new(chains: Vec<FieldRules>) -> Self {
        Self { chains }
    }

    /// Rule table for `POST /api/1.0/users`.
    pub fn registration() -> Self {
        Self::new(vec![
            FieldRules {
                field: Field::Username,
                rules: vec![
                    Rule::new(Check::NotEmpty, "Username cannot be null"),
                    Rule::new(
                        Check::Length {
                            min: 4,
                            max: Some(32),
                        },
                        "Username must be min 4 and max 32 characters",
                    ),
                ],
            },
            FieldRules {
                field: Field::Email,
                rules: vec![
                    Rule::new(Check::NotEmpty, "email cannot be null"),
                    Rule::new(Check::EmailFormat, "Email is not valid"),
                    Rule::new(Check::EmailAvailable, EMAIL_IN_USE),
                ],
            },
            FieldRules {
                field: Field::Password,
                rules: vec![
                    Rule::new(Check::NotEmpty, "Password cannot be null"),
                    Rule::new(
                        Check::Length { min: 6, max: None },
                        "Password must be atleast 6 characters long",
                    ),
                    Rule::new(
                        Check::MixedCharacters,
                        "Password must have atleast 1 uppercase, 1 lowercase and 1 number in it",
                    ),
                ],
            },
        ])
    }

    /// Runs every chain and collects the first failure of each field.
    /// An empty result means the request is valid.
    pub async fn validate(
        &self,
        req: &RegisterRequest,
        db: &Arc<Database>,
    ) -> Result<ValidationErrors, LookupError> {
        let mut errors = ValidationErrors::new();

        for chain in &self.chains {
            let value = chain.field.value(req);
            for rule in &chain.rules {
                if !passes(rule.check, value, db).await? {
                    errors.insert(chain.field.as_str(), rule.message);
                    break;
                }
            }
        }

        Ok(errors)
    }
}

async fn passes(check: Check, value: &str, db: &Arc<Database>) -> Result<bool, LookupError> {
    let ok = match check {
        Check::NotEmpty => !value.is_empty(),
        Check::Length { min, max } => {
            let len = value.chars().count();
            len >= min && max.is_none_or(|max| len <= max)
        }
        Check::EmailFormat => is_email(value),
        Check::MixedCharacters => has_mixed_characters(value),
        Check::EmailAvailable => !email_in_use(db, value).await?,
    };
    Ok(ok)
}

async fn email_in_use(db: &Arc<Database>, email: &str) -> Result<bool, LookupError> {
    let db = db.clone();
    let email = email.to_owned();
    let found = tokio::task::spawn_blocking(move || db.find_user_by_email(&email)).await??;
    Ok(found.is_some())
}

pub fn is_email(value: &str) -> bool {
    if value.len() > MAX_EMAIL_LEN {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };

    local.len() <= MAX_LOCAL_PART_LEN
        && domain.len() <= MAX_DOMAIN_LEN
        && LOCAL_PART.is_match(local)
        && DOMAIN.is_match(domain)
}

pub fn has_mixed_characters(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
}
