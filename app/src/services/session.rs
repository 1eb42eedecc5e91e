//! Signed-in session and its cookie token
//!
//! The session is passed explicitly to whatever needs the current user or
//! credential. The token is unsigned: it only carries a display name and an
//! email between requests.

use crate::credentials::Credential;
use crate::types::error::{Result, StoreError};
use crate::types::{AppState, Person};

pub const SESSION_COOKIE_NAME: &str = "sve_session";

/// Seven days
pub const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Default)]
pub struct Session {
    pub signed_in: Option<Person>,
    pub credential: Option<Credential>,
    /// Set once bootstrap ran without a failed step
    pub loading_complete: bool,
    pub state: AppState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Option<Credential>) -> Self {
        Self {
            credential,
            ..Self::default()
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential.is_some()
    }

    pub fn sign_in(&mut self, person: Person, credential: Credential) {
        self.signed_in = Some(person);
        self.credential = Some(credential);
    }

    pub fn sign_out(&mut self) {
        *self = Self::default();
    }
}

/// URL-safe token carrying `{name, email}`
pub fn session_token(person: &Person) -> Result<String> {
    let json = serde_json::to_string(person)?;
    Ok(mail_codec::encode(&json))
}

pub fn parse_session_token(token: &str) -> Result<Person> {
    let json = mail_codec::decode(token)?;
    let person: Person = serde_json::from_str(&json)?;
    if person.email.trim().is_empty() {
        return Err(StoreError::Parse(
            "Session token without an email".to_string(),
        ));
    }
    Ok(person)
}

/// `Set-Cookie` value for the signed-in person
pub fn session_cookie(person: &Person) -> Result<String> {
    Ok(format!(
        "{}={}; path=/; max-age={}; samesite=lax",
        SESSION_COOKIE_NAME,
        session_token(person)?,
        SESSION_MAX_AGE_SECS
    ))
}

/// Person from a `Cookie` request header, if it carries a session
pub fn person_from_cookie_header(header: &str) -> Result<Option<Person>> {
    let token = header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value);

    match token {
        Some(token) if !token.is_empty() => parse_session_token(token).map(Some),
        _ => Ok(None),
    }
}
