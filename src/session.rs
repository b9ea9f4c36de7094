//! Signed-in user state.
//!
//! A [`Session`] is created when a workspace is opened (restored from the
//! stored profile, if any) or on login, and torn down on logout. The stored
//! profile under [`PROFILE_KEY`] is the only durable state the daemon keeps.

use crate::config::AuthMode;
use crate::db;
use crate::error::SessionError;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const PROFILE_KEY: &str = "clasfy_user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "guru")]
    Teacher,
    #[serde(alias = "siswa")]
    Student,
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" | "guru" => Ok(Role::Teacher),
            "student" | "siswa" => Ok(Role::Student),
            other => Err(SessionError::AuthFailed(format!("unknown role: {}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Teacher => f.write_str("teacher"),
            Role::Student => f.write_str("student"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Teachers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip: Option<String>,
    /// Students only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nisn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub trait Authenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Profile, SessionError>;
}

/// Signs anyone in as one of two fixed demo users.
#[derive(Debug, Default)]
pub struct DemoAuthenticator;

impl Authenticator for DemoAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<Profile, SessionError> {
        if credentials.email.trim().is_empty() {
            return Err(SessionError::AuthFailed("email is required".to_string()));
        }
        if credentials.password.is_empty() {
            return Err(SessionError::AuthFailed("password is required".to_string()));
        }
        let email = credentials.email.trim().to_string();
        let profile = match credentials.role {
            Role::Teacher => Profile {
                id: "demo-teacher".to_string(),
                name: "Bu Sarah Wijaya".to_string(),
                email,
                role: Role::Teacher,
                avatar: None,
                nip: Some("196512345678901234".to_string()),
                nisn: None,
                class_name: None,
            },
            Role::Student => Profile {
                id: "demo-student".to_string(),
                name: "Ahmad Rizki".to_string(),
                email,
                role: Role::Student,
                avatar: None,
                nip: None,
                nisn: Some("0012345678".to_string()),
                class_name: Some("XII IPA 1".to_string()),
            },
        };
        Ok(profile)
    }
}

/// Stands in for the hosted login endpoint, which this daemon does not talk to.
#[derive(Debug, Default)]
pub struct UnavailableAuthenticator;

impl Authenticator for UnavailableAuthenticator {
    fn authenticate(&self, _credentials: &Credentials) -> Result<Profile, SessionError> {
        Err(SessionError::AuthUnavailable)
    }
}

pub fn authenticator_for(mode: AuthMode) -> Box<dyn Authenticator> {
    match mode {
        AuthMode::Demo => Box::new(DemoAuthenticator),
        AuthMode::Remote => Box::new(UnavailableAuthenticator),
    }
}

pub struct SessionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SessionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        match db::settings_get_text(self.conn, PROFILE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        db::settings_set_json(self.conn, PROFILE_KEY, &serde_json::to_value(session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<bool, SessionError> {
        Ok(db::settings_delete(self.conn, PROFILE_KEY)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub profile: Profile,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn restore(store: &SessionStore<'_>) -> Result<Option<Session>, SessionError> {
        let session = store.load()?;
        if let Some(s) = &session {
            tracing::info!(user = %s.profile.id, role = %s.profile.role, "restored session");
        }
        Ok(session)
    }

    pub fn login(
        store: &SessionStore<'_>,
        authenticator: &dyn Authenticator,
        credentials: &Credentials,
    ) -> Result<Session, SessionError> {
        let profile = authenticator.authenticate(credentials)?;
        let session = Session {
            id: Uuid::new_v4(),
            profile,
            signed_in_at: Utc::now(),
        };
        store.save(&session)?;
        tracing::info!(user = %session.profile.id, role = %session.profile.role, "signed in");
        Ok(session)
    }

    /// Deletes the stored profile. The caller drops the session only once this
    /// succeeds, so a failed delete leaves the user signed in everywhere.
    pub fn logout(&self, store: &SessionStore<'_>) -> Result<(), SessionError> {
        store.clear()?;
        tracing::info!(user = %self.profile.id, "signed out");
        Ok(())
    }
}
