//! Signed-in sessions kept in the OS keychain, one entry per profile.

use groupwork_core::auth::{AuthClient, AuthResult, SessionPersistence};
pub use groupwork_core::auth::{AuthError, AuthSession};

pub type CliAuthClient = AuthClient<SessionStore>;

/// JSON-encoded session for one profile.
#[derive(Debug, Clone)]
pub struct SessionStore {
    account: String,
}

impl SessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            account: format!("session:{profile_name}"),
        }
    }
}

impl SessionPersistence for SessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        secret::read(&self.account)?
            .map(|raw| serde_json::from_str(&raw).map_err(AuthError::from))
            .transpose()
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        secret::write(&self.account, &serde_json::to_string(session)?)
    }

    fn clear_session(&self) -> AuthResult<()> {
        secret::delete(&self.account)
    }
}

/// Drop the stored session without building a client.
pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(not(test))]
mod secret {
    use groupwork_core::auth::{AuthError, AuthResult};
    use keyring::Entry;

    const SERVICE: &str = "groupwork-cli";

    fn storage_error(error: keyring::Error) -> AuthError {
        AuthError::SecureStorage(error.to_string())
    }

    fn entry(account: &str) -> AuthResult<Entry> {
        Entry::new(SERVICE, account).map_err(storage_error)
    }

    pub fn read(account: &str) -> AuthResult<Option<String>> {
        match entry(account)?.get_password() {
            Ok(raw) => Ok(Some(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(storage_error(error)),
        }
    }

    pub fn write(account: &str, raw: &str) -> AuthResult<()> {
        entry(account)?.set_password(raw).map_err(storage_error)
    }

    pub fn delete(account: &str) -> AuthResult<()> {
        match entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(storage_error(error)),
        }
    }
}


#[cfg(test)]
mod tests {
    use groupwork_core::auth::AuthUser;
    use groupwork_core::models::UserId;
    use pretty_assertions::assert_eq;

    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            expires_at: None,
            user: AuthUser {
                id: UserId::new("u-1"),
                name: Some("Sam".to_string()),
                email: Some("sam@uni.example".to_string()),
                role: None,
            },
        }
    }

    #[test]
    fn sessions_are_scoped_per_profile() {
        let course = SessionStore::new("auth-scope-a");
        let other = SessionStore::new("auth-scope-b");
        course.save_session(&session()).unwrap();

        assert_eq!(course.load_session().unwrap(), Some(session()));
        assert_eq!(other.load_session().unwrap(), None);

        clear_stored_session("auth-scope-a").unwrap();
        assert_eq!(course.load_session().unwrap(), None);
    }

    #[test]
    fn clearing_missing_session_succeeds() {
        assert!(clear_stored_session("auth-never-saved").is_ok());
    }

    #[test]
    fn corrupt_entry_is_a_json_error() {
        secret::write("session:auth-corrupt", "{not json").unwrap();
        let error = SessionStore::new("auth-corrupt").load_session().unwrap_err();
        assert!(matches!(error, AuthError::Json(_)));
    }
}
