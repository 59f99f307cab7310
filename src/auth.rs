use sha2::{Digest, Sha512};

use crate::directory::AccountDirectory;
use crate::error::{BankError, Result};
use crate::models::User;

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha512::digest(password.as_bytes()))
}

fn credentials<'a>(username: &'a str, password: &'a str) -> Result<(&'a str, &'a str)> {
    let (username, password) = (username.trim(), password.trim());
    if username.is_empty() || password.is_empty() {
        return Err(BankError::Auth("Username and password are both required".to_string()));
    }
    Ok((username, password))
}

/// Create a user. The first user ever registered becomes the admin.
pub fn register<D: AccountDirectory>(directory: &mut D, username: &str, password: &str) -> Result<User> {
    let (username, password) = credentials(username, password)?;
    if directory.get_user_by_username(username)?.is_some() {
        return Err(BankError::Auth("Username already exists".to_string()));
    }
    let is_admin = directory.count_users()? == 0;
    let password_hash = hash_password(password);
    let id = directory.create_user(username, &password_hash, is_admin)?;
    tracing::info!(username, is_admin, "registered user");
    Ok(User {
        id,
        username: username.to_string(),
        password_hash,
        is_admin,
    })
}

pub fn login<D: AccountDirectory>(directory: &D, username: &str, password: &str) -> Result<User> {
    let (username, password) = credentials(username, password)?;
    let invalid = || BankError::Auth("Invalid username or password".to_string());
    let user = directory.get_user_by_username(username)?.ok_or_else(invalid)?;
    if user.password_hash != hash_password(password) {
        tracing::debug!(username, "password mismatch");
        return Err(invalid());
    }
    Ok(user)
}

/// Look up the user a saved session points at.
pub fn session_user<D: AccountDirectory>(directory: &D, username: Option<&str>) -> Result<User> {
    let username = username.ok_or_else(|| BankError::Auth("Not logged in. Run `bank login <username>`.".to_string()))?;
    directory
        .get_user_by_username(username)?
        .ok_or_else(|| BankError::Auth(format!("Session user '{username}' no longer exists. Log in again.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::SqliteDirectory;

    fn test_dir() -> (tempfile::TempDir, SqliteDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let directory = SqliteDirectory::open(&dir.path().join("test.db")).unwrap();
        (dir, directory)
    }

    #[test]
    fn test_hash_is_sha512_hex() {
        let h = hash_password("secret");
        assert_eq!(h.len(), 128);
        assert_eq!(h, hash_password("secret"));
        assert_ne!(h, hash_password("Secret"));
    }

    #[test]
    fn test_first_user_is_admin() {
        let (_dir, mut directory) = test_dir();
        let first = register(&mut directory, "alice", "pw").unwrap();
        let second = register(&mut directory, "bob", "pw").unwrap();
        assert!(first.is_admin);
        assert!(!second.is_admin);
    }

    #[test]
    fn test_register_rejects_duplicates_and_blanks() {
        let (_dir, mut directory) = test_dir();
        register(&mut directory, "alice", "pw").unwrap();
        assert!(matches!(register(&mut directory, "alice", "x"), Err(BankError::Auth(_))));
        assert!(register(&mut directory, "  ", "x").is_err());
        assert!(register(&mut directory, "carol", " ").is_err());
    }

    #[test]
    fn test_login() {
        let (_dir, mut directory) = test_dir();
        register(&mut directory, "alice", "pw").unwrap();
        assert_eq!(login(&directory, " alice ", "pw").unwrap().username, "alice");
        assert!(login(&directory, "alice", "wrong").is_err());
        assert!(login(&directory, "nobody", "pw").is_err());
    }

    #[test]
    fn test_session_user() {
        let (_dir, mut directory) = test_dir();
        register(&mut directory, "alice", "pw").unwrap();
        assert!(session_user(&directory, Some("alice")).is_ok());
        assert!(session_user(&directory, None).is_err());
        assert!(session_user(&directory, Some("ghost")).is_err());
    }
}
