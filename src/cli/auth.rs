use colored::Colorize;
use tracing::info;
use zeroize::Zeroize;

use crate::api::BillingApi;
use crate::cli::connect;
use crate::error::{BillingError, Result};
use crate::models::{Credentials, Registration, User};
use crate::session::{Session, SessionStore};

fn prompt_password(prompt: &str) -> Result<String> {
    let password = rpassword::prompt_password(prompt)?;
    if password.is_empty() {
        return Err(BillingError::validation("Password is required"));
    }
    Ok(password)
}

/// Exchange credentials for a token and store it. Returns the user the
/// server reported, if any.
pub fn login_with<A: BillingApi + ?Sized>(
    api: &A,
    store: &SessionStore,
    credentials: &Credentials,
) -> Result<(Session, Option<User>)> {
    let response = api.login(credentials)?;
    let token = response
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BillingError::Other("Login response did not include a token".into()))?;
    let session = Session::with_token(token);
    store.save(&session)?;
    info!("Session saved to {}", store.path().display());
    Ok((session, response.user))
}

pub fn login(email: &str) -> Result<()> {
    let credentials = Credentials {
        email: email.trim().to_string(),
        password: prompt_password("Password: ")?,
    };
    let store = SessionStore::default_location();
    let (_, user) = login_with(&connect()?, &store, &credentials)?;
    let who = user.map(|u| u.to_string()).unwrap_or_else(|| email.to_string());
    println!("{} Logged in as {who}", "\u{2714}".green());
    Ok(())
}

pub fn register(name: &str, email: &str) -> Result<()> {
    let password = prompt_password("Password: ")?;
    let mut again = prompt_password("Confirm password: ")?;
    let matches = password == again;
    again.zeroize();
    let registration = Registration {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password,
    };
    if !matches {
        return Err(BillingError::validation("Passwords do not match"));
    }

    let response = connect()?.register(&registration)?;
    println!(
        "{}",
        response
            .message
            .unwrap_or_else(|| format!("Registered {email}. Run `clientbook login --email {email}`."))
    );
    Ok(())
}

pub fn logout() -> Result<()> {
    SessionStore::default_location().clear()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami() -> Result<()> {
    let user = connect()?.current_user()?;
    println!("{user}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeApi;

    fn creds(password: &str) -> Credentials {
        Credentials {
            email: "me@example.com".into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_login_saves_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let (session, user) = login_with(&FakeApi::default(), &store, &creds("secret")).unwrap();
        assert_eq!(session.bearer(), Some("token-123"));
        assert_eq!(user.map(|u| u.to_string()).as_deref(), Some("me@example.com"));
        assert_eq!(store.load().bearer(), Some("token-123"));
    }

    #[test]
    fn test_bad_password_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let err = login_with(&FakeApi::default(), &store, &creds("wrong")).unwrap_err();
        assert!(matches!(err, BillingError::Unauthorized(_)));
        assert!(!store.path().exists());
    }
}
