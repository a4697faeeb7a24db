//! Identity verifier backed by a fixed user list.

use aika_core::Result;
use aika_core::identity::{Credentials, Identity, IdentityVerifier};
use async_trait::async_trait;
use std::time::Duration;

/// Default artificial delay before answering a login attempt.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(500);

/// A user known to [`StaticCredentialVerifier`].
#[derive(Debug, Clone)]
pub struct StaticUser {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

impl StaticUser {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: display_name.into(),
        }
    }
}

/// Users the client ships with.
pub fn default_users() -> Vec<StaticUser> {
    vec![
        StaticUser::new("Amernaj", "Amer&1234", "Amernaj"),
        StaticUser::new("Florian plakolb", "Florian&1234", "Florian Plakolb"),
        StaticUser::new("Michaela plakolb", "Michaela&1234", "Michaela Plakolb"),
        StaticUser::new("test1", "test1&1234", "Test User 1"),
    ]
}

/// Verifies credentials by exact, case-sensitive comparison against a list.
#[derive(Debug, Clone)]
pub struct StaticCredentialVerifier {
    users: Vec<StaticUser>,
    delay: Duration,
}

impl Default for StaticCredentialVerifier {
    fn default() -> Self {
        Self::new(default_users())
    }
}

impl StaticCredentialVerifier {
    pub fn new(users: Vec<StaticUser>) -> Self {
        Self {
            users,
            delay: DEFAULT_LOGIN_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticCredentialVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<Option<Identity>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let identity = self
            .users
            .iter()
            .find(|u| u.username == credentials.username && u.password == credentials.password)
            .map(|u| Identity::new(u.username.clone(), u.display_name.clone()));
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_known_user_after_delay() {
        let verifier = StaticCredentialVerifier::default();
        let started = tokio::time::Instant::now();

        let identity = verifier
            .verify(&Credentials::new("Florian plakolb", "Florian&1234"))
            .await
            .unwrap();

        assert_eq!(identity, Some(Identity::new("Florian plakolb", "Florian Plakolb")));
        assert!(started.elapsed() >= DEFAULT_LOGIN_DELAY);
    }

    #[tokio::test]
    async fn test_match_is_case_sensitive() {
        let verifier = StaticCredentialVerifier::default().with_delay(Duration::ZERO);

        let wrong_case = verifier
            .verify(&Credentials::new("florian plakolb", "Florian&1234"))
            .await
            .unwrap();
        assert!(wrong_case.is_none());

        let wrong_password = verifier
            .verify(&Credentials::new("test1", "test1&12345"))
            .await
            .unwrap();
        assert!(wrong_password.is_none());
    }

    #[tokio::test]
    async fn test_padded_username_is_rejected() {
        let verifier = StaticCredentialVerifier::default().with_delay(Duration::ZERO);

        for username in [" test1", "test1 ", "\ttest1"] {
            let identity = verifier
                .verify(&Credentials::new(username, "test1&1234"))
                .await
                .unwrap();
            assert!(identity.is_none(), "{username:?} should not match");
        }
    }
}
