use super::model::{Credentials, Identity};
use crate::error::Result;
use async_trait::async_trait;

/// Checks credentials against some authority.
///
/// Implementations decide where users come from (a fixed list, a remote
/// identity provider). The [`SessionGate`](super::SessionGate) only relies
/// on the contract below.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies `credentials`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(identity))` if the credentials match a known user
    /// - `Ok(None)` if they do not
    /// - `Err(_)` if the check itself could not be carried out
    async fn verify(&self, credentials: &Credentials) -> Result<Option<Identity>>;
}
