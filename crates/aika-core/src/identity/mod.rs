//! Identity domain module.
//!
//! # Module Structure
//!
//! - `model`: `Credentials`, `Identity` and login outcomes
//! - `verifier`: The pluggable `IdentityVerifier` port
//! - `gate`: `SessionGate`, which owns the signed-in identity

mod gate;
mod model;
mod verifier;

pub use gate::SessionGate;
pub use model::{Credentials, Identity, LoginFailure, LoginOutcome};
pub use verifier::IdentityVerifier;
