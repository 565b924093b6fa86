//! Session credential model: redacted secrets, access-token claims, and the credential pair.

pub mod claims;
pub mod credentials;
pub mod secret;

pub use claims::*;
pub use credentials::*;
pub use secret::*;
