//! Sign-in material sent to the login endpoint.

mod credentials;
mod secret;

pub use credentials::*;
pub use secret::*;
