//! # API Module
//!
//! HTTP endpoints of the short-lived local server that `favsync auth` starts to
//! receive the OAuth callback.
//!
//! - [`callback`] - Completes the PKCE flow by exchanging the authorization code
//!   for a token and handing it to the waiting auth command.
//! - [`health`] - Reports status and version, handy to check the redirect URI
//!   points at the right address.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
