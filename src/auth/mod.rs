//! Authentication module
//!
//! Supports: personal access token, bearer token, HTTP Basic, custom header
//!
//! Credentials are bound to a transport at construction. Re-authenticating
//! produces a new transport (see [`crate::http::Transport::authenticated`]);
//! token minting and refresh flows are handled by the embedding system.

mod credentials;

pub use credentials::{Credentials, TokenScheme};
