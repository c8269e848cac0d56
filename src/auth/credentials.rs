//! Credential types and their application to requests

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme written in front of a token in the `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScheme {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `Authorization: token <token>` (GitHub personal access tokens)
    Token,
}

/// Credential bound to a transport
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// Anonymous access
    #[default]
    None,

    /// Token in the `Authorization` header
    Token {
        /// The token value
        token: String,
        /// Scheme prefix
        #[serde(default)]
        scheme: TokenScheme,
    },

    /// HTTP Basic authentication (e.g. Bitbucket app passwords)
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Arbitrary header (e.g. GitLab `PRIVATE-TOKEN`)
    Header {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },
}

impl Credentials {
    /// Bearer token credential
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
            scheme: TokenScheme::Bearer,
        }
    }

    /// GitHub-style `token` credential
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
            scheme: TokenScheme::Token,
        }
    }

    /// Basic auth credential
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Custom header credential
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether no credential is bound
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Apply the credential to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => req,
            Self::Token {
                token,
                scheme: TokenScheme::Bearer,
            } => req.bearer_auth(token),
            Self::Token {
                token,
                scheme: TokenScheme::Token,
            } => req.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            Self::Basic { username, password } => req.basic_auth(username, Some(password)),
            Self::Header { name, value } => req.header(name.as_str(), value.as_str()),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Token { scheme, .. } => f
                .debug_struct("Token")
                .field("scheme", scheme)
                .finish_non_exhaustive(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}
