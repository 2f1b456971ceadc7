//! `Authorization` header credentials.

use base64::Engine;

/// Authentication credentials for HTTP requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication {
    /// HTTP Basic authentication.
    Basic {
        /// Login name.
        username: String,
        /// Password.
        password: String,
    },
    /// Bearer token authentication.
    Bearer(String),
    /// Any other scheme, sent verbatim as `<scheme> <credentials>`.
    Scheme {
        /// Scheme name, e.g. `Token`.
        scheme: String,
        /// Credentials following the scheme.
        credentials: String,
    },
}

impl Authentication {
    /// The scheme name used in the header value.
    pub fn scheme(&self) -> &str {
        match self {
            Self::Basic { .. } => "Basic",
            Self::Bearer(_) => "Bearer",
            Self::Scheme { scheme, .. } => scheme,
        }
    }

    /// The credentials part of the header value.
    pub fn credentials(&self) -> String {
        match self {
            Self::Basic { username, password } => base64::engine::general_purpose::STANDARD
                .encode(format!("{username}:{password}")),
            Self::Bearer(token) => token.clone(),
            Self::Scheme { credentials, .. } => credentials.clone(),
        }
    }

    /// The full `Authorization` header value.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme(), self.credentials())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_credentials() {
        let auth = Authentication::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(auth.header_value(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_custom_scheme() {
        let auth = Authentication::Scheme {
            scheme: "Token".to_string(),
            credentials: "abc123".to_string(),
        };
        assert_eq!(auth.header_value(), "Token abc123");
        assert_eq!(Authentication::Bearer("t".into()).header_value(), "Bearer t");
    }
}
