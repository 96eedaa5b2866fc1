//! Auth context seam.
//!
//! Login/logout and token refresh belong to the surrounding application;
//! the data-access layer only needs "the current bearer token, if any" at
//! the moment a request goes out.

/// Supplies the current bearer token for outgoing requests.
pub trait TokenSource: Send + Sync {
    /// The token to attach, or `None` for anonymous requests.
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token holder for tests and simple applications.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// A source that never attaches a token.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_returns_its_token() {
        let source = StaticToken::new("abc123");
        assert_eq!(source.bearer_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn anonymous_returns_none() {
        assert!(StaticToken::anonymous().bearer_token().is_none());
    }
}
