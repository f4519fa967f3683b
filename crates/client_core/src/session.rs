//! Read-only view of the signed-in user, consumed by the transfer client.

pub trait SessionProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn is_signed_in(&self) -> bool {
        self.access_token().is_some()
    }
}

pub struct AnonymousSession;

impl SessionProvider for AnonymousSession {
    fn access_token(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct StaticSession {
    token: String,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl SessionProvider for StaticSession {
    fn access_token(&self) -> Option<String> {
        let token = self.token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_session_is_signed_in_only_with_a_token() {
        assert!(StaticSession::new("abc").is_signed_in());
        assert!(!StaticSession::new("   ").is_signed_in());
        assert!(!AnonymousSession.is_signed_in());
    }
}
