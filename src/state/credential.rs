/// Tracks one API token and its rate-limit bookkeeping
///
/// Availability is a coarse circuit breaker: several requests may run with the
/// same token at once, but a token marked unavailable is never handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// The opaque token value
    pub token: String,

    /// Whether the token may be handed out
    pub available: bool,

    /// Requests served since the last re-enable
    pub usage_count: u32,
}

impl Credential {
    /// Creates an available credential with no recorded usage
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            available: true,
            usage_count: 0,
        }
    }

    /// Records that the token was handed out for one request
    pub fn record_use(&mut self) {
        self.usage_count += 1;
    }

    /// Returns true once the token has served more than `ceiling` requests
    pub fn is_exhausted(&self, ceiling: u32) -> bool {
        self.usage_count > ceiling
    }

    /// Takes the token out of rotation
    pub fn disable(&mut self) {
        self.available = false;
    }

    /// Puts the token back into rotation with a fresh usage budget
    pub fn enable(&mut self) {
        self.available = true;
        self.usage_count = 0;
    }

    /// Token with all but the last four characters masked, for logs
    pub fn masked(&self) -> String {
        let visible: String = self
            .token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("***{}", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_credential() {
        let credential = Credential::new("abc");
        assert_eq!(credential.token, "abc");
        assert!(credential.available);
        assert_eq!(credential.usage_count, 0);
    }

    #[test]
    fn test_exhausted_only_past_ceiling() {
        let mut credential = Credential::new("abc");
        for _ in 0..3 {
            credential.record_use();
        }

        assert!(!credential.is_exhausted(3));

        credential.record_use();
        assert!(credential.is_exhausted(3));
    }

    #[test]
    fn test_enable_resets_usage() {
        let mut credential = Credential::new("abc");
        credential.record_use();
        credential.disable();
        assert!(!credential.available);

        credential.enable();
        assert!(credential.available);
        assert_eq!(credential.usage_count, 0);
    }

    #[test]
    fn test_masked() {
        assert_eq!(Credential::new("ghp_123456789").masked(), "***6789");
        assert_eq!(Credential::new("ab").masked(), "***ab");
    }
}
