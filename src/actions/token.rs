use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use super::ActionError;

/// Checks the shared verification token Slack sends with every payload.
pub struct TokenValidator {
    expected: SecretString,
}

impl TokenValidator {
    pub fn new(expected: &str) -> Self {
        Self {
            expected: SecretString::from(expected.to_string()),
        }
    }

    pub fn validate(&self, token: &str) -> Result<(), ActionError> {
        let expected = self.expected.expose_secret();
        if expected.is_empty() || !bool::from(expected.as_bytes().ct_eq(token.as_bytes())) {
            return Err(ActionError::Unauthorized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn matching_token_is_accepted() {
        let validator = TokenValidator::new("xyz-verification");
        assert_ok!(validator.validate("xyz-verification"));
    }

    #[test]
    fn mismatched_token_is_unauthorized() {
        let validator = TokenValidator::new("xyz-verification");
        assert!(matches!(
            validator.validate("xyz-verificatioN"),
            Err(ActionError::Unauthorized)
        ));
        assert_err!(validator.validate(""));
        assert_err!(validator.validate("xyz"));
    }

    #[test]
    fn longer_token_with_matching_prefix_is_unauthorized() {
        let validator = TokenValidator::new("xyz-verification");
        assert_err!(validator.validate("xyz-verification-extra"));
    }

    #[test]
    fn empty_expected_token_rejects_everything() {
        let validator = TokenValidator::new("");
        assert_err!(validator.validate(""));
    }
}
