//! Errors surfaced by rectification.
//!

use thiserror::Error;

/// Everything that can go wrong while rectifying permissions.
///
/// Provider failures keep their kind all the way to the caller so that
/// "could not verify" is never confused with "verified, nothing granted".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RectifyError {
    /// The backing system couldn't be reached (network, DNS, timeout).
    #[error("unable to reach the permission provider: {0}")]
    ProviderConnection(String),
    /// The backing system rejected the credentials or certificate.
    #[error("the permission provider rejected the credentials: {0}")]
    ProviderAuth(String),
    /// The request can't be turned into a rectification.
    #[error("invalid rectification input: {0}")]
    InvalidInput(String),
}

impl RectifyError {
    /// A stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RectifyError::ProviderConnection(_) => "provider_connection",
            RectifyError::ProviderAuth(_) => "provider_auth",
            RectifyError::InvalidInput(_) => "invalid_input",
        }
    }

    /// Whether the error came from the provider rather than the input.
    pub fn is_provider_error(&self) -> bool {
        !matches!(self, RectifyError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            RectifyError::ProviderConnection("x".to_owned()).kind(),
            RectifyError::ProviderAuth("x".to_owned()).kind(),
            RectifyError::InvalidInput("x".to_owned()).kind(),
        ];
        assert_eq!(kinds, ["provider_connection", "provider_auth", "invalid_input"]);
    }

    #[test]
    fn invalid_input_is_not_a_provider_error() {
        assert!(!RectifyError::InvalidInput("empty".to_owned()).is_provider_error());
        assert!(RectifyError::ProviderAuth("denied".to_owned()).is_provider_error());
    }
}
