use mongodb::error::{Error, ErrorKind};

use rectify_core::RectifyError;

use crate::consts::{AUTHENTICATION_FAILED, UNAUTHORIZED};

/// Map a driver error onto a rectification error kind.
///
/// Rejected credentials are `ProviderAuth`, a bad URI is `InvalidInput`,
/// everything else (DNS, I/O, server selection timeouts) is
/// `ProviderConnection`.
pub(crate) fn classify_error(err: Error) -> RectifyError {
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => RectifyError::ProviderAuth(err.to_string()),
        ErrorKind::Command(command_error)
            if command_error.code == AUTHENTICATION_FAILED || command_error.code == UNAUTHORIZED =>
        {
            RectifyError::ProviderAuth(err.to_string())
        }
        ErrorKind::InvalidArgument { .. } => RectifyError::InvalidInput(err.to_string()),
        _ => RectifyError::ProviderConnection(err.to_string()),
    }
}
