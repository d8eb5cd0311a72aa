//! The seam between rectification and the system holding the grants.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::error::RectifyError;
use crate::permissions::PermissionSet;
use crate::target::ConnectionTarget;

/// The trait all permission providers are expected to implement.
///
/// A provider introspects the principal described by the target and
/// returns its effective permissions as a flat list of names. Connections
/// or secure contexts opened for a call must be released before it returns,
/// whether it succeeds or not.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Fetch the permissions actually granted to the target's principal.
    async fn fetch_actual_permissions(
        &self,
        target: &ConnectionTarget,
    ) -> Result<PermissionSet, RectifyError>;
}
