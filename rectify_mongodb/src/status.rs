//! The `connectionStatus` command and its response.

use mongodb::bson::{doc, Document};
use mongodb::Client;
use serde::Deserialize;

use rectify_core::logging::debug;
use rectify_core::{PermissionSet, RectifyError};

use crate::consts;
use crate::error::classify_error;

/// Response to `connectionStatus` with `showPrivileges: true`.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionStatus {
    #[serde(default)]
    auth_info: AuthInfo,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct AuthInfo {
    #[serde(default)]
    authenticated_users: Vec<AuthenticatedUser>,
    #[serde(default)]
    authenticated_user_privileges: Vec<Privilege>,
}

#[derive(Deserialize, Debug)]
struct AuthenticatedUser {
    user: String,
    db: String,
}

/// One privilege: a set of actions on a resource. The resource isn't
/// needed for rectification.
#[derive(Deserialize, Debug)]
struct Privilege {
    #[serde(default)]
    actions: Vec<String>,
}

impl ConnectionStatus {
    pub(crate) fn from_document(document: Document) -> Result<Self, RectifyError> {
        mongodb::bson::from_document(document).map_err(|e| {
            RectifyError::ProviderConnection(format!("unexpected connectionStatus response: {}", e))
        })
    }

    /// Every action across all privileges, in first-seen order.
    pub(crate) fn actions(&self) -> PermissionSet {
        self.auth_info
            .authenticated_user_privileges
            .iter()
            .flat_map(|p| p.actions.iter().cloned())
            .collect()
    }

    /// Fail unless the server says someone is logged in. An anonymous
    /// session has no privileges to report, which is not the same as a
    /// principal holding none.
    pub(crate) fn require_principal(self) -> Result<Self, RectifyError> {
        if self.auth_info.authenticated_users.is_empty() {
            return Err(RectifyError::ProviderAuth(
                "connectionStatus reported no authenticated users".to_owned(),
            ));
        }
        Ok(self)
    }

    /// The authenticated principals, as `user@db`.
    pub(crate) fn principals(&self) -> Vec<String> {
        self.auth_info
            .authenticated_users
            .iter()
            .map(|u| format!("{}@{}", u.user, u.db))
            .collect()
    }
}

/// Ask the server what the current connection is allowed to do.
pub(crate) async fn fetch_connection_status(client: &Client) -> Result<ConnectionStatus, RectifyError> {
    let response = client
        .database(consts::ADMIN_DB)
        .run_command(doc! { "connectionStatus": 1, "showPrivileges": true }, None)
        .await
        .map_err(classify_error)?;

    let status = ConnectionStatus::from_document(response)?.require_principal()?;
    debug!("authenticated as {}", status.principals().join(", "));
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    #[test]
    fn actions_flatten_in_first_seen_order() -> Result<()> {
        let response = doc! {
            "authInfo": {
                "authenticatedUsers": [{ "user": "auditor", "db": "admin" }],
                "authenticatedUserRoles": [{ "role": "readWrite", "db": "app" }],
                "authenticatedUserPrivileges": [
                    {
                        "resource": { "db": "app", "collection": "" },
                        "actions": ["find", "insert", "update"]
                    },
                    {
                        "resource": { "cluster": true },
                        "actions": ["listDatabases", "find"]
                    }
                ]
            },
            "ok": 1.0
        };
        let status = ConnectionStatus::from_document(response)?;
        assert_eq!(
            status.actions().to_vec(),
            vec!["find", "insert", "update", "listDatabases"]
        );
        assert_eq!(status.principals(), vec!["auditor@admin"]);
        Ok(())
    }

    #[test]
    fn unauthenticated_status_is_an_auth_error() -> Result<()> {
        let status = ConnectionStatus::from_document(doc! {
            "authInfo": { "authenticatedUsers": [], "authenticatedUserRoles": [] },
            "ok": 1.0
        })?;
        assert!(status.actions().is_empty());
        assert!(matches!(
            status.require_principal(),
            Err(RectifyError::ProviderAuth(_))
        ));
        Ok(())
    }

    #[test]
    fn authenticated_principal_without_privileges_is_empty() -> Result<()> {
        let status = ConnectionStatus::from_document(doc! {
            "authInfo": {
                "authenticatedUsers": [{ "user": "auditor", "db": "$external" }],
                "authenticatedUserPrivileges": []
            },
            "ok": 1.0
        })?
        .require_principal()?;
        assert!(status.actions().is_empty());
        assert_eq!(status.principals(), vec!["auditor@$external"]);
        Ok(())
    }

    #[test]
    fn malformed_status_is_a_connection_error() {
        let res = ConnectionStatus::from_document(doc! {
            "authInfo": { "authenticatedUserPrivileges": "not a list" }
        });
        assert!(matches!(res, Err(RectifyError::ProviderConnection(_))));
    }
}
