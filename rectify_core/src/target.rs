//! Connection targets and request normalization.
//!
//! A request arrives with loosely-populated optional fields. It's resolved
//! here, once, into a [`ConnectionTarget`]: either a credential target or a
//! certificate target. Providers never re-inspect the raw fields.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::config::RectifyConfig;
use crate::error::RectifyError;
use crate::permissions::PermissionSet;

/// How the audited principal authenticates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Username and password.
    Credential,
    /// Client certificate and private key (X.509).
    Certificate,
}

impl Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Credential => write!(f, "credential"),
            AuthMode::Certificate => write!(f, "certificate"),
        }
    }
}

/// A principal reached with username and password.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTarget {
    /// The full connection string, credentials included.
    pub connection_string: String,
    /// The application label to report to the backing system.
    pub app: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for CredentialTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialTarget")
            .field("connection_string", &"<redacted>")
            .field("app", &self.app)
            .finish()
    }
}

/// A principal reached with a client certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateTarget {
    /// Connection URI without credentials.
    pub uri: String,
    /// PEM client certificate. May already contain the private key.
    pub cert: String,
    /// PEM private key, if it isn't bundled with the certificate.
    pub key: Option<String>,
    /// PEM certificate authority used to validate the server.
    pub ca: Option<String>,
    /// The application label to report to the backing system.
    pub app: String,
}

impl std::fmt::Debug for CertificateTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateTarget")
            .field("uri", &self.uri)
            .field("has_key", &self.key.is_some())
            .field("has_ca", &self.ca.is_some())
            .field("app", &self.app)
            .finish()
    }
}

/// The principal being audited. Exactly one authentication mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Username/password authentication.
    Credential(CredentialTarget),
    /// Certificate authentication.
    Certificate(CertificateTarget),
}

impl ConnectionTarget {
    /// The authentication mode of this target.
    pub fn mode(&self) -> AuthMode {
        match self {
            ConnectionTarget::Credential(_) => AuthMode::Credential,
            ConnectionTarget::Certificate(_) => AuthMode::Certificate,
        }
    }
}

/// The rectification request as it arrives over the wire. Every field is
/// optional; missing values fall back to configuration.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RectifyRequest {
    /// A pre-built connection string. Overrides all other target fields.
    pub connection: Option<String>,
    /// Host for a credential connection string.
    pub host: Option<String>,
    /// Application label.
    pub app: Option<String>,
    /// Username for credential authentication.
    pub username: Option<String>,
    /// Password for credential authentication.
    pub password: Option<String>,
    /// URI for certificate authentication.
    pub uri: Option<String>,
    /// PEM private key for certificate authentication.
    pub key: Option<String>,
    /// PEM client certificate for certificate authentication.
    pub cert: Option<String>,
    /// PEM certificate authority for certificate authentication.
    pub ca: Option<String>,
    /// The required permissions.
    pub permissions: Option<Vec<String>>,
}

impl std::fmt::Debug for RectifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RectifyRequest")
            .field("has_connection", &self.connection.is_some())
            .field("host", &self.host)
            .field("app", &self.app)
            .field("username", &self.username)
            .field("uri", &self.uri)
            .field("has_cert", &self.cert.is_some())
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Treat empty strings the same as absent ones.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// First populated value, request before config.
fn pick(request: &Option<String>, fallback: &Option<String>) -> Option<String> {
    non_empty(request).or_else(|| non_empty(fallback)).map(str::to_owned)
}

#[derive(Serialize)]
struct ConnectionContext {
    username: String,
    password: String,
    host: String,
    app: String,
}

impl RectifyRequest {
    /// Infer the authentication mode once config defaults are filled in.
    /// Certificate wins whenever certificate material is present, whether it
    /// came with the request or from the config.
    pub fn auth_mode(&self, config: &RectifyConfig) -> AuthMode {
        if pick(&self.cert, &config.default_cert).is_some()
            || pick(&self.key, &config.default_key).is_some()
        {
            AuthMode::Certificate
        } else {
            AuthMode::Credential
        }
    }

    /// The required permissions named by the request, if any.
    pub fn required_permissions(&self) -> Option<PermissionSet> {
        self.permissions
            .as_ref()
            .map(|perms| perms.iter().cloned().collect())
    }

    /// Resolve the request into a target for the given mode, filling in
    /// defaults from the config. Fields belonging to the other mode are
    /// ignored.
    pub fn into_target(
        &self,
        mode: AuthMode,
        config: &RectifyConfig,
    ) -> Result<ConnectionTarget, RectifyError> {
        match mode {
            AuthMode::Credential => self.credential_target(config).map(ConnectionTarget::Credential),
            AuthMode::Certificate => self
                .certificate_target(config)
                .map(ConnectionTarget::Certificate),
        }
    }

    fn app(&self, config: &RectifyConfig) -> String {
        non_empty(&self.app)
            .unwrap_or(&config.default_app)
            .to_owned()
    }

    fn credential_target(&self, config: &RectifyConfig) -> Result<CredentialTarget, RectifyError> {
        let app = self.app(config);
        if let Some(connection) = non_empty(&self.connection) {
            return Ok(CredentialTarget {
                connection_string: connection.to_owned(),
                app,
            });
        }

        let username = pick(&self.username, &config.default_username).ok_or_else(|| {
            RectifyError::InvalidInput("a username or a connection string is required".to_owned())
        })?;
        let password = pick(&self.password, &config.default_password).ok_or_else(|| {
            RectifyError::InvalidInput("a password or a connection string is required".to_owned())
        })?;
        let host = non_empty(&self.host)
            .unwrap_or(&config.default_host)
            .to_owned();

        let context = ConnectionContext {
            username: urlencoding::encode(&username).into_owned(),
            password: urlencoding::encode(&password).into_owned(),
            host,
            app: urlencoding::encode(&app).into_owned(),
        };
        Ok(CredentialTarget {
            connection_string: render_connection_string(&config.connection_template, &context)?,
            app,
        })
    }

    fn certificate_target(&self, config: &RectifyConfig) -> Result<CertificateTarget, RectifyError> {
        let uri = non_empty(&self.connection)
            .or_else(|| non_empty(&self.uri))
            .ok_or_else(|| {
                RectifyError::InvalidInput("a uri is required for certificate authentication".to_owned())
            })?
            .to_owned();
        let cert = pick(&self.cert, &config.default_cert).ok_or_else(|| {
            RectifyError::InvalidInput("a client certificate is required".to_owned())
        })?;

        Ok(CertificateTarget {
            uri,
            cert,
            key: pick(&self.key, &config.default_key),
            ca: pick(&self.ca, &config.default_ca),
            app: self.app(config),
        })
    }
}

fn render_connection_string(
    template: &str,
    context: &ConnectionContext,
) -> Result<String, RectifyError> {
    let bad_template =
        |e: tinytemplate::error::Error| RectifyError::InvalidInput(format!("bad connection template: {}", e));

    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("connection", template).map_err(bad_template)?;
    tt.render("connection", context).map_err(bad_template)
}
