//! MongoDB Permission Provider
//!
//! Introspects a MongoDB principal's effective privileges, authenticating
//! either with username/password or with an X.509 client certificate.
//!
//! ```
//! use std::sync::Arc;
//! use rectify_core::{config::RectifyConfig, Rectifier};
//! use rectify_mongodb::{MongoProvider, MongoProviderConfig};
//!
//! let config = RectifyConfig::default();
//! let provider = MongoProvider::new(MongoProviderConfig::from(&config));
//! let rectifier = Rectifier::new(Arc::new(provider), config.default_required());
//! ```

mod consts;
mod error;
mod status;
mod tls;

use std::time::Duration;

use async_trait::async_trait;
use mongodb::{
    options::{AuthMechanism, ClientOptions, Credential, Tls},
    Client,
};

use rectify_core::{
    config::RectifyConfig,
    logging::debug,
    target::ConnectionTarget,
    PermissionProvider, PermissionSet, RectifyError,
};

use error::classify_error;
use tls::StagedTls;

/// Settings for the MongoDB provider.
#[derive(Clone, Debug)]
pub struct MongoProviderConfig {
    /// Bound on server selection and on establishing a connection.
    pub timeout: Duration,
}

impl Default for MongoProviderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&RectifyConfig> for MongoProviderConfig {
    fn from(config: &RectifyConfig) -> Self {
        Self {
            timeout: config.timeout(),
        }
    }
}

/// The main MongoDB provider struct.
///
/// Every call opens its own client and shuts it down before returning.
#[derive(Clone, Debug, Default)]
pub struct MongoProvider {
    config: MongoProviderConfig,
}

impl MongoProvider {
    /// Basic constructor
    pub fn new(config: MongoProviderConfig) -> Self {
        Self { config }
    }

    /// Build driver options for the target. Certificate targets get TLS with
    /// the staged material and X.509 authentication.
    async fn client_options(
        &self,
        target: &ConnectionTarget,
        staged: Option<&StagedTls>,
    ) -> Result<ClientOptions, RectifyError> {
        let (uri, app) = match target {
            ConnectionTarget::Credential(c) => (&c.connection_string, &c.app),
            ConnectionTarget::Certificate(c) => (&c.uri, &c.app),
        };
        let mut options = ClientOptions::parse(uri).await.map_err(classify_error)?;

        if options.app_name.is_none() {
            options.app_name = Some(app.clone());
        }
        options.server_selection_timeout = Some(self.config.timeout);
        options.connect_timeout = Some(self.config.timeout);

        if let Some(staged) = staged {
            options.tls = Some(Tls::Enabled(staged.options()));
            options.credential = Some(
                Credential::builder()
                    .mechanism(AuthMechanism::MongoDbX509)
                    .build(),
            );
        }
        Ok(options)
    }
}

#[async_trait]
impl PermissionProvider for MongoProvider {
    async fn fetch_actual_permissions(
        &self,
        target: &ConnectionTarget,
    ) -> Result<PermissionSet, RectifyError> {
        // Lives until the end of the call; dropping it removes the files.
        let staged = match target {
            ConnectionTarget::Certificate(c) => Some(StagedTls::stage(c)?),
            ConnectionTarget::Credential(_) => None,
        };

        let options = self.client_options(target, staged.as_ref()).await?;
        let client = Client::with_options(options).map_err(classify_error)?;
        debug!("connected to MongoDB with {} authentication", target.mode());

        let status = status::fetch_connection_status(&client).await;
        client.shutdown().await;

        Ok(status?.actions())
    }
}
