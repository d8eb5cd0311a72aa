use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use rectify_core::{
    config::RectifyConfig,
    logging::info,
    normalize_required, reconcile,
    rectification::RectificationStatus,
    PermissionSet, RectificationReport, RectifyRequest, Rectifier,
};
use rectify_mongodb::{MongoProvider, MongoProviderConfig};

#[derive(Args)]
pub(crate) struct CheckArgs {
    /// A full connection string. Overrides host, app and credentials.
    #[clap(long)]
    connection: Option<String>,
    /// Host to build the connection string for.
    #[clap(long)]
    host: Option<String>,
    /// Application label reported to the server.
    #[clap(long)]
    app: Option<String>,
    /// Username for password authentication.
    #[clap(short, long)]
    username: Option<String>,
    /// Password for password authentication.
    #[clap(long)]
    password: Option<String>,
    /// Connection URI for certificate authentication.
    #[clap(long)]
    uri: Option<String>,
    /// PEM file with the client certificate.
    #[clap(long)]
    cert: Option<PathBuf>,
    /// PEM file with the client private key.
    #[clap(long)]
    key: Option<PathBuf>,
    /// PEM file with the certificate authority.
    #[clap(long)]
    ca: Option<PathBuf>,
    /// Required permissions, comma separated. Defaults to the configured list.
    #[clap(short, long, value_delimiter = ',')]
    permissions: Option<Vec<String>>,
    /// Actual permissions, comma separated. Skips the server entirely.
    #[clap(long, value_delimiter = ',')]
    actual: Option<Vec<String>>,
    /// Print the report as JSON.
    #[clap(long)]
    json: bool,
    /// Fail unless every required permission is granted.
    #[clap(long)]
    strict: bool,
}

async fn read_pem(path: &Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(p) => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("reading {}", p.display()))
            .map(Some),
        None => Ok(None),
    }
}

impl CheckArgs {
    /// Build the same request the HTTP API would receive.
    async fn to_request(&self) -> Result<RectifyRequest> {
        Ok(RectifyRequest {
            connection: self.connection.clone(),
            host: self.host.clone(),
            app: self.app.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            uri: self.uri.clone(),
            cert: read_pem(&self.cert).await?,
            key: read_pem(&self.key).await?,
            ca: read_pem(&self.ca).await?,
            permissions: self.permissions.clone(),
        })
    }
}

/// Run one rectification and print the outcome.
pub(crate) async fn check(args: CheckArgs, config: &RectifyConfig) -> Result<()> {
    let request = args.to_request().await?;

    let result = match &args.actual {
        Some(actual) => {
            info!("Using the supplied actual permissions. No server is contacted.");
            let required =
                normalize_required(request.required_permissions(), &config.default_required())?;
            let actual: PermissionSet = actual.iter().cloned().collect();
            reconcile(&required, &actual)
        }
        None => {
            let mode = request.auth_mode(config);
            let target = request.into_target(mode, config)?;
            let provider = MongoProvider::new(MongoProviderConfig::from(config));
            Rectifier::new(Arc::new(provider), config.default_required())
                .rectify(request.required_permissions(), &target)
                .await
                .context("rectification failed")?
        }
    };

    let report = result.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    if args.strict && report.status != RectificationStatus::Full {
        bail!("required permissions are not fully granted (status: {})", report.status);
    }
    Ok(())
}

pub(crate) fn render_report(report: &RectificationReport) -> String {
    let status = match report.status {
        RectificationStatus::Full => "FULL".green(),
        RectificationStatus::Partial => "PARTIAL".yellow(),
        RectificationStatus::None => "NONE".red(),
    };
    let mut out = format!("Rectification status: {}\n", status.bold());
    out.push_str(&section("present", &report.present));
    out.push_str(&section("missing", &report.missing));
    out.push_str(&section("extra", &report.extra));
    out
}

fn section(label: &str, permissions: &[String]) -> String {
    let list = if permissions.is_empty() {
        "-".dimmed().to_string()
    } else {
        permissions.join(", ")
    };
    format!("  {:<8} ({}) {}\n", label, permissions.len(), list)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        check: CheckArgs,
    }

    fn parse(args: &[&str]) -> CheckArgs {
        TestCli::try_parse_from(std::iter::once("check").chain(args.iter().copied()))
            .unwrap()
            .check
    }

    #[test]
    fn permission_lists_split_on_commas() {
        let args = parse(&["-p", "read,find", "--actual", "find,dropDatabase"]);
        assert_eq!(args.permissions, Some(vec!["read".to_owned(), "find".to_owned()]));
        assert_eq!(
            args.actual,
            Some(vec!["find".to_owned(), "dropDatabase".to_owned()])
        );
    }

    #[tokio::test]
    async fn pem_files_are_read_into_the_request() -> Result<()> {
        let mut cert = tempfile::NamedTempFile::new()?;
        write!(cert, "CERT")?;
        let args = parse(&[
            "--uri",
            "mongodb://db.example",
            "--cert",
            cert.path().to_str().unwrap(),
        ]);
        let request = args.to_request().await?;
        assert_eq!(request.cert.as_deref(), Some("CERT"));
        assert_eq!(request.key, None);
        assert_eq!(
            request.auth_mode(&RectifyConfig::default()),
            rectify_core::AuthMode::Certificate
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_pem_file_is_an_error() {
        let args = parse(&["--cert", "/definitely/not/here.pem"]);
        assert!(args.to_request().await.is_err());
    }

    #[tokio::test]
    async fn offline_check_succeeds_when_fully_granted() -> Result<()> {
        let args = parse(&["-p", "read", "--actual", "read,find", "--strict"]);
        check(args, &RectifyConfig::default()).await
    }

    #[tokio::test]
    async fn strict_offline_check_fails_on_partial() {
        let args = parse(&["-p", "read,insert", "--actual", "read", "--strict"]);
        assert!(check(args, &RectifyConfig::default()).await.is_err());
    }

    #[test]
    fn report_lists_every_partition() {
        colored::control::set_override(false);
        let report = reconcile(
            &["read", "insert"].into_iter().collect(),
            &["read", "dropDatabase"].into_iter().collect(),
        )
        .report();
        assert_eq!(
            render_report(&report),
            "Rectification status: PARTIAL\n  present  (1) read\n  missing  (1) insert\n  extra    (1) dropDatabase\n"
        );
    }
}
