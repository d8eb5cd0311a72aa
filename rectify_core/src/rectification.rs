//! Rectification: reconcile required permissions with granted ones.
//!
//! The comparison itself is pure. [`Rectifier`] adds the one I/O step,
//! asking a [`PermissionProvider`] what the principal actually holds.

use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::RectifyError;
use crate::log_runtime;
use crate::logging::{debug, info};
use crate::permissions::PermissionSet;
use crate::provider::PermissionProvider;
use crate::target::ConnectionTarget;

/// Coarse summary of how well the grants cover the requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectificationStatus {
    /// Every required permission is granted.
    Full,
    /// Some, but not all, required permissions are granted.
    Partial,
    /// No required permission is granted.
    None,
}

impl Display for RectificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RectificationStatus::Full => write!(f, "full"),
            RectificationStatus::Partial => write!(f, "partial"),
            RectificationStatus::None => write!(f, "none"),
        }
    }
}

/// The three-way split of required and actual permissions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partitions {
    /// Required and granted.
    pub present: PermissionSet,
    /// Required but not granted.
    pub missing: PermissionSet,
    /// Granted but not required.
    pub extra: PermissionSet,
}

/// Split `required` and `actual` into present, missing and extra.
pub fn partition(required: &PermissionSet, actual: &PermissionSet) -> Partitions {
    Partitions {
        present: required.intersection(actual),
        missing: required.difference(actual),
        extra: actual.difference(required),
    }
}

/// Derive the status from the raw partitions.
pub fn classify(partitions: &Partitions) -> RectificationStatus {
    if partitions.present.is_empty() {
        RectificationStatus::None
    } else if partitions.missing.is_empty() {
        RectificationStatus::Full
    } else {
        RectificationStatus::Partial
    }
}

/// The full outcome of a rectification. Partitions here are the true
/// computed ones; see [`RectificationResult::reported_missing`] for what
/// callers are shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RectificationResult {
    /// The required set the comparison ran against.
    pub required: PermissionSet,
    /// Required and granted.
    pub present: PermissionSet,
    /// Required but not granted.
    pub missing: PermissionSet,
    /// Granted but not required.
    pub extra: PermissionSet,
    /// Coverage summary.
    pub status: RectificationStatus,
}

/// Reconcile a required set with an actual set.
pub fn reconcile(required: &PermissionSet, actual: &PermissionSet) -> RectificationResult {
    let partitions = partition(required, actual);
    let status = classify(&partitions);
    RectificationResult {
        required: required.clone(),
        present: partitions.present,
        missing: partitions.missing,
        extra: partitions.extra,
        status,
    }
}

impl RectificationResult {
    /// The missing set as reported to callers.
    ///
    /// EMPTY-ALL rule: when present, missing and extra are all empty there
    /// was no signal at all, and the whole required list is reported as
    /// missing. This also fires when the required list itself is empty, in
    /// which case the reported list is empty too.
    pub fn reported_missing(&self) -> &PermissionSet {
        if self.present.is_empty() && self.missing.is_empty() && self.extra.is_empty() {
            &self.required
        } else {
            &self.missing
        }
    }

    /// Build the wire report.
    pub fn report(&self) -> RectificationReport {
        RectificationReport {
            extra: self.extra.to_vec(),
            missing: self.reported_missing().to_vec(),
            present: self.present.to_vec(),
            status: self.status,
        }
    }
}

/// What a rectification looks like to an external caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectificationReport {
    /// Over-privileged: granted but not required.
    pub extra: Vec<String>,
    /// Under-privileged: required but not granted (EMPTY-ALL applied).
    pub missing: Vec<String>,
    /// Required and granted.
    pub present: Vec<String>,
    /// Coverage summary.
    pub status: RectificationStatus,
}

/// Resolve the required set for a call: absent or empty falls back to
/// `defaults`. Still empty afterwards is invalid input.
pub fn normalize_required(
    required: Option<PermissionSet>,
    defaults: &PermissionSet,
) -> Result<PermissionSet, RectifyError> {
    let required = match required {
        Some(r) if !r.is_empty() => r,
        _ => defaults.clone(),
    };
    if required.is_empty() {
        return Err(RectifyError::InvalidInput(
            "at least one required permission is needed".to_owned(),
        ));
    }
    Ok(required)
}

/// The reconciliation engine. Holds the injected provider and the default
/// required set; keeps no per-call state, so it can be shared freely.
#[derive(Clone)]
pub struct Rectifier {
    provider: Arc<dyn PermissionProvider>,
    default_required: PermissionSet,
}

impl Rectifier {
    /// Build an engine around a provider.
    pub fn new(provider: Arc<dyn PermissionProvider>, default_required: PermissionSet) -> Self {
        Self {
            provider,
            default_required,
        }
    }

    /// Rectify the target's grants against the required set.
    ///
    /// Provider errors are returned as-is; a failed lookup never turns into
    /// an empty actual set.
    pub async fn rectify(
        &self,
        required: Option<PermissionSet>,
        target: &ConnectionTarget,
    ) -> Result<RectificationResult, RectifyError> {
        let required = normalize_required(required, &self.default_required)?;
        debug!(
            "rectifying {} required permissions over {} authentication",
            required.len(),
            target.mode()
        );

        let actual = log_runtime!(
            "fetching actual permissions",
            self.provider.fetch_actual_permissions(target).await?
        );

        let result = reconcile(&required, &actual);
        info!(
            "rectification {}: {} present, {} missing, {} extra",
            result.status,
            result.present.len(),
            result.missing.len(),
            result.extra.len()
        );
        Ok(result)
    }
}
