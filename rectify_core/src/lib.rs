//!
//! Permission rectification
//!
//! Compares the permissions an audit requires against the permissions a
//! principal actually holds and reports what is present, missing and extra.
#![cfg_attr(not(test), deny(missing_docs))]

pub use error::RectifyError;
pub use permissions::PermissionSet;
pub use provider::PermissionProvider;
pub use rectification::{
    normalize_required, reconcile, RectificationReport, RectificationResult, Rectifier,
};
pub use target::{AuthMode, ConnectionTarget, RectifyRequest};

pub mod config;
pub mod error;
pub mod logging;
pub mod permissions;
pub mod provider;
pub mod rectification;
pub mod target;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:literal, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
