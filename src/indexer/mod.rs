//! Getting a workspace into a queryable state.
//!
//! [`readiness`] asks the external tool whether the workspace is usable;
//! [`recovery`] drives init, source registration and indexing when it is not.

pub mod readiness;
pub mod recovery;

pub use readiness::{check_readiness, CheckEntry, CheckStatus, ReadinessReport};
pub use recovery::{
    source_path_for, RecoveryOutcome, RecoveryReport, RecoveryState, RecoveryWorkflow,
};
