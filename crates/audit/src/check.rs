//! The check contract.
//!
//! Every audit rule implements [`Check`]. The executor only ever sees this
//! trait; rule bodies live in the `checks` crate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{CheckError, CheckGroup, CheckId, CheckResult};

/// One independent audit rule evaluated against the remote platform.
///
/// ## Outcomes of `execute`
///
/// | Return | Meaning |
/// |--------|---------|
/// | `Ok(Some(result))` | The rule was evaluated (any severity, including `Permission`). |
/// | `Ok(None)` | The rule does not apply (e.g. a required pattern is unset). Never reported as `Ok`. |
/// | `Err(err)` | A fatal failure. Only this check is aborted. |
///
/// `concurrency` is the check's private budget for its own sub-requests.
/// Checks never read or write each other's state.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable identity used for skip/only filtering and on results.
    fn id(&self) -> &CheckId;

    /// Category the check reports under.
    fn group(&self) -> CheckGroup;

    /// Evaluates the rule with at most `concurrency` concurrent sub-requests.
    async fn execute(&self, concurrency: usize) -> Result<Option<CheckResult>, CheckError>;
}

/// Ordered list of enabled checks for one run.
pub type CheckCollection = Vec<Arc<dyn Check>>;
