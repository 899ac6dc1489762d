//! Common lifecycle contract and shared plumbing for the per-resource
//! services (bhyve, jail, xen).

use crate::args::ToArgs;
use crate::error::{CbsdError, Result};
use crate::exec::Executor;
use crate::parse;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Program name of the external tool.
pub(crate) const CBSD: &str = "cbsd";

/// Environment applied to every invocation: colored output would garble
/// the parsers, so it is disabled per call.
pub(crate) const NOCOLOR: &[(&str, &str)] = &[("NOCOLOR", "1")];

/// Lifecycle operations shared by the bhyve, jail, and xen services.
///
/// Every call re-derives state from a fresh `cbsd` invocation; nothing is
/// cached or tracked in the binding. The host's inventory is the sole
/// source of truth and the resource name is the correlation key.
#[async_trait]
pub trait DomainService: Send + Sync {
    /// Snapshot record produced by [`list`](DomainService::list).
    type Domain;
    /// Creation configuration consumed by [`create`](DomainService::create).
    type Create: ToArgs;

    /// List the resources currently known to the host.
    ///
    /// # Returns
    /// One record per resource; an empty vector when the tool reports none.
    ///
    /// # Errors
    /// Returns an error only if the subprocess itself failed; a partial
    /// listing is never returned.
    async fn list(&self) -> Result<Vec<Self::Domain>>;

    /// Start the named resource.
    ///
    /// # Errors
    /// [`CbsdError::NoSuchDomain`] carrying the full tool output when the
    /// resource does not exist, or [`CbsdError::Exec`] on launch failure.
    async fn start(&self, name: &str) -> Result<()>;

    /// Stop the named resource. Error behavior matches
    /// [`start`](DomainService::start).
    async fn stop(&self, name: &str) -> Result<()>;

    /// Remove the named resource.
    ///
    /// # Errors
    /// [`CbsdError::NoSuchDomain`] carrying only the offending output line
    /// when the resource does not exist.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Create a resource from `config`.
    ///
    /// # Returns
    /// The tool's raw output verbatim; creation output is freeform and the
    /// caller owns its interpretation.
    async fn create(&self, config: &Self::Create) -> Result<Vec<u8>>;
}

/// Run an action subcommand (`bstart`, `jstop`, ...) scoped to one domain.
pub(crate) async fn run_action(
    exec: &Arc<dyn Executor>,
    action: &str,
    name: &str,
) -> Result<String> {
    let args = vec![
        action.to_string(),
        "inter=0".to_string(),
        format!("jname={}", name),
    ];
    let bytes = exec.run(CBSD, &args, NOCOLOR).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run a listing subcommand with an explicit column set.
pub(crate) async fn run_list(
    exec: &Arc<dyn Executor>,
    subcommand: &str,
    display: &str,
) -> Result<String> {
    let args = vec![
        subcommand.to_string(),
        "header=0".to_string(),
        format!("display={}", display),
    ];
    let bytes = exec.run(CBSD, &args, NOCOLOR).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run a creation subcommand with the configuration marshaled after the
/// fixed arguments.
pub(crate) async fn run_create(
    exec: &Arc<dyn Executor>,
    subcommand: &str,
    config: &(dyn ToArgs + Sync),
) -> Result<Vec<u8>> {
    let args = vec![subcommand.to_string(), "inter=0".to_string()];
    exec.run_with_config(CBSD, &args, config, NOCOLOR).await
}

/// start/stop policy: a sentinel anywhere in the output fails the call
/// with the full output as the message.
pub(crate) fn check_action_output(action: &str, name: &str, output: String) -> Result<()> {
    if parse::contains_sentinel(&output) {
        warn!(action, name, "domain not found");
        return Err(CbsdError::NoSuchDomain(output));
    }
    debug!(action, name, "action completed");
    Ok(())
}

/// remove policy: a sentinel fails the call quoting only the offending
/// line. Callers get a one-line message instead of the tool's progress
/// spew around it.
pub(crate) fn check_remove_output(name: &str, output: String) -> Result<()> {
    match parse::sentinel_line(&output) {
        Some(line) => {
            warn!(name, "domain not found");
            Err(CbsdError::NoSuchDomain(line.to_string()))
        }
        None => {
            debug!(name, "remove completed");
            Ok(())
        }
    }
}
