//! # cbsd
//!
//! Typed binding for the [CBSD](https://github.com/cbsd/cbsd) virtual
//! environment management CLI on BSD hosts.
//!
//! CBSD drives bhyve virtual machines, jails, and Xen domains through one
//! command-line tool. This crate wraps that tool: it builds `key=value`
//! argument lines, spawns `cbsd`, and scrapes its tabular and freeform
//! output back into typed records. All the real virtualization work
//! happens inside `cbsd` itself; the binding is a faithful adapter, not
//! an orchestrator.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                          Cbsd                             │
//! ├───────────────────────────────────────────────────────────┤
//! │                                                           │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐      │
//! │  │ BhyveService │ │ JailService  │ │  XenService  │      │
//! │  │  - list()    │ │  - list()    │ │  - list()    │      │
//! │  │  - start()   │ │  - start()   │ │  - start()   │      │
//! │  │  - stop()    │ │  - stop()    │ │  - stop()    │      │
//! │  │  - remove()  │ │  - remove()  │ │  - remove()  │      │
//! │  │  - create()  │ │  - create()  │ │  - create()  │      │
//! │  └──────┬───────┘ └──────┬───────┘ └──────┬───────┘      │
//! │         │                │                │               │
//! │         └────────────────┼────────────────┘               │
//! │                          ▼                                │
//! │                ┌──────────────────┐                       │
//! │                │ Arc<dyn Executor>│                       │
//! │                │ (ShellExecutor)  │                       │
//! │                └────────┬─────────┘                       │
//! └─────────────────────────┼─────────────────────────────────┘
//!                           ▼
//!                  `cbsd` subprocess
//!          (bls/bstart/..., jls/..., xls/...)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use cbsd::{BhyveCreate, Cbsd, DomainService};
//!
//! # async fn example() -> cbsd::Result<()> {
//! let cbsd = Cbsd::new();
//!
//! // Provision a VM; unset fields fall back to the tool's defaults.
//! let config = BhyveCreate {
//!     name: "build".to_string(),
//!     cpus: "12".to_string(),
//!     ram: "64g".to_string(),
//!     os_type: "linux".to_string(),
//!     run_asap: Some(true),
//!     ..Default::default()
//! };
//! cbsd.bhyve.create(&config).await?;
//!
//! for vm in cbsd.bhyve.list().await? {
//!     println!("{} [{}] {}", vm.name, vm.os_type, vm.status);
//! }
//!
//! cbsd.bhyve.stop("build").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Three resource kinds**: bhyve VMs, jails, and Xen domains behind
//!   one [`DomainService`] contract
//! - **Deterministic argument marshaling**: creation configs become
//!   `key=value` tokens in declaration order, shell-quoted
//! - **Lenient output parsing**: listings survive the tool's loosely
//!   structured columns; malformed numerics read as zero
//! - **Sentinel error detection**: a "No such domain" marker in otherwise
//!   successful output surfaces as [`CbsdError::NoSuchDomain`]

mod args;
mod bhyve;
mod error;
mod exec;
mod jail;
mod parse;
mod service;
mod xen;

pub use args::{quote, ArgList, ToArgs};
pub use bhyve::{Bhyve, BhyveCreate, BhyveService};
pub use error::{CbsdError, Result};
pub use exec::{Executor, ShellExecutor};
pub use jail::{Jail, JailCreate, JailService};
pub use service::DomainService;
pub use xen::{Xen, XenCreate, XenService};

use std::sync::Arc;

/// Service container wiring one shared executor behind the three
/// per-resource services.
pub struct Cbsd {
    /// bhyve virtual machine operations
    pub bhyve: BhyveService,
    /// jail operations
    pub jail: JailService,
    /// Xen domain operations
    pub xen: XenService,
}

impl Cbsd {
    /// Create a container backed by the real `cbsd` tool on the host.
    pub fn new() -> Self {
        Self::with_executor(Arc::new(ShellExecutor::new()))
    }

    /// Create a container backed by a custom executor, e.g. a mock in
    /// tests or an instrumented wrapper.
    pub fn with_executor(exec: Arc<dyn Executor>) -> Self {
        Self {
            bhyve: BhyveService::new(Arc::clone(&exec)),
            jail: JailService::new(Arc::clone(&exec)),
            xen: XenService::new(exec),
        }
    }
}

impl Default for Cbsd {
    fn default() -> Self {
        Self::new()
    }
}
