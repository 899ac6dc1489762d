//! Jail service (`jls`, `jstart`, `jstop`, `jremove`, `jcreate`).

use crate::args::{ArgList, ToArgs};
use crate::error::Result;
use crate::exec::Executor;
use crate::parse;
use crate::service::{self, DomainService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Columns requested from `cbsd jls`, in the order the parser maps them.
const DISPLAY: &str = "jname,jid,ip4_addr,host_hostname,path,status";

/// Snapshot of one jail as reported by `cbsd jls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jail {
    /// Short jail name (the `jname` column)
    pub name: String,
    /// Numeric jail id; 0 when the jail is not running
    pub jid: u32,
    /// IPv4 address assigned to the jail
    pub ip4_addr: String,
    /// Full (FQDN) jail hostname
    pub hostname: String,
    /// Jail root path on the host
    pub path: String,
    /// Run status as printed by the tool (e.g. `On`, `Off`)
    pub status: String,
}

impl Jail {
    fn from_line(line: &str) -> Self {
        let fields: Vec<&str> = line.split_whitespace().collect();
        Self {
            name: parse::field(&fields, 0).to_string(),
            jid: parse::numeric(&fields, 1),
            ip4_addr: parse::field(&fields, 2).to_string(),
            hostname: parse::field(&fields, 3).to_string(),
            path: parse::field(&fields, 4).to_string(),
            status: parse::field(&fields, 5).to_string(),
        }
    }
}

/// Configuration for `cbsd jcreate`.
///
/// Unset fields are omitted from the command line; fields marshal in
/// declaration order under their external tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JailCreate {
    /// Short jail name (`jname`)
    pub name: String,
    /// xHCI USB controller (`xhci`)
    pub xhci: String,
    /// Start the jail automatically on host boot (`astart`)
    pub auto_start: Option<bool>,
    /// Use a relative path (`relative_path`)
    pub relative_path: Option<bool>,
    /// Jail path (`path`)
    pub path: String,
    /// Data path (`data`)
    pub data: String,
    /// rc.conf path (`rcconf`)
    pub rc_conf: String,
    /// Full (FQDN) jail hostname (`host_hostname`)
    pub hostname: String,
    /// IPv4 address (`ip4_addr`)
    pub ip4_addr: String,
    /// MAC address (`nic_hwaddr`)
    pub nic_hwaddr: String,
    /// ZFS snapshot to use as the data source (`zfs_snapsrc`)
    pub zfs_snap_src: String,
    /// Start the jail as soon as it is created (`runasap`)
    pub run_asap: Option<bool>,
    /// Host network interface (`interface`)
    pub interface: String,
    /// rctl nice value (`rctl_nice`)
    pub rctl_nice: String,
}

impl ToArgs for JailCreate {
    fn to_args(&self) -> Vec<String> {
        let mut args = ArgList::new();
        args.string("jname", &self.name);
        args.string("xhci", &self.xhci);
        args.flag("astart", self.auto_start);
        args.flag("relative_path", self.relative_path);
        args.string("path", &self.path);
        args.string("data", &self.data);
        args.string("rcconf", &self.rc_conf);
        args.string("host_hostname", &self.hostname);
        args.string("ip4_addr", &self.ip4_addr);
        args.string("nic_hwaddr", &self.nic_hwaddr);
        args.string("zfs_snapsrc", &self.zfs_snap_src);
        args.flag("runasap", self.run_asap);
        args.string("interface", &self.interface);
        args.string("rctl_nice", &self.rctl_nice);
        args.into_vec()
    }
}

/// Service facade over the jail subcommands.
pub struct JailService {
    exec: Arc<dyn Executor>,
}

impl JailService {
    /// Create a service on top of the given executor.
    pub fn new(exec: Arc<dyn Executor>) -> Self {
        Self { exec }
    }
}

#[async_trait]
impl DomainService for JailService {
    type Domain = Jail;
    type Create = JailCreate;

    async fn list(&self) -> Result<Vec<Jail>> {
        let output = service::run_list(&self.exec, "jls", DISPLAY).await?;
        let jails: Vec<Jail> = parse::data_lines(&output).map(Jail::from_line).collect();
        debug!(count = jails.len(), "listed jails");
        Ok(jails)
    }

    async fn start(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "jstart", name).await?;
        service::check_action_output("jstart", name, output)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "jstop", name).await?;
        service::check_action_output("jstop", name, output)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "jremove", name).await?;
        service::check_remove_output(name, output)
    }

    async fn create(&self, config: &JailCreate) -> Result<Vec<u8>> {
        service::run_create(&self.exec, "jcreate", config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CbsdError;
    use crate::exec::mock::MockExecutor;

    #[tokio::test]
    async fn test_list_parses_records() {
        let exec = MockExecutor::returning(
            "web1  1  10.0.0.10  web1.example.org  /usr/jails/web1  On\nweb2  0  10.0.0.11  web2.example.org  /usr/jails/web2  Off",
        );
        let service = JailService::new(exec.clone());

        let jails = service.list().await.unwrap();
        assert_eq!(jails.len(), 2);
        assert_eq!(jails[0].name, "web1");
        assert_eq!(jails[0].jid, 1);
        assert_eq!(jails[0].ip4_addr, "10.0.0.10");
        assert_eq!(jails[1].status, "Off");

        let call = exec.last_call();
        assert_eq!(
            call.args,
            vec![
                "jls",
                "header=0",
                "display=jname,jid,ip4_addr,host_hostname,path,status"
            ]
        );
    }

    #[tokio::test]
    async fn test_start_sentinel_surfaces_full_output() {
        let output = "No such domain: no-jail";
        let exec = MockExecutor::returning(output);
        let service = JailService::new(exec);
        let err = service.start("no-jail").await.unwrap_err();
        assert_eq!(err.to_string(), output);
    }

    #[tokio::test]
    async fn test_remove_sentinel_surfaces_offending_line() {
        let exec = MockExecutor::returning("cleanup\nNo such domain: no-jail\ndone");
        let service = JailService::new(exec);
        let err = service.remove("no-jail").await.unwrap_err();
        assert_eq!(err.to_string(), "No such domain: no-jail");
    }

    #[tokio::test]
    async fn test_exec_error_propagates() {
        let exec = MockExecutor::failing("spawn failed");
        let service = JailService::new(exec);
        assert!(matches!(
            service.stop("web1").await.unwrap_err(),
            CbsdError::Exec { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_marshals_in_declaration_order() {
        let exec = MockExecutor::returning("jcreate done");
        let service = JailService::new(exec.clone());

        let config = JailCreate {
            name: "web1".to_string(),
            xhci: "1".to_string(),
            auto_start: Some(false),
            hostname: "web1.example.org".to_string(),
            ip4_addr: "10.0.0.10".to_string(),
            ..Default::default()
        };
        service.create(&config).await.unwrap();

        let call = exec.last_call();
        assert_eq!(
            call.args,
            vec![
                "jcreate",
                "inter=0",
                "jname=web1",
                "xhci=1",
                "astart=0",
                "host_hostname=web1.example.org",
                "ip4_addr=10.0.0.10"
            ]
        );
    }
}
