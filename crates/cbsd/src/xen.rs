//! Xen domain service (`xls`, `xstart`, `xstop`, `xremove`, `xcreate`).

use crate::args::{ArgList, ToArgs};
use crate::error::Result;
use crate::exec::Executor;
use crate::parse;
use crate::service::{self, DomainService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Columns requested from `cbsd xls`, in the order the parser maps them.
const DISPLAY: &str = "jname,jid,vm_ram,vm_cpus,vm_os_type,status,vnc_port";

/// Snapshot of one Xen domain as reported by `cbsd xls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xen {
    /// Short domain name (the `jname` column)
    pub name: String,
    /// Numeric domain id; 0 when the domain is not running
    pub jid: u32,
    /// Allocated RAM in megabytes
    pub ram_mb: u32,
    /// Allocated virtual CPU count
    pub cpus: u32,
    /// Guest OS type (e.g. `linux`, `freebsd`)
    pub os_type: String,
    /// Run status as printed by the tool (e.g. `On`, `Off`)
    pub status: String,
    /// VNC console endpoint (port, or `address:port`)
    pub vnc: String,
}

impl Xen {
    fn from_line(line: &str) -> Self {
        let fields: Vec<&str> = line.split_whitespace().collect();
        Self {
            name: parse::field(&fields, 0).to_string(),
            jid: parse::numeric(&fields, 1),
            ram_mb: parse::numeric(&fields, 2),
            cpus: parse::numeric(&fields, 3),
            os_type: parse::field(&fields, 4).to_string(),
            status: parse::field(&fields, 5).to_string(),
            vnc: parse::field(&fields, 6).to_string(),
        }
    }
}

/// Configuration for `cbsd xcreate`.
///
/// Unset fields are omitted from the command line; fields marshal in
/// declaration order under their external tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XenCreate {
    /// Short domain name (`jname`)
    pub name: String,
    /// xHCI USB controller (`xhci`)
    pub xhci: String,
    /// Start the domain automatically on host boot (`astart`)
    pub auto_start: Option<bool>,
    /// Use a relative path (`relative_path`)
    pub relative_path: Option<bool>,
    /// Domain path (`path`)
    pub path: String,
    /// Data path (`data`)
    pub data: String,
    /// rc.conf path (`rcconf`)
    pub rc_conf: String,
    /// Full (FQDN) guest hostname (`host_hostname`)
    pub hostname: String,
    /// IPv4 address (`ip4_addr`)
    pub ip4_addr: String,
    /// MAC address (`nic_hwaddr`)
    pub nic_hwaddr: String,
    /// ZFS snapshot to use as the data source (`zfs_snapsrc`)
    pub zfs_snap_src: String,
    /// Start the domain as soon as it is created (`runasap`)
    pub run_asap: Option<bool>,
    /// Host network interface (`interface`)
    pub interface: String,
    /// rctl nice value (`rctl_nice`)
    pub rctl_nice: String,
    /// Disk image size (`imgsize`)
    pub img_size: String,
    /// Disk image type (`imgtype`)
    pub img_type: String,
    /// Virtual CPU count (`vm_cpus`)
    pub cpus: String,
    /// RAM allocation (`vm_ram`)
    pub ram: String,
    /// Guest OS type (`vm_os_type`)
    pub os_type: String,
    /// EFI firmware (`vm_efi`)
    pub efi: String,
    /// Site to fetch the installation ISO from (`iso_site`)
    pub iso_site: String,
    /// Installation ISO image (`iso_img`)
    pub iso_img: String,
    /// Register the ISO under this name (`register_iso_name`)
    pub register_iso_name: String,
    /// Register the ISO as (`register_iso_as`)
    pub register_iso_as: String,
    /// Guest OS profile (`vm_os_profile`)
    pub os_profile: String,
    /// Swap size (`swapsize`)
    pub swap_size: String,
    /// Path to the attached ISO (`vm_iso_path`)
    pub iso_path: String,
    /// VNC console port (`vm_vnc_port`)
    pub vnc_port: String,
    /// VNC password (`vnc_password`)
    pub vnc_password: String,
}

impl ToArgs for XenCreate {
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
        args.string("imgsize", &self.img_size);
        args.string("imgtype", &self.img_type);
        args.string("vm_cpus", &self.cpus);
        args.string("vm_ram", &self.ram);
        args.string("vm_os_type", &self.os_type);
        args.string("vm_efi", &self.efi);
        args.string("iso_site", &self.iso_site);
        args.string("iso_img", &self.iso_img);
        args.string("register_iso_name", &self.register_iso_name);
        args.string("register_iso_as", &self.register_iso_as);
        args.string("vm_os_profile", &self.os_profile);
        args.string("swapsize", &self.swap_size);
        args.string("vm_iso_path", &self.iso_path);
        args.string("vm_vnc_port", &self.vnc_port);
        args.string("vnc_password", &self.vnc_password);
        args.into_vec()
    }
}

/// Service facade over the Xen subcommands.
pub struct XenService {
    exec: Arc<dyn Executor>,
}

impl XenService {
    /// Create a service on top of the given executor.
    pub fn new(exec: Arc<dyn Executor>) -> Self {
        Self { exec }
    }
}

#[async_trait]
impl DomainService for XenService {
    type Domain = Xen;
    type Create = XenCreate;

    async fn list(&self) -> Result<Vec<Xen>> {
        let output = service::run_list(&self.exec, "xls", DISPLAY).await?;
        let domains: Vec<Xen> = parse::data_lines(&output).map(Xen::from_line).collect();
        debug!(count = domains.len(), "listed xen domains");
        Ok(domains)
    }

    async fn start(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "xstart", name).await?;
        service::check_action_output("xstart", name, output)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "xstop", name).await?;
        service::check_action_output("xstop", name, output)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "xremove", name).await?;
        service::check_remove_output(name, output)
    }

    async fn create(&self, config: &XenCreate) -> Result<Vec<u8>> {
        service::run_create(&self.exec, "xcreate", config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CbsdError;
    use crate::exec::mock::MockExecutor;

    #[tokio::test]
    async fn test_list_maps_columns_positionally() {
        let exec = MockExecutor::returning("dom1  3  4096  4  linux  On  5900");
        let service = XenService::new(exec.clone());

        let domains = service.list().await.unwrap();
        assert_eq!(
            domains,
            vec![Xen {
                name: "dom1".to_string(),
                jid: 3,
                ram_mb: 4096,
                cpus: 4,
                os_type: "linux".to_string(),
                status: "On".to_string(),
                vnc: "5900".to_string(),
            }]
        );
        assert_eq!(exec.last_call().args[0], "xls");
    }

    #[tokio::test]
    async fn test_stop_sentinel_surfaces_full_output() {
        let output = "warmup\nNo such domain: dom9";
        let exec = MockExecutor::returning(output);
        let service = XenService::new(exec);
        let err = service.stop("dom9").await.unwrap_err();
        assert_eq!(err.to_string(), output);
    }

    #[tokio::test]
    async fn test_remove_clean_output_is_ok() {
        let exec = MockExecutor::returning("xremove done");
        let service = XenService::new(exec);
        assert!(service.remove("dom1").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_uses_xcreate_subcommand() {
        let exec = MockExecutor::returning("ok");
        let service = XenService::new(exec.clone());

        let config = XenCreate {
            name: "dom1".to_string(),
            xhci: "1".to_string(),
            ram: "4g".to_string(),
            vnc_password: "s3cret pass".to_string(),
            ..Default::default()
        };
        service.create(&config).await.unwrap();

        let call = exec.last_call();
        assert_eq!(
            call.args,
            vec![
                "xcreate",
                "inter=0",
                "jname=dom1",
                "xhci=1",
                "vm_ram=4g",
                "vnc_password='s3cret pass'"
            ]
        );
    }

    #[tokio::test]
    async fn test_exec_error_propagates() {
        let exec = MockExecutor::failing("spawn failed");
        let service = XenService::new(exec);
        assert!(matches!(
            service.start("dom1").await.unwrap_err(),
            CbsdError::Exec { .. }
        ));
    }
}
