//! BHyve virtual machine service (`bls`, `bstart`, `bstop`, `bremove`,
//! `bcreate`).

use crate::args::{ArgList, ToArgs};
use crate::error::Result;
use crate::exec::Executor;
use crate::parse;
use crate::service::{self, DomainService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Columns requested from `cbsd bls`, in the order the parser maps them.
const DISPLAY: &str = "jname,jid,vm_ram,vm_cpus,vm_os_type,status,vnc_port";

/// Snapshot of one bhyve virtual machine as reported by `cbsd bls`.
///
/// Records are rebuilt on every [`list`](DomainService::list) call and
/// never cached; the name is the key for targeting later operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bhyve {
    /// Short VM name (the `jname` column)
    pub name: String,
    /// Numeric id assigned by cbsd; 0 when the VM is not running
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

impl Bhyve {
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

/// Configuration for `cbsd bcreate`.
///
/// Every field is independently optional: empty strings and `None` flags
/// are omitted from the command line and the tool picks its own default.
/// Fields marshal in declaration order under their external tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BhyveCreate {
    /// Short VM name (`jname`)
    pub name: String,
    /// xHCI USB controller (`xhci`)
    pub xhci: String,
    /// Start the VM automatically on host boot (`astart`)
    pub auto_start: Option<bool>,
    /// Use a relative path (`relative_path`)
    pub relative_path: Option<bool>,
    /// VM path (`path`)
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
    /// Start the VM as soon as it is created (`runasap`)
    pub run_asap: Option<bool>,
    /// Host network interface (`interface`)
    pub interface: String,
    /// rctl nice value (`rctl_nice`)
    pub rctl_nice: String,
    /// Emulator to use (`emulator`)
    pub emulator: String,
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
    /// Host bridge model (`vm_hostbridge`)
    pub host_bridge: String,
    /// Extra flags passed straight to bhyve (`bhyve_flags`)
    pub bhyve_flags: String,
    /// Virtio device type (`virtio_type`)
    pub virtio_type: String,
    /// Guest OS profile (`vm_os_profile`)
    pub os_profile: String,
    /// Swap size (`swapsize`)
    pub swap_size: String,
    /// Path to the attached ISO (`vm_iso_path`)
    pub iso_path: String,
    /// Guest filesystem (`vm_guestfs`)
    pub guest_fs: String,
    /// VNC console port (`vm_vnc_port`)
    pub vnc_port: String,
    /// Generate ACPI tables (`bhyve_generate_acpi`)
    pub generate_acpi: String,
    /// Wire guest memory (`bhyve_wire_memory`)
    pub wire_memory: String,
    /// RTS keeps UTC time (`bhyve_rts_keeps_utc`)
    pub rts_keeps_utc: String,
    /// Force MSI interrupts (`bhyve_force_msi_irq`)
    pub force_msi_irq: String,
    /// x2APIC mode (`bhyve_x2apic_mode`)
    pub x2apic_mode: String,
    /// Generate MP table (`bhyve_mptable_gen`)
    pub mptable_gen: String,
    /// Ignore unimplemented MSR accesses (`bhyve_ignore_msr_acc`)
    pub ignore_msr_acc: String,
    /// Wait for VNC connection before booting from CD (`cd_vnc_wait`)
    pub cd_vnc_wait: String,
    /// VNC resolution (`bhyve_vnc_resolution`)
    pub vnc_resolution: String,
    /// Address for the VNC listener (`bhyve_vnc_tcp_bind`)
    pub vnc_tcp_bind: String,
    /// VNC VGA configuration (`bhyve_vnc_vgaconf`)
    pub vnc_vgaconf: String,
    /// NIC driver (`nic_driver`)
    pub nic_driver: String,
    /// VNC password (`vnc_password`)
    pub vnc_password: String,
    /// Eject media automatically (`media_auto_eject`)
    pub media_auto_eject: String,
    /// CPU topology (`vm_cpu_topology`)
    pub cpu_topology: String,
    /// Debug engine (`debug_engine`)
    pub debug_engine: String,
    /// Boot firmware for CD boot (`cd_boot_firmware`)
    pub cd_boot_firmware: String,
    /// Run the VM inside a jail (`jailed`)
    pub jailed: String,
    /// Action on guest power-off (`on_poweroff`)
    pub on_poweroff: String,
    /// Action on guest reboot (`on_reboot`)
    pub on_reboot: String,
    /// Action on guest crash (`on_crash`)
    pub on_crash: String,
}

impl ToArgs for BhyveCreate {
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
        args.string("emulator", &self.emulator);
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
        args.string("vm_hostbridge", &self.host_bridge);
        args.string("bhyve_flags", &self.bhyve_flags);
        args.string("virtio_type", &self.virtio_type);
        args.string("vm_os_profile", &self.os_profile);
        args.string("swapsize", &self.swap_size);
        args.string("vm_iso_path", &self.iso_path);
        args.string("vm_guestfs", &self.guest_fs);
        args.string("vm_vnc_port", &self.vnc_port);
        args.string("bhyve_generate_acpi", &self.generate_acpi);
        args.string("bhyve_wire_memory", &self.wire_memory);
        args.string("bhyve_rts_keeps_utc", &self.rts_keeps_utc);
        args.string("bhyve_force_msi_irq", &self.force_msi_irq);
        args.string("bhyve_x2apic_mode", &self.x2apic_mode);
        args.string("bhyve_mptable_gen", &self.mptable_gen);
        args.string("bhyve_ignore_msr_acc", &self.ignore_msr_acc);
        args.string("cd_vnc_wait", &self.cd_vnc_wait);
        args.string("bhyve_vnc_resolution", &self.vnc_resolution);
        args.string("bhyve_vnc_tcp_bind", &self.vnc_tcp_bind);
        args.string("bhyve_vnc_vgaconf", &self.vnc_vgaconf);
        args.string("nic_driver", &self.nic_driver);
        args.string("vnc_password", &self.vnc_password);
        args.string("media_auto_eject", &self.media_auto_eject);
        args.string("vm_cpu_topology", &self.cpu_topology);
        args.string("debug_engine", &self.debug_engine);
        args.string("cd_boot_firmware", &self.cd_boot_firmware);
        args.string("jailed", &self.jailed);
        args.string("on_poweroff", &self.on_poweroff);
        args.string("on_reboot", &self.on_reboot);
        args.string("on_crash", &self.on_crash);
        args.into_vec()
    }
}

/// Service facade over the bhyve subcommands.
pub struct BhyveService {
    exec: Arc<dyn Executor>,
}

impl BhyveService {
    /// Create a service on top of the given executor.
    pub fn new(exec: Arc<dyn Executor>) -> Self {
        Self { exec }
    }
}

#[async_trait]
impl DomainService for BhyveService {
    type Domain = Bhyve;
    type Create = BhyveCreate;

    async fn list(&self) -> Result<Vec<Bhyve>> {
        let output = service::run_list(&self.exec, "bls", DISPLAY).await?;
        let vms: Vec<Bhyve> = parse::data_lines(&output).map(Bhyve::from_line).collect();
        debug!(count = vms.len(), "listed bhyve domains");
        Ok(vms)
    }

    async fn start(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "bstart", name).await?;
        service::check_action_output("bstart", name, output)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "bstop", name).await?;
        service::check_action_output("bstop", name, output)
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let output = service::run_action(&self.exec, "bremove", name).await?;
        service::check_remove_output(name, output)
    }

    async fn create(&self, config: &BhyveCreate) -> Result<Vec<u8>> {
        service::run_create(&self.exec, "bcreate", config).await
    }
}
