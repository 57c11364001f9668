use crate::collectors::{HostProbe, HostSample};
use crate::snapshot::HostFacts;
use std::path::Path;
use sysinfo::{CpuExt, DiskExt, System, SystemExt};
use tracing::debug;

pub struct SysinfoProbe {
    system: System,
    facts: Option<HostFacts>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new_all();
        // Prime CPU counters; each later refresh measures the inter-tick window.
        system.refresh_cpu();
        Self {
            system,
            facts: None,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SysinfoProbe {
    fn sample(&mut self) -> HostSample {
        self.system.refresh_cpu();
        self.system.refresh_memory();
        self.system.refresh_disks_list();
        self.system.refresh_disks();

        let cpu_percent = if self.system.cpus().is_empty() {
            0.0
        } else {
            let sum: f32 = self.system.cpus().iter().map(|c| c.cpu_usage()).sum();
            (sum / self.system.cpus().len() as f32) as f64
        };

        let (disk_mount, disk_used_bytes, disk_total_bytes) = primary_disk(&self.system);

        HostSample {
            cpu_percent,
            memory_used_bytes: self.system.used_memory() * 1024,
            memory_total_bytes: self.system.total_memory() * 1024,
            disk_mount,
            disk_used_bytes,
            disk_total_bytes,
            uptime_seconds: self.system.uptime(),
        }
    }

    fn facts(&mut self) -> HostFacts {
        if let Some(facts) = self.facts.as_ref() {
            return facts.clone();
        }

        let facts = HostFacts {
            host_name: self.system.host_name(),
            os_name: self.system.name(),
            os_version: self.system.os_version(),
            os_edition: windows_edition(),
            kernel_version: self.system.kernel_version(),
            cpu_brand: self.system.cpus().first().map(|c| c.brand().to_string()),
            cpu_physical_cores: self.system.physical_core_count().map(|v| v as u32),
            cpu_logical_cores: self.system.cpus().len() as u32,
            arch: std::env::consts::ARCH,
        };
        debug!(host = ?facts.host_name, "собраны статические сведения о хосте");
        self.facts = Some(facts.clone());
        facts
    }
}

fn primary_disk(system: &System) -> (String, u64, u64) {
    let root = Path::new(if cfg!(target_os = "windows") {
        "C:\\"
    } else {
        "/"
    });

    let chosen = system
        .disks()
        .iter()
        .find(|d| d.mount_point() == root)
        .or_else(|| system.disks().iter().max_by_key(|d| d.total_space()));

    match chosen {
        Some(d) => {
            let total = d.total_space();
            let used = total.saturating_sub(d.available_space());
            (d.mount_point().to_string_lossy().to_string(), used, total)
        }
        None => (String::new(), 0, 0),
    }
}

#[cfg(target_os = "windows")]
fn windows_edition() -> Option<String> {
    use std::process::Command;

    let script = "$v=Get-ItemProperty 'HKLM:\\SOFTWARE\\Microsoft\\Windows NT\\CurrentVersion'; \"$($v.ProductName)|$($v.CurrentBuild)\"";
    let output = Command::new("powershell")
        .args(["-NoProfile", "-Command", script])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let (product, build) = text.trim().split_once('|')?;
    let build: u32 = build.trim().parse().ok()?;
    Some(format!(
        "{} (сборка {})",
        normalize_windows_product(product.trim(), build),
        build
    ))
}

#[cfg(not(target_os = "windows"))]
fn windows_edition() -> Option<String> {
    None
}

// Builds 22000+ still report "Windows 10" in ProductName.
#[cfg(target_os = "windows")]
fn normalize_windows_product(product: &str, build: u32) -> String {
    if build >= 22_000 && product.contains("Windows 10") {
        return product.replace("Windows 10", "Windows 11");
    }
    product.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_disk_without_disks_is_empty() {
        let system = System::new();
        assert_eq!(primary_disk(&system), (String::new(), 0, 0));
    }

    #[test]
    fn sample_reports_memory_in_bytes() {
        let mut probe = SysinfoProbe::new();
        let sample = probe.sample();

        // sysinfo отдаёт память в КиБ, наружу должны уходить байты.
        assert_eq!(sample.memory_total_bytes, probe.system.total_memory() * 1024);
        assert_eq!(sample.memory_used_bytes, probe.system.used_memory() * 1024);
        assert!(sample.memory_total_bytes > probe.system.total_memory());
        assert!(sample.memory_total_bytes >= sample.memory_used_bytes);
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn product_name_corrected_for_windows_11_builds() {
        assert_eq!(
            normalize_windows_product("Windows 10 Pro", 22_631),
            "Windows 11 Pro"
        );
        assert_eq!(
            normalize_windows_product("Windows 10 Pro", 19_045),
            "Windows 10 Pro"
        );
    }
}
