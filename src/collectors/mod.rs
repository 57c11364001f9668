pub mod gpu;
pub mod system;

use crate::snapshot::{GpuStat, HostFacts};

// Raw per-cycle readings, before percentage normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostSample {
    pub cpu_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub disk_mount: String,
    pub disk_used_bytes: u64,
    pub disk_total_bytes: u64,
    pub uptime_seconds: u64,
}

pub trait HostProbe: Send {
    fn sample(&mut self) -> HostSample;
    fn facts(&mut self) -> HostFacts;
}

#[async_trait::async_trait]
pub trait GpuProbe: Send {
    async fn query(&self) -> Option<GpuStat>;
}
