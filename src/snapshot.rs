use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub cpu_percent: f64,
    pub memory: MemoryStat,
    pub disk: DiskStat,
    pub uptime_seconds: u64,
    pub gpu: Option<GpuStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStat {
    pub percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskStat {
    pub mount: String,
    pub percent: f64,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

// Either fully populated or absent; never a partial record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuStat {
    pub name: String,
    pub utilization_percent: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub temperature_celsius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostFacts {
    pub host_name: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub os_edition: Option<String>,
    pub kernel_version: Option<String>,
    pub cpu_brand: Option<String>,
    pub cpu_physical_cores: Option<u32>,
    pub cpu_logical_cores: u32,
    pub arch: &'static str,
}

pub fn percent(used: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        used * 100.0 / total
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64) / 1024.0 / 1024.0 / 1024.0
}

pub fn human_uptime(uptime_seconds: u64) -> String {
    let days = uptime_seconds / 86_400;
    let hours = (uptime_seconds % 86_400) / 3600;
    let mins = (uptime_seconds % 3600) / 60;

    if days > 0 {
        format!("{}д {}ч {}м", days, hours, mins)
    } else if hours > 0 {
        format!("{}ч {}м", hours, mins)
    } else if mins > 0 {
        format!("{}м", mins)
    } else {
        format!("{}с", uptime_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_zero_total_is_zero() {
        assert_eq!(percent(10.0, 0.0), 0.0);
        assert_eq!(percent(50.0, 200.0), 25.0);
    }

    #[test]
    fn clamp_keeps_values_in_range() {
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(42.5), 42.5);
    }

    #[test]
    fn uptime_renders_days_and_hours() {
        assert_eq!(human_uptime(3 * 86_400 + 2 * 3600), "3д 2ч 0м");
        assert_eq!(human_uptime(2 * 3600 + 5 * 60), "2ч 5м");
        assert_eq!(human_uptime(10 * 60), "10м");
        assert_eq!(human_uptime(45), "45с");
    }

    #[test]
    fn bytes_to_gb_converts_binary_gigabytes() {
        assert_eq!(bytes_to_gb(1024 * 1024 * 1024), 1.0);
    }
}
