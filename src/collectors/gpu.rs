use crate::collectors::GpuProbe;
use crate::snapshot::GpuStat;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const QUERY_ARGS: [&str; 2] = [
    "--query-gpu=name,utilization.gpu,memory.used,memory.total,temperature.gpu",
    "--format=csv,noheader,nounits",
];

pub struct NvidiaSmiProbe {
    timeout: Duration,
}

impl NvidiaSmiProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl GpuProbe for NvidiaSmiProbe {
    async fn query(&self) -> Option<GpuStat> {
        let output = run_nvidia_smi(self.timeout).await?;
        if !output.status.success() {
            return None;
        }

        let text = String::from_utf8(output.stdout).ok()?;
        parse_gpu_line(text.lines().next()?)
    }
}

pub struct NullGpuProbe;

#[async_trait::async_trait]
impl GpuProbe for NullGpuProbe {
    async fn query(&self) -> Option<GpuStat> {
        None
    }
}

async fn run_nvidia_smi(timeout: Duration) -> Option<std::process::Output> {
    if let Some(output) = run_bounded("nvidia-smi", timeout).await {
        return Some(output);
    }

    #[cfg(target_os = "windows")]
    if let Some(output) = run_bounded(r"C:\Windows\System32\nvidia-smi.exe", timeout).await {
        return Some(output);
    }

    None
}

async fn run_bounded(program: &str, timeout: Duration) -> Option<std::process::Output> {
    let child = Command::new(program)
        .args(QUERY_ARGS)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .ok()?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(err)) => {
            debug!(error = %err, "не удалось дождаться nvidia-smi");
            None
        }
        Err(_) => {
            debug!(timeout = ?timeout, "nvidia-smi не ответил за отведённое время");
            None
        }
    }
}

// Either every field parses or the whole record is dropped.
fn parse_gpu_line(line: &str) -> Option<GpuStat> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 5 {
        return None;
    }

    let utilization_percent = parse_f64_loose(parts[1])?;
    let memory_used_mb = parse_f64_loose(parts[2])?;
    let memory_total_mb = parse_f64_loose(parts[3])?;
    let temperature_celsius = parse_f64_loose(parts[4])?;

    Some(GpuStat {
        name: parts[0].to_string(),
        utilization_percent,
        memory_used_mb,
        memory_total_mb,
        temperature_celsius,
    })
}

// nvidia-smi may emit comma decimals under some locales.
fn parse_f64_loose(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}
