use crate::collectors::{GpuProbe, HostProbe, HostSample};
use crate::snapshot::{clamp_percent, percent, DiskStat, GpuStat, MemoryStat, MetricsSnapshot};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub interval: Duration,
    pub gpu_timeout: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            gpu_timeout: Duration::from_secs(5),
        }
    }
}

pub struct Sampler {
    snapshot_rx: watch::Receiver<Option<MetricsSnapshot>>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Sampler {
    pub fn start<H, G>(config: SamplerConfig, host: H, gpu: G) -> Self
    where
        H: HostProbe + 'static,
        G: GpuProbe + 'static,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(interval = ?config.interval, "запуск сэмплера метрик");
        let task = tokio::spawn(run_loop(config, host, gpu, snapshot_tx, shutdown_rx));

        Self {
            snapshot_rx,
            shutdown_tx,
            task,
        }
    }

    // A slow subscriber never blocks the loop; it only sees the latest value.
    pub fn subscribe(&self) -> watch::Receiver<Option<MetricsSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn latest(&self) -> Option<MetricsSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

async fn run_loop<H, G>(
    config: SamplerConfig,
    mut host: H,
    gpu: G,
    snapshot_tx: watch::Sender<Option<MetricsSnapshot>>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    H: HostProbe,
    G: GpuProbe,
{
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                debug!("получен сигнал остановки сэмплера");
                break;
            }
            _ = ticker.tick() => {
                let sample = host.sample();
                // The per-cycle bound holds even for a misbehaving probe.
                let gpu_stat = match tokio::time::timeout(config.gpu_timeout, gpu.query()).await {
                    Ok(stat) => stat,
                    Err(_) => {
                        debug!(timeout = ?config.gpu_timeout, "опрос GPU не уложился в таймаут");
                        None
                    }
                };
                let _ = snapshot_tx.send(Some(build_snapshot(sample, gpu_stat)));
            }
        }
    }
}

pub(crate) fn build_snapshot(sample: HostSample, gpu: Option<GpuStat>) -> MetricsSnapshot {
    let gpu = gpu.map(|g| GpuStat {
        utilization_percent: clamp_percent(g.utilization_percent),
        ..g
    });

    MetricsSnapshot {
        cpu_percent: clamp_percent(sample.cpu_percent),
        memory: MemoryStat {
            percent: clamp_percent(percent(
                sample.memory_used_bytes as f64,
                sample.memory_total_bytes as f64,
            )),
            used_bytes: sample.memory_used_bytes,
            total_bytes: sample.memory_total_bytes,
        },
        disk: DiskStat {
            mount: sample.disk_mount,
            percent: clamp_percent(percent(
                sample.disk_used_bytes as f64,
                sample.disk_total_bytes as f64,
            )),
            used_bytes: sample.disk_used_bytes,
            total_bytes: sample.disk_total_bytes,
        },
        uptime_seconds: sample.uptime_seconds,
        gpu,
    }
}
