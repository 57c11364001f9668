mod cleaner;
mod collectors;
mod config;
mod power;
mod sampler;
mod snapshot;
mod tools;

use clap::{Parser, Subcommand};
use collectors::gpu::{NullGpuProbe, NvidiaSmiProbe};
use collectors::system::SysinfoProbe;
use collectors::{GpuProbe, HostProbe};
use config::{Config, ConfigError};
use power::PowerAction;
use sampler::Sampler;
use snapshot::{bytes_to_gb, human_uptime, HostFacts, MetricsSnapshot};
use std::time::Duration;
use tools::SystemTool;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pctoolkit")]
#[command(version)]
#[command(about = "Системный тулкит: метрики, питание, очистка, утилиты")]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Периодический вывод метрик в консоль (по умолчанию)
    Watch {
        #[arg(long)]
        json: bool,
        /// Интервал опроса, например 500ms или 2s
        #[arg(long, value_parser = humantime::parse_duration)]
        interval: Option<Duration>,
    },
    /// Однократный снимок метрик и сведения о системе
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Управление питанием
    Power {
        #[command(subcommand)]
        action: PowerCmd,
    },
    /// Очистка временных файлов и корзины
    Clean {
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        recycle_bin: bool,
        #[arg(long)]
        disk_cleanup: bool,
    },
    /// Запуск встроенной системной утилиты
    Open {
        #[arg(value_enum)]
        tool: SystemTool,
    },
}

#[derive(Subcommand, Debug)]
enum PowerCmd {
    Shutdown,
    Restart,
    Sleep,
    Hibernate,
    Lock,
    SignOut,
    /// Запланировать выключение через указанное время, например 30m или 2h
    Schedule {
        #[arg(value_parser = humantime::parse_duration)]
        delay: Duration,
    },
    /// Отменить запланированное выключение
    Cancel,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = load_config(&cli.config);

    match cli.command.unwrap_or(CliCommand::Watch {
        json: false,
        interval: None,
    }) {
        CliCommand::Watch { json, interval } => run_watch(&cfg, json, interval).await,
        CliCommand::Status { json } => run_status(&cfg, json).await,
        CliCommand::Power { action } => run_power(action),
        CliCommand::Clean {
            dry_run,
            recycle_bin,
            disk_cleanup,
        } => run_clean(&cfg, dry_run, recycle_bin, disk_cleanup),
        CliCommand::Open { tool } => {
            if let Err(err) = tools::launch(tool) {
                error!(error = %err, "не удалось запустить утилиту");
                std::process::exit(1);
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: &str) -> Config {
    match Config::load_from_file(path) {
        Ok(cfg) => cfg,
        Err(ConfigError::Read { ref source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path, "файл конфигурации не найден, используем значения по умолчанию");
            Config::default()
        }
        Err(err) => {
            error!(error = %err, "не удалось загрузить конфигурацию");
            std::process::exit(1);
        }
    }
}

async fn run_watch(cfg: &Config, json: bool, interval_override: Option<Duration>) {
    let mut sampler_cfg = cfg.sampler_config();
    if let Some(interval) = interval_override {
        sampler_cfg.interval = interval;
    }

    let host = SysinfoProbe::new();
    let sampler = if cfg.gpu.enabled {
        Sampler::start(
            sampler_cfg.clone(),
            host,
            NvidiaSmiProbe::new(sampler_cfg.gpu_timeout),
        )
    } else {
        Sampler::start(sampler_cfg, host, NullGpuProbe)
    };

    let mut rx = sampler.subscribe();
    let render_task = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let Some(snapshot) = snapshot {
                render_snapshot(&snapshot, json);
            }
        }
    });

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "не удалось дождаться Ctrl+C");
    }
    info!("получен Ctrl+C, останавливаем сэмплер");
    if let Some(snapshot) = sampler.latest() {
        debug!(cpu = snapshot.cpu_percent, "последний снимок перед остановкой");
    }

    sampler.stop().await;
    let _ = render_task.await;
}

async fn run_status(cfg: &Config, json: bool) {
    let mut host = SysinfoProbe::new();
    let facts = host.facts();

    // One bounded measurement window so the single CPU reading is meaningful.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let sample = host.sample();

    let gpu = if cfg.gpu.enabled {
        NvidiaSmiProbe::new(Duration::from_secs(cfg.gpu.timeout_secs))
            .query()
            .await
    } else {
        None
    };
    let snapshot = sampler::build_snapshot(sample, gpu);

    if json {
        let payload = serde_json::json!({ "facts": facts, "snapshot": snapshot });
        println!("{}", payload);
        return;
    }

    print_facts(&facts);
    println!();
    println!("{}", format_status_line(&snapshot));
}

fn run_power(action: PowerCmd) {
    let result = match action {
        PowerCmd::Shutdown => power::run(PowerAction::Shutdown),
        PowerCmd::Restart => power::run(PowerAction::Restart),
        PowerCmd::Sleep => power::run(PowerAction::Sleep),
        PowerCmd::Hibernate => power::run(PowerAction::Hibernate),
        PowerCmd::Lock => power::run(PowerAction::Lock),
        PowerCmd::SignOut => power::run(PowerAction::SignOut),
        PowerCmd::Schedule { delay } => power::schedule_shutdown(delay),
        PowerCmd::Cancel => power::cancel_scheduled(),
    };

    if let Err(err) = result {
        error!(error = %err, "операция управления питанием не выполнена");
        std::process::exit(1);
    }
}

fn run_clean(cfg: &Config, dry_run: bool, recycle_bin: bool, disk_cleanup: bool) {
    let targets = cleaner::temp_targets(&cfg.cleaner);
    let report = cleaner::clean_temp_dirs(&targets, dry_run);
    println!(
        "🎉 Очистка завершена: удалено {} объектов, освобождено {}{}",
        report.removed_items,
        cleaner::bytes_human(report.freed_bytes),
        if dry_run { " (пробный запуск)" } else { "" }
    );

    if recycle_bin {
        if let Err(err) = cleaner::empty_recycle_bin() {
            error!(error = %err, "не удалось очистить корзину");
        }
    }
    if disk_cleanup {
        if let Err(err) = cleaner::launch_disk_cleanup() {
            error!(error = %err, "не удалось запустить очистку диска");
        }
    }
}

fn render_snapshot(snapshot: &MetricsSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(error = %err, "не удалось сериализовать снимок"),
        }
        return;
    }

    println!("{}", format_status_line(snapshot));
}

fn format_status_line(s: &MetricsSnapshot) -> String {
    let gpu = match &s.gpu {
        Some(g) => format!(
            "🎮 GPU: {:.1}% | {:.0}°C | {:.1}/{:.1} ГБ",
            g.utilization_percent,
            g.temperature_celsius,
            g.memory_used_mb / 1024.0,
            g.memory_total_mb / 1024.0
        ),
        None => "🎮 GPU: н/д".to_string(),
    };

    format!(
        "🧠 CPU: {:.1}% | 💾 RAM: {:.1}% ({:.1}/{:.1} ГБ) | 💽 Диск {}: {:.1}% | {} | ⏱ {}",
        s.cpu_percent,
        s.memory.percent,
        bytes_to_gb(s.memory.used_bytes),
        bytes_to_gb(s.memory.total_bytes),
        s.disk.mount,
        s.disk.percent,
        gpu,
        human_uptime(s.uptime_seconds)
    )
}

fn print_facts(facts: &HostFacts) {
    let os = facts.os_edition.clone().unwrap_or_else(|| {
        format!(
            "{} {}",
            facts.os_name.clone().unwrap_or_else(|| "н/д".to_string()),
            facts.os_version.clone().unwrap_or_default()
        )
    });
    let cores = match facts.cpu_physical_cores {
        Some(physical) => format!("{} ядер / {} потоков", physical, facts.cpu_logical_cores),
        None => format!("{} потоков", facts.cpu_logical_cores),
    };

    println!("🖥 Система");
    println!(
        "Хост: {}",
        facts.host_name.clone().unwrap_or_else(|| "н/д".to_string())
    );
    println!("ОС: {}", os);
    println!(
        "Ядро: {}",
        facts
            .kernel_version
            .clone()
            .unwrap_or_else(|| "н/д".to_string())
    );
    println!(
        "CPU: {} ({})",
        facts.cpu_brand.clone().unwrap_or_else(|| "н/д".to_string()),
        cores
    );
    println!("Архитектура: {}", facts.arch);
}
