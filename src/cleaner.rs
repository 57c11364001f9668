use crate::config::CleanerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub removed_items: u64,
    pub freed_bytes: u64,
    pub skipped: u64,
}

impl CleanReport {
    fn absorb(&mut self, other: CleanReport) {
        self.removed_items += other.removed_items;
        self.freed_bytes += other.freed_bytes;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("не удалось выполнить {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("команда {command} завершилась с ошибкой: {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
    #[error("очистка корзины поддерживается только в Windows")]
    RecycleBinUnsupported,
    #[error("cleanmgr доступен только в Windows")]
    DiskCleanupUnsupported,
}

pub fn temp_targets(cfg: &CleanerConfig) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = Vec::new();

    for var in ["TEMP", "TMP"] {
        if let Some(value) = std::env::var_os(var) {
            push_unique(&mut targets, PathBuf::from(value));
        }
    }

    #[cfg(target_os = "windows")]
    {
        push_unique(&mut targets, PathBuf::from(r"C:\Windows\Temp"));
        if cfg.include_prefetch {
            push_unique(&mut targets, PathBuf::from(r"C:\Windows\Prefetch"));
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        push_unique(&mut targets, PathBuf::from("/tmp"));
        push_unique(&mut targets, PathBuf::from("/var/tmp"));
    }

    for dir in &cfg.extra_dirs {
        push_unique(&mut targets, PathBuf::from(dir));
    }

    targets
}

fn push_unique(targets: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !targets.contains(&candidate) {
        targets.push(candidate);
    }
}

pub fn clean_temp_dirs(targets: &[PathBuf], dry_run: bool) -> CleanReport {
    let mut report = CleanReport::default();
    for dir in targets {
        report.absorb(clean_dir(dir, dry_run));
    }

    info!(
        removed = report.removed_items,
        freed = %bytes_human(report.freed_bytes),
        skipped = report.skipped,
        dry_run,
        "очистка временных каталогов завершена"
    );
    report
}

fn clean_dir(dir: &Path, dry_run: bool) -> CleanReport {
    let mut report = CleanReport::default();
    if !dir.exists() {
        warn!(path = %dir.display(), "каталог не найден, пропускаем");
        return report;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "нет доступа к каталогу");
            report.skipped += 1;
            return report;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() {
            let size = dir_size(&path);
            if dry_run {
                Some(size)
            } else {
                fs::remove_dir_all(&path).ok().map(|_| size)
            }
        } else {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if dry_run {
                Some(size)
            } else {
                fs::remove_file(&path).ok().map(|_| size)
            }
        };

        match removed {
            Some(size) => {
                report.removed_items += 1;
                report.freed_bytes += size;
            }
            None => {
                // Locked or in use; the next run picks it up.
                debug!(path = %path.display(), "объект не удалён, пропускаем");
                report.skipped += 1;
            }
        }
    }

    info!(
        path = %dir.display(),
        removed = report.removed_items,
        freed = %bytes_human(report.freed_bytes),
        "каталог обработан"
    );
    report
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };

    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            }
        })
        .sum()
}

#[cfg(target_os = "windows")]
pub fn empty_recycle_bin() -> Result<(), CleanerError> {
    run_checked(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "Clear-RecycleBin -Force -ErrorAction SilentlyContinue",
        ],
    )?;
    info!("корзина очищена");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn empty_recycle_bin() -> Result<(), CleanerError> {
    Err(CleanerError::RecycleBinUnsupported)
}

#[cfg(target_os = "windows")]
pub fn launch_disk_cleanup() -> Result<(), CleanerError> {
    let command = "cleanmgr /sagerun:1337".to_string();
    info!(%command, "запускаем системную очистку диска");
    std::process::Command::new("cleanmgr")
        .arg("/sagerun:1337")
        .spawn()
        .map_err(|source| CleanerError::Spawn { command, source })?;
    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn launch_disk_cleanup() -> Result<(), CleanerError> {
    Err(CleanerError::DiskCleanupUnsupported)
}

#[cfg(target_os = "windows")]
fn run_checked(program: &str, args: &[&str]) -> Result<(), CleanerError> {
    let command = format!("{} {}", program, args.join(" "));
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .map_err(|source| CleanerError::Spawn {
            command: command.clone(),
            source,
        })?;
    if !status.success() {
        return Err(CleanerError::Failed { command, status });
    }
    Ok(())
}

pub fn bytes_human(v: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let vf = v as f64;
    if vf >= GB {
        format!("{:.2} GB", vf / GB)
    } else if vf >= MB {
        format!("{:.2} MB", vf / MB)
    } else if vf >= KB {
        format!("{:.2} KB", vf / KB)
    } else {
        format!("{} B", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pctoolkit-test-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("scratch-каталог должен создаваться");
        dir
    }

    fn populate(dir: &Path) -> u64 {
        fs::write(dir.join("a.tmp"), vec![0_u8; 100]).expect("файл должен записываться");
        let nested = dir.join("nested");
        fs::create_dir(&nested).expect("вложенный каталог должен создаваться");
        fs::write(nested.join("b.tmp"), vec![0_u8; 200]).expect("файл должен записываться");
        300
    }

    #[test]
    fn clean_dir_removes_files_and_directories() {
        let dir = scratch_dir("clean");
        let content_size = populate(&dir);

        let report = clean_dir(&dir, false);
        assert_eq!(report.removed_items, 2);
        assert!(report.freed_bytes >= content_size);
        assert_eq!(report.skipped, 0);
        assert_eq!(fs::read_dir(&dir).expect("каталог остаётся").count(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn dry_run_measures_without_deleting() {
        let dir = scratch_dir("dry-run");
        let content_size = populate(&dir);

        let report = clean_dir(&dir, true);
        assert_eq!(report.removed_items, 2);
        assert!(report.freed_bytes >= content_size);
        assert_eq!(fs::read_dir(&dir).expect("каталог остаётся").count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dir_is_skipped_quietly() {
        let dir = std::env::temp_dir().join("pctoolkit-test-does-not-exist");
        assert_eq!(clean_dir(&dir, false), CleanReport::default());
    }

    #[test]
    fn dir_size_counts_nested_content() {
        let dir = scratch_dir("size");
        populate(&dir);
        assert!(dir_size(&dir) >= 300);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn extra_dirs_are_included_once() {
        let cfg = CleanerConfig {
            include_prefetch: true,
            extra_dirs: vec!["/opt/scratch".to_string(), "/opt/scratch".to_string()],
        };
        let targets = temp_targets(&cfg);
        let matches = targets
            .iter()
            .filter(|p| *p == &PathBuf::from("/opt/scratch"))
            .count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn bytes_human_picks_a_unit() {
        assert_eq!(bytes_human(512), "512 B");
        assert_eq!(bytes_human(2048), "2.00 KB");
        assert_eq!(bytes_human(3 * 1024 * 1024), "3.00 MB");
    }
}
