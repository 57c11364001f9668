use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
    Sleep,
    Hibernate,
    Lock,
    SignOut,
}

#[derive(Debug, Error)]
pub enum PowerError {
    #[error("не удалось выполнить команду {command}: {source}")]
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
    #[error("действие {0} не поддерживается на этой ОС")]
    Unsupported(&'static str),
}

pub fn run(action: PowerAction) -> Result<(), PowerError> {
    let (program, args) = action_command(action)?;
    run_checked(program, &args)
}

pub fn schedule_shutdown(delay: Duration) -> Result<(), PowerError> {
    let (program, args) = schedule_command(delay);
    info!(delay = %humantime::format_duration(delay), "планируем выключение");
    run_checked(program, &args)
}

pub fn cancel_scheduled() -> Result<(), PowerError> {
    let (program, args) = cancel_command();
    run_checked(program, &args)
}

#[cfg(target_os = "windows")]
fn action_command(action: PowerAction) -> Result<(&'static str, Vec<String>), PowerError> {
    let (program, args): (&str, &[&str]) = match action {
        PowerAction::Shutdown => ("shutdown", &["/s", "/f", "/t", "0"]),
        PowerAction::Restart => ("shutdown", &["/r", "/f", "/t", "0"]),
        PowerAction::Sleep => ("rundll32.exe", &["powrprof.dll,SetSuspendState", "0,1,0"]),
        PowerAction::Hibernate => ("shutdown", &["/h"]),
        PowerAction::Lock => ("rundll32.exe", &["user32.dll,LockWorkStation"]),
        PowerAction::SignOut => ("shutdown", &["/l"]),
    };
    Ok((program, args.iter().map(|s| s.to_string()).collect()))
}

#[cfg(not(target_os = "windows"))]
fn action_command(action: PowerAction) -> Result<(&'static str, Vec<String>), PowerError> {
    let (program, args): (&str, &[&str]) = match action {
        PowerAction::Shutdown => ("systemctl", &["poweroff"]),
        PowerAction::Restart => ("systemctl", &["reboot"]),
        PowerAction::Sleep => ("systemctl", &["suspend"]),
        PowerAction::Hibernate => ("systemctl", &["hibernate"]),
        PowerAction::Lock => ("loginctl", &["lock-session"]),
        PowerAction::SignOut => return Err(PowerError::Unsupported("sign-out")),
    };
    Ok((program, args.iter().map(|s| s.to_string()).collect()))
}

#[cfg(target_os = "windows")]
fn schedule_command(delay: Duration) -> (&'static str, Vec<String>) {
    (
        "shutdown",
        vec![
            "/s".to_string(),
            "/f".to_string(),
            "/t".to_string(),
            delay.as_secs().to_string(),
        ],
    )
}

#[cfg(not(target_os = "windows"))]
fn schedule_command(delay: Duration) -> (&'static str, Vec<String>) {
    // `shutdown` accepts whole minutes only; round up so the delay is never cut short.
    let minutes = (delay.as_secs() + 59) / 60;
    ("shutdown", vec!["-h".to_string(), format!("+{}", minutes.max(1))])
}

#[cfg(target_os = "windows")]
fn cancel_command() -> (&'static str, Vec<String>) {
    ("shutdown", vec!["/a".to_string()])
}

#[cfg(not(target_os = "windows"))]
fn cancel_command() -> (&'static str, Vec<String>) {
    ("shutdown", vec!["-c".to_string()])
}

fn run_checked(program: &str, args: &[String]) -> Result<(), PowerError> {
    let command = format!("{} {}", program, args.join(" "));
    info!(%command, "выполняем команду управления питанием");

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| PowerError::Spawn {
            command: command.clone(),
            source,
        })?;
    if !status.success() {
        return Err(PowerError::Failed { command, status });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "windows")]
    #[test]
    fn windows_actions_map_to_shutdown_and_rundll32() {
        let (program, args) = action_command(PowerAction::Shutdown).expect("команда должна быть");
        assert_eq!(program, "shutdown");
        assert_eq!(args, vec!["/s", "/f", "/t", "0"]);

        let (program, args) = action_command(PowerAction::Lock).expect("команда должна быть");
        assert_eq!(program, "rundll32.exe");
        assert_eq!(args, vec!["user32.dll,LockWorkStation"]);
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn windows_schedule_passes_seconds() {
        let (program, args) = schedule_command(Duration::from_secs(90));
        assert_eq!(program, "shutdown");
        assert_eq!(args, vec!["/s", "/f", "/t", "90"]);
        assert_eq!(cancel_command().1, vec!["/a"]);
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn unix_actions_map_to_systemctl() {
        let (program, args) = action_command(PowerAction::Restart).expect("команда должна быть");
        assert_eq!(program, "systemctl");
        assert_eq!(args, vec!["reboot"]);

        assert!(matches!(
            action_command(PowerAction::SignOut),
            Err(PowerError::Unsupported(_))
        ));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn unix_schedule_rounds_up_to_minutes() {
        assert_eq!(schedule_command(Duration::from_secs(90)).1, vec!["-h", "+2"]);
        assert_eq!(schedule_command(Duration::from_secs(30)).1, vec!["-h", "+1"]);
        assert_eq!(cancel_command().1, vec!["-c"]);
    }
}
