use clap::ValueEnum;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SystemTool {
    TaskManager,
    DeviceManager,
    ControlPanel,
    SystemInfo,
    DiskManagement,
    Services,
    RegistryEditor,
    EventViewer,
    FileExplorer,
    NetworkConnections,
    CommandPrompt,
    PowerShell,
}

impl SystemTool {
    // Plain executables spawn directly; .msc/.cpl go through `cmd /C start`.
    fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            SystemTool::TaskManager => ("taskmgr", &[]),
            SystemTool::DeviceManager => ("cmd", &["/C", "start", "", "devmgmt.msc"]),
            SystemTool::ControlPanel => ("control", &[]),
            SystemTool::SystemInfo => ("msinfo32", &[]),
            SystemTool::DiskManagement => ("cmd", &["/C", "start", "", "diskmgmt.msc"]),
            SystemTool::Services => ("cmd", &["/C", "start", "", "services.msc"]),
            SystemTool::RegistryEditor => ("regedit", &[]),
            SystemTool::EventViewer => ("cmd", &["/C", "start", "", "eventvwr.msc"]),
            SystemTool::FileExplorer => ("explorer", &[]),
            SystemTool::NetworkConnections => ("cmd", &["/C", "start", "", "ncpa.cpl"]),
            SystemTool::CommandPrompt => (
                "powershell",
                &["-NoProfile", "-Command", "Start-Process cmd -Verb RunAs"],
            ),
            SystemTool::PowerShell => (
                "powershell",
                &["-NoProfile", "-Command", "Start-Process powershell -Verb RunAs"],
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolsError {
    #[error("не удалось запустить {tool:?}: {source}")]
    Spawn {
        tool: SystemTool,
        #[source]
        source: std::io::Error,
    },
    #[error("системные утилиты доступны только в Windows")]
    Unsupported,
}

#[cfg(target_os = "windows")]
pub fn launch(tool: SystemTool) -> Result<(), ToolsError> {
    let (program, args) = tool.command();
    info!(?tool, %program, "запускаем системную утилиту");
    std::process::Command::new(program)
        .args(args)
        .spawn()
        .map_err(|source| ToolsError::Spawn { tool, source })?;
    Ok(())
}

#[cfg(not(target_os = "windows"))]
pub fn launch(tool: SystemTool) -> Result<(), ToolsError> {
    let (program, _) = tool.command();
    info!(?tool, %program, "запуск системных утилит доступен только в Windows");
    Err(ToolsError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_has_a_program() {
        for tool in [
            SystemTool::TaskManager,
            SystemTool::DeviceManager,
            SystemTool::ControlPanel,
            SystemTool::SystemInfo,
            SystemTool::DiskManagement,
            SystemTool::Services,
            SystemTool::RegistryEditor,
            SystemTool::EventViewer,
            SystemTool::FileExplorer,
            SystemTool::NetworkConnections,
            SystemTool::CommandPrompt,
            SystemTool::PowerShell,
        ] {
            let (program, _) = tool.command();
            assert!(!program.is_empty());
        }
    }

    #[test]
    fn management_consoles_go_through_cmd_start() {
        let (program, args) = SystemTool::Services.command();
        assert_eq!(program, "cmd");
        assert_eq!(args, ["/C", "start", "", "services.msc"]);

        let (program, args) = SystemTool::TaskManager.command();
        assert_eq!(program, "taskmgr");
        assert!(args.is_empty());
    }
}
