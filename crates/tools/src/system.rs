//! System information tools backed by `sysinfo`.

use chrono::Local;
use jarvis_core::error::{RegistryError, ToolError};
use jarvis_core::session::Session;
use jarvis_core::tool::{FnTool, ToolArgs, ToolRegistry};
use sysinfo::{Disks, System};

const GIB: u64 = 1 << 30;

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    let tools = [
        FnTool::new(
            "get_system_info",
            "Gets basic system information (operating system, host name, kernel, architecture).",
            vec![],
            get_system_info,
        ),
        FnTool::new(
            "get_disk_usage",
            "Gets disk usage information (total, used and free space in GB).",
            vec![],
            get_disk_usage,
        ),
        FnTool::new(
            "get_current_datetime",
            "Gets the current date and time.",
            vec![],
            get_current_datetime,
        ),
    ];
    for tool in tools {
        registry.register(Box::new(tool))?;
    }
    Ok(())
}

fn unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "unknown".to_string())
}

fn get_system_info(_: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(format!(
        "System: {}\nNode: {}\nRelease: {}\nVersion: {}\nMachine: {}",
        unknown(System::name()),
        unknown(System::host_name()),
        unknown(System::kernel_version()),
        unknown(System::long_os_version().or_else(System::os_version)),
        std::env::consts::ARCH,
    ))
}

/// (total, available) bytes for the root filesystem, or for the largest disk
/// when no disk is mounted at `/`.
fn disk_space(disks: &Disks) -> Option<(u64, u64)> {
    let root = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"));
    let disk = root.or_else(|| disks.list().iter().max_by_key(|d| d.total_space()))?;
    Some((disk.total_space(), disk.available_space()))
}

fn get_disk_usage(_: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    let disks = Disks::new_with_refreshed_list();
    let (total, free) = disk_space(&disks).ok_or_else(|| ToolError::ExecutionFailed {
        tool_name: "get_disk_usage".into(),
        reason: "no disks found".into(),
    })?;
    let used = total.saturating_sub(free);
    Ok(format!(
        "Total: {} GB\nUsed: {} GB\nFree: {} GB",
        total / GIB,
        used / GIB,
        free / GIB
    ))
}

fn get_current_datetime(_: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(format!(
        "Current date and time: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ))
}
