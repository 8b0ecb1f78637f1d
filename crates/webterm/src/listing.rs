//! Directory listing (ls, dir)
//!
//! Listings always cover the session's working directory. The long format is
//! deliberately simpler than coreutils: permissions are three characters
//! describing what this process can do with the entry, and `total` counts
//! entries rather than disk blocks.

use chrono::{DateTime, Local};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

const ICON_DIRECTORY: &str = "📁";
const ICON_SYMLINK: &str = "🔗";
const ICON_EXECUTABLE: &str = "⚙️";
const ICON_FILE: &str = "📄";

/// File icons by lower-case extension.
const EXTENSION_ICONS: &[(&str, &str)] = &[
    ("php", "🐘"),
    ("js", "🟨"),
    ("html", "🌐"),
    ("css", "🎨"),
    ("json", "📋"),
    ("xml", "📰"),
    ("md", "📝"),
    ("txt", "📄"),
    ("jpg", "🖼️"),
    ("png", "🖼️"),
    ("gif", "🎞️"),
    ("svg", "✨"),
    ("mp3", "🎵"),
    ("mp4", "🎬"),
    ("zip", "📦"),
    ("tar", "📦"),
    ("pdf", "📕"),
    ("doc", "📘"),
    ("xls", "📊"),
];

/// Options for ls/dir
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFlags {
    /// Include names starting with `.`
    pub all: bool,
    /// Long format with permissions, size and modification time
    pub long: bool,
}

impl ListFlags {
    /// Collect flags from `ls`/`dir` arguments.
    ///
    /// `-la`, `-a -l` and the DOS forms `/a`, `/l` are understood; any other
    /// argument is ignored.
    pub fn parse<'a>(args: impl IntoIterator<Item = &'a str>) -> Self {
        let mut flags = ListFlags::default();
        for arg in args {
            if let Some(letters) = arg.strip_prefix('-') {
                for c in letters.chars() {
                    match c {
                        'a' => flags.all = true,
                        'l' => flags.long = true,
                        _ => {}
                    }
                }
            } else {
                match arg.to_ascii_lowercase().as_str() {
                    "/a" => flags.all = true,
                    "/l" => flags.long = true,
                    _ => {}
                }
            }
        }
        flags
    }
}

/// Lists a directory as display lines.
#[derive(Debug, Clone, Default)]
pub struct DirectoryLister;

impl DirectoryLister {
    pub fn new() -> Self {
        Self
    }

    /// List `cwd`, including the `.` and `..` entries when `flags.all` is set.
    pub async fn list(&self, cwd: &Path, flags: ListFlags) -> Result<Vec<String>> {
        let cwd = cwd.to_path_buf();
        tokio::task::spawn_blocking(move || list_blocking(&cwd, flags))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}

fn list_blocking(cwd: &Path, flags: ListFlags) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(cwd)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut all_names = Vec::with_capacity(names.len() + 2);
    all_names.push(".".to_string());
    all_names.push("..".to_string());
    all_names.extend(names);

    let mut lines = Vec::new();
    if flags.long {
        lines.push(format!("total {}", all_names.len()));
    }

    for name in &all_names {
        if !flags.all && name.starts_with('.') {
            continue;
        }

        let entry = EntryInfo::inspect(cwd.join(name));
        let icon = entry.icon(name);
        if flags.long {
            lines.push(format!(
                "{} {} {} {} {}",
                entry.permissions(),
                human_size(entry.size),
                format_mtime(entry.modified),
                icon,
                name
            ));
        } else {
            lines.push(format!("{} {}", icon, name));
        }
    }

    Ok(lines)
}

/// What the listing needs to know about one entry.
struct EntryInfo {
    path: PathBuf,
    /// Metadata following symlinks, if the target exists
    target: Option<Metadata>,
    is_symlink: bool,
    size: u64,
    modified: SystemTime,
}

impl EntryInfo {
    fn inspect(path: PathBuf) -> Self {
        let link = fs::symlink_metadata(&path).ok();
        let target = fs::metadata(&path).ok();
        let is_symlink = link.as_ref().is_some_and(|m| m.file_type().is_symlink());

        let best = target.as_ref().or(link.as_ref());
        let size = best.map(|m| m.len()).unwrap_or(0);
        let modified = best
            .and_then(|m| m.modified().ok())
            .unwrap_or(UNIX_EPOCH);

        Self {
            path,
            target,
            is_symlink,
            size,
            modified,
        }
    }

    fn is_dir(&self) -> bool {
        self.target.as_ref().is_some_and(|m| m.is_dir())
    }

    fn icon(&self, name: &str) -> &'static str {
        if self.is_dir() {
            return ICON_DIRECTORY;
        }
        if self.is_symlink {
            return ICON_SYMLINK;
        }
        if self.is_executable() {
            return ICON_EXECUTABLE;
        }
        extension_icon(name)
    }

    /// `rwx` triplet for this process; no owner/group/other breakdown.
    fn permissions(&self) -> String {
        [
            (self.is_readable(), 'r'),
            (self.is_writable(), 'w'),
            (self.is_executable(), 'x'),
        ]
        .iter()
        .map(|(allowed, c)| if *allowed { *c } else { '-' })
        .collect()
    }

    fn is_readable(&self) -> bool {
        self.target.is_some() && process_can(&self.path, Access::Read)
    }

    fn is_writable(&self) -> bool {
        self.target.is_some() && process_can(&self.path, Access::Write)
    }

    fn is_executable(&self) -> bool {
        self.target.is_some() && process_can(&self.path, Access::Execute)
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
    Execute,
}

/// Ask the kernel whether this process may access `path` (symlinks followed).
#[cfg(unix)]
fn process_can(path: &Path, access: Access) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let mode = match access {
        Access::Read => libc::R_OK,
        Access::Write => libc::W_OK,
        Access::Execute => libc::X_OK,
    };
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

#[cfg(not(unix))]
fn process_can(path: &Path, access: Access) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    match access {
        Access::Read if metadata.is_dir() => fs::read_dir(path).is_ok(),
        Access::Read => fs::File::open(path).is_ok(),
        Access::Write => !metadata.permissions().readonly(),
        Access::Execute if metadata.is_dir() => true,
        Access::Execute => path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "exe" | "bat" | "cmd" | "com"))
            .unwrap_or(false),
    }
}

fn extension_icon(name: &str) -> &'static str {
    let ext = match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return ICON_FILE,
    };
    EXTENSION_ICONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, icon)| *icon)
        .unwrap_or(ICON_FILE)
}

/// Binary-scaled size with one decimal, e.g. `512B`, `1.5KB`, `2GB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1}{}", rounded, UNITS[unit])
    }
}

fn format_mtime(modified: SystemTime) -> String {
    let local: DateTime<Local> = modified.into();
    local.format("%b %d %H:%M").to_string()
}
