//! Host platform detection.
//!
//! The platform is classified once at startup and the result is threaded to
//! everything that needs a shell dialect: the executor (which shell binary to
//! spawn through) and the translator (which dialect name to put in the
//! prompt).

/// Operating system category the wrapper is running on.
///
/// `Unknown` platforms execute through Bash like Linux but have no concrete
/// dialect name to give the AI prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    Windows,
    Linux,
    MacOS,
    Unknown,
}

impl PlatformKind {
    /// Detects the host platform. Pure function of the build target,
    /// intended to be called once at startup.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            PlatformKind::Windows
        } else if cfg!(target_os = "linux") {
            PlatformKind::Linux
        } else if cfg!(target_os = "macos") {
            PlatformKind::MacOS
        } else {
            PlatformKind::Unknown
        }
    }

    /// Shell dialect name used in the translation prompt.
    pub fn dialect_name(&self) -> &'static str {
        match self {
            PlatformKind::Windows => "Windows CMD",
            PlatformKind::Linux => "Linux Bash",
            PlatformKind::MacOS => "macOS Bash",
            PlatformKind::Unknown => "shell",
        }
    }

    /// Shell program and its "run this string" flag for the platform.
    pub fn shell_invocation(&self) -> (&'static str, &'static str) {
        match self {
            PlatformKind::Windows => ("cmd", "/C"),
            // Unknown falls back to Bash-style execution.
            _ => ("/bin/bash", "-c"),
        }
    }
}
