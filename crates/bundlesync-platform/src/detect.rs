use serde::{Deserialize, Serialize};

/// Release channel name of the host OS.
pub fn platform_key() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "darwin"
    }
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "win"
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "unsupported"
    }
}

/// Release channel name of the host word size.
/// Windows builds are only published as 32-bit.
pub fn arch_key() -> &'static str {
    if cfg!(target_pointer_width = "64") && !cfg!(windows) {
        "64bit"
    } else {
        "32bit"
    }
}

/// Suffix of the bundle executable.
pub fn exe_extension() -> &'static str {
    if cfg!(windows) {
        ".exe"
    } else {
        ".bin"
    }
}

pub fn is_supported() -> bool {
    platform_key() != "unsupported"
}

/// A `<platform>/<arch>` pair addressing one slice of the release channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub platform: String,
    pub arch: String,
}

impl Target {
    pub fn new(platform: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            arch: arch.into(),
        }
    }

    /// The host target.
    pub fn current() -> Self {
        Self::new(platform_key(), arch_key())
    }

    /// `"<platform>/<arch>"`
    pub fn relative_dir(&self) -> String {
        format!("{}/{}", self.platform, self.arch)
    }

    pub fn is_supported(&self) -> bool {
        self.platform != "unsupported"
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::current()
    }
}
