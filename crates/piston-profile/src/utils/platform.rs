use serde::{Deserialize, Serialize};

/// Operating systems a library rule or native classifier can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Windows,
    #[serde(rename = "osx")]
    MacOS,
    Linux,
    Other,
}

impl OsType {
    /// Detect the current OS
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsType::Windows
        } else if cfg!(target_os = "macos") {
            OsType::MacOS
        } else if cfg!(target_os = "linux") {
            OsType::Linux
        } else {
            OsType::Other
        }
    }

    /// Get the OS name as a string (for rule matching)
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "windows",
            OsType::MacOS => "osx",
            OsType::Linux => "linux",
            OsType::Other => "other",
        }
    }

    /// Parse an OS name as written in patch documents. Unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "windows" => OsType::Windows,
            "osx" | "macos" => OsType::MacOS,
            "linux" => OsType::Linux,
            _ => OsType::Other,
        }
    }
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder native classifiers use for the pointer width.
pub const ARCH_PLACEHOLDER: &str = "${arch}";

/// Every value `${arch}` expands to when fetching natives.
pub const ARCH_BITS: [&str; 2] = ["32", "64"];

/// Expand `${arch}` into one string per supported pointer width.
/// Strings without the placeholder come back unchanged as a single entry.
pub fn expand_arch(raw: &str) -> Vec<String> {
    if raw.contains(ARCH_PLACEHOLDER) {
        ARCH_BITS
            .iter()
            .map(|bits| raw.replace(ARCH_PLACEHOLDER, bits))
            .collect()
    } else {
        vec![raw.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_names() {
        assert_eq!(OsType::from_name("windows"), OsType::Windows);
        assert_eq!(OsType::from_name("osx"), OsType::MacOS);
        assert_eq!(OsType::from_name("linux"), OsType::Linux);
        assert_eq!(OsType::from_name("solaris"), OsType::Other);
        assert_eq!(OsType::MacOS.as_str(), "osx");
    }

    #[test]
    fn test_expand_arch() {
        assert_eq!(
            expand_arch("natives-windows-${arch}"),
            vec!["natives-windows-32", "natives-windows-64"]
        );
        assert_eq!(expand_arch("natives-linux"), vec!["natives-linux"]);
    }
}
