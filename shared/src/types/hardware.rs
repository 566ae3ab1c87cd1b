// =============================================================================
// SHARED/SRC/TYPES/HARDWARE.RS - Build Architecture and Target Types
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::error::SettingsError;

/// Processor architecture a firmware image is built for
///
/// Rendered with the spelling the edk2 build system expects (`X64`,
/// `AARCH64`), which is also the spelling accepted by `BUILD_ARCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildArchitecture {
    #[serde(rename = "X64")]
    X64,
    #[serde(rename = "AARCH64")]
    AArch64,
}

/// Build target (edk2 `TARGET`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildTarget {
    #[serde(rename = "DEBUG")]
    Debug,
    #[serde(rename = "RELEASE")]
    Release,
}

impl BuildArchitecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildArchitecture::X64 => "X64",
            BuildArchitecture::AArch64 => "AARCH64",
        }
    }

    /// Resolve the architecture requested through `BUILD_ARCH`
    ///
    /// Only the exact string `AARCH64` selects the ARM build; anything else,
    /// including `aarch64` or an unset variable, builds X64.
    pub fn from_build_arch(value: Option<&str>) -> Self {
        match value {
            Some("AARCH64") => BuildArchitecture::AArch64,
            _ => BuildArchitecture::X64,
        }
    }
}

impl BuildTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildTarget::Debug => "DEBUG",
            BuildTarget::Release => "RELEASE",
        }
    }
}

impl fmt::Display for BuildArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildArchitecture {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X64" => Ok(BuildArchitecture::X64),
            "AARCH64" => Ok(BuildArchitecture::AArch64),
            _ => Err(SettingsError::UnsupportedArchitecture(s.to_string())),
        }
    }
}

impl FromStr for BuildTarget {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(BuildTarget::Debug),
            "RELEASE" => Ok(BuildTarget::Release),
            _ => Err(SettingsError::UnsupportedTarget(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_arch_defaults_to_x64() {
        assert_eq!(BuildArchitecture::from_build_arch(None), BuildArchitecture::X64);
        assert_eq!(BuildArchitecture::from_build_arch(Some("IA32")), BuildArchitecture::X64);
        assert_eq!(
            BuildArchitecture::from_build_arch(Some("AARCH64")),
            BuildArchitecture::AArch64
        );
    }

    #[test]
    fn build_arch_match_is_exact() {
        assert_eq!(BuildArchitecture::from_build_arch(Some("aarch64")), BuildArchitecture::X64);
        assert_eq!(BuildArchitecture::from_build_arch(Some("AArch64")), BuildArchitecture::X64);
        assert_eq!(BuildArchitecture::from_build_arch(Some(" AARCH64")), BuildArchitecture::X64);
    }

    #[test]
    fn target_parsing_is_case_insensitive() {
        assert_eq!("release".parse::<BuildTarget>().unwrap(), BuildTarget::Release);
        assert!(matches!(
            "NOOPT".parse::<BuildTarget>(),
            Err(SettingsError::UnsupportedTarget(t)) if t == "NOOPT"
        ));
    }

    #[test]
    fn display_uses_edk2_spelling() {
        assert_eq!(BuildArchitecture::AArch64.to_string(), "AARCH64");
        assert_eq!(BuildTarget::Debug.to_string(), "DEBUG");
    }
}
