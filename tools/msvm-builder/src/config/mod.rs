// =============================================================================
// BUILD CONFIGURATION MODULE - tools/msvm-builder/src/config/mod.rs
// =============================================================================

//! Platform configuration for the MsvmPkg firmware build
//!
//! [`PlatformConfiguration`] is the optional, partially filled TOML file a
//! developer can hand to the builder. [`PlatformSettings`] is the fully
//! resolved, immutable result the rest of the tool works from; it is produced
//! by a [`SettingsProvider`](crate::platform::SettingsProvider).

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use shared::types::error::SettingsError;
use shared::types::hardware::{BuildArchitecture, BuildTarget};

use crate::plugins::flatten_map_files::CopyFailurePolicy;

/// On-disk platform configuration; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfiguration {
    pub workspace_root: Option<PathBuf>,
    /// Settings file handed to the invocables with `-c`, relative to the workspace
    pub settings_file: Option<PathBuf>,
    pub product_name: Option<String>,
    pub tool_chain_tag: Option<String>,
    pub build_unit_tests: Option<bool>,
    pub build_apps: Option<bool>,
    pub build_id_string: Option<String>,
    /// Output directory relative to the workspace, before `<TARGET>_<TOOLCHAIN>`
    pub output_directory: Option<PathBuf>,
    pub launch_log: Option<LaunchLogSettings>,
    pub map_files: MapFilesConfiguration,
    pub invocables: InvocableConfiguration,
}

/// Map file flattening options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapFilesConfiguration {
    /// Lowercase substrings; matching map files are not copied
    pub ignore_patterns: Vec<String>,
    pub copy_failure_policy: CopyFailurePolicy,
}

/// Command lines used for the external invocables
///
/// Each entry is a program followed by leading arguments; the builder appends
/// `-c <settings_file>` and the forwarded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvocableConfiguration {
    pub setup: Vec<String>,
    pub update: Vec<String>,
    pub build: Vec<String>,
}

impl Default for InvocableConfiguration {
    fn default() -> Self {
        Self {
            setup: vec!["stuart_setup".to_string()],
            update: vec!["stuart_update".to_string()],
            build: vec!["stuart_build".to_string()],
        }
    }
}

/// Build log viewer behaviour handed through to the build framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchLogSettings {
    pub program: String,
    pub on_success: bool,
    pub on_error: bool,
}

impl Default for LaunchLogSettings {
    fn default() -> Self {
        Self {
            program: "Notepad".to_string(),
            on_success: true,
            on_error: true,
        }
    }
}

/// Fully resolved settings for one build invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSettings {
    pub workspace_root: PathBuf,
    pub product_name: String,
    pub tool_chain_tag: String,
    pub build_unit_tests: bool,
    pub build_apps: bool,
    pub pe_validation_path: PathBuf,
    pub architecture: BuildArchitecture,
    /// Platform descriptor (DSC) path, workspace relative
    pub active_platform: String,
    pub target: BuildTarget,
    pub build_id_string: String,
    pub launch_log: LaunchLogSettings,
    pub output_directory: PathBuf,
    pub build_output_base: PathBuf,
    pub map_files: MapFilesConfiguration,
}

impl PlatformConfiguration {
    /// Load a TOML platform configuration file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        debug!("Loading platform configuration from {}", path.display());

        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&raw).map_err(|message| SettingsError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = PlatformConfiguration::parse("").unwrap();
        assert_eq!(config, PlatformConfiguration::default());
        assert_eq!(config.invocables.build, vec!["stuart_build".to_string()]);
        assert_eq!(config.map_files.copy_failure_policy, CopyFailurePolicy::Abort);
    }

    #[test]
    fn map_file_options_parse() {
        let config = PlatformConfiguration::parse(
            r#"
            tool_chain_tag = "CLANGPDB"

            [map_files]
            ignore_patterns = ["shell", "y.log"]
            copy_failure_policy = "skip"

            [invocables]
            build = ["python", "-m", "edk2toolext.invocables.edk2_platform_build"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tool_chain_tag.as_deref(), Some("CLANGPDB"));
        assert_eq!(config.map_files.ignore_patterns, vec!["shell", "y.log"]);
        assert_eq!(config.map_files.copy_failure_policy, CopyFailurePolicy::Skip);
        assert_eq!(config.invocables.build.len(), 3);
        assert_eq!(config.invocables.setup, vec!["stuart_setup".to_string()]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PlatformConfiguration::parse("toolchain = \"VS2022\"").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let missing = tmp.path().join("platform.toml");

        match PlatformConfiguration::load(&missing) {
            Err(SettingsError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn load_reads_file_from_disk() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("platform.toml");
        fs::write(&path, "product_name = \"Hyper-V Test\"\n").expect("write config");

        let config = PlatformConfiguration::load(&path).expect("load config");
        assert_eq!(config.product_name.as_deref(), Some("Hyper-V Test"));
    }
}
