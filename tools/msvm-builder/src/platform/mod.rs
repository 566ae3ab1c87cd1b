// =============================================================================
// PLATFORM SETTINGS MODULE - tools/msvm-builder/src/platform/mod.rs
// =============================================================================

//! Settings provider for the Hyper-V UEFI platform
//!
//! The external build framework asks a settings provider a fixed set of
//! questions (scopes, packages path, required submodules, supported
//! architectures and targets) and then lets it populate the build
//! environment. [`SettingsProvider`] captures that contract and
//! [`MsvmPlatform`] answers it for MsvmPkg.

use log::debug;
use std::path::{Path, PathBuf};

use shared::types::error::SettingsError;
use shared::types::hardware::{BuildArchitecture, BuildTarget};

use crate::config::{PlatformConfiguration, PlatformSettings};
use crate::environment::{
    BuildEnvironment, EnvironmentLookup, BUILD_ARCH, BUILD_OUTPUT_BASE, TARGET, TOOL_CHAIN_TAG,
};

const DEFAULT_PRODUCT_NAME: &str = "Hyper-V";
const DEFAULT_TOOL_CHAIN_TAG: &str = "VS2022";
const DEFAULT_BUILD_ID_STRING: &str = "17.1590.800";
const DEFAULT_SETTINGS_FILE: &str = "MsvmPkg/PlatformBuild.py";

const SUBMODULE_PATHS: [&str; 5] = [
    "MU_BASECORE",
    "Common/MU",
    "Common/MU_TIANO",
    "Feature/DEBUGGER",
    "Silicon/ARM/MU_TIANO",
];

/// A git submodule the workspace needs before it can build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSubmodule {
    pub path: String,
    pub recursive: bool,
}

impl RequiredSubmodule {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            recursive: true,
        }
    }
}

/// Questions the build framework asks a platform before building it
pub trait SettingsProvider {
    fn workspace_root(&self) -> &Path;

    fn active_scopes(&self) -> &[&'static str];

    fn packages_supported(&self) -> &[&'static str];

    fn required_submodules(&self) -> Vec<RequiredSubmodule>;

    /// Absolute package search paths
    fn packages_path(&self) -> Vec<PathBuf> {
        self.required_submodules()
            .into_iter()
            .map(|module| self.workspace_root().join(module.path))
            .collect()
    }

    fn architectures_supported(&self) -> &[BuildArchitecture];

    fn targets_supported(&self) -> &[BuildTarget];

    /// Settings file passed to the invocables with `-c`
    fn settings_file(&self) -> PathBuf;

    /// Resolve the typed settings for one build from command-line overrides
    fn platform_settings(
        &self,
        overrides: &BuildEnvironment,
    ) -> Result<PlatformSettings, SettingsError>;

    fn pre_build(&self) -> i32 {
        0
    }

    fn post_build(&self) -> i32 {
        0
    }
}

/// MsvmPkg platform definition
#[derive(Debug, Clone)]
pub struct MsvmPlatform {
    workspace_root: PathBuf,
    config: PlatformConfiguration,
}

impl MsvmPlatform {
    /// Create the platform rooted at the configured workspace, or `default_root`
    pub fn new(config: PlatformConfiguration, default_root: PathBuf) -> Self {
        let workspace_root = config.workspace_root.clone().unwrap_or(default_root);
        Self {
            workspace_root,
            config,
        }
    }

    fn active_platform(architecture: BuildArchitecture) -> &'static str {
        match architecture {
            BuildArchitecture::AArch64 => "MsvmPkg/MsvmPkgAARCH64.dsc",
            BuildArchitecture::X64 => "MsvmPkg/MsvmPkgX64.dsc",
        }
    }

    /// `Build/<dsc stem>` unless configured
    fn output_directory(&self, active_platform: &str) -> PathBuf {
        if let Some(dir) = &self.config.output_directory {
            return dir.clone();
        }
        let stem = Path::new(active_platform)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "MsvmPkg".to_string());
        PathBuf::from("Build").join(stem)
    }
}

impl SettingsProvider for MsvmPlatform {
    fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    fn active_scopes(&self) -> &[&'static str] {
        &["hyperv", "edk2-build"]
    }

    fn packages_supported(&self) -> &[&'static str] {
        &["MsvmPkg"]
    }

    fn required_submodules(&self) -> Vec<RequiredSubmodule> {
        SUBMODULE_PATHS.iter().map(|path| RequiredSubmodule::new(path)).collect()
    }

    fn architectures_supported(&self) -> &[BuildArchitecture] {
        &[BuildArchitecture::AArch64, BuildArchitecture::X64]
    }

    fn targets_supported(&self) -> &[BuildTarget] {
        &[BuildTarget::Debug, BuildTarget::Release]
    }

    fn settings_file(&self) -> PathBuf {
        self.config
            .settings_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    fn platform_settings(
        &self,
        overrides: &BuildEnvironment,
    ) -> Result<PlatformSettings, SettingsError> {
        let architecture = BuildArchitecture::from_build_arch(overrides.get_value(BUILD_ARCH));
        if !self.architectures_supported().contains(&architecture) {
            return Err(SettingsError::UnsupportedArchitecture(architecture.to_string()));
        }
        debug!("PlatformBuilder building {}", architecture);

        let target = match overrides.get_value(TARGET) {
            Some(value) => value.parse::<BuildTarget>()?,
            None => BuildTarget::Debug,
        };
        if !self.targets_supported().contains(&target) {
            return Err(SettingsError::UnsupportedTarget(target.to_string()));
        }

        let tool_chain_tag = overrides
            .get_value(TOOL_CHAIN_TAG)
            .map(str::to_string)
            .or_else(|| self.config.tool_chain_tag.clone())
            .unwrap_or_else(|| DEFAULT_TOOL_CHAIN_TAG.to_string());

        let active_platform = Self::active_platform(architecture);
        let output_directory = self.output_directory(active_platform);

        let build_output_base = match overrides.get_value(BUILD_OUTPUT_BASE) {
            Some(base) => PathBuf::from(base),
            None => self
                .workspace_root
                .join(&output_directory)
                .join(format!("{}_{}", target, tool_chain_tag)),
        };

        Ok(PlatformSettings {
            workspace_root: self.workspace_root.clone(),
            product_name: self
                .config
                .product_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
            tool_chain_tag,
            build_unit_tests: self.config.build_unit_tests.unwrap_or(false),
            build_apps: self.config.build_apps.unwrap_or(false),
            pe_validation_path: self.workspace_root.join("MsvmPkg").join("image_validation.cfg"),
            architecture,
            active_platform: active_platform.to_string(),
            target,
            build_id_string: self
                .config
                .build_id_string
                .clone()
                .unwrap_or_else(|| DEFAULT_BUILD_ID_STRING.to_string()),
            launch_log: self.config.launch_log.clone().unwrap_or_default(),
            output_directory,
            build_output_base,
            map_files: self.config.map_files.clone(),
        })
    }
}
