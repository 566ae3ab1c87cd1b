// =============================================================================
// MSVM BUILDER LIBRARY - tools/msvm-builder/src/lib.rs
// Build orchestration for the Hyper-V UEFI firmware
// =============================================================================

//! Build orchestration for the Hyper-V UEFI firmware (MsvmPkg)
//!
//! The heavy lifting (dependency resolution, compilation, packaging) belongs to
//! the external edk2 build invocables. This crate declares the platform
//! settings they need, dispatches to them, and runs the post-build plugins once
//! a build has finished.

use anyhow::{Context, Result as AnyhowResult};
use log::{debug, error, info};

use crate::config::PlatformSettings;
use crate::environment::BuildEnvironment;
use crate::invocables::{Invocable, InvocableCommand};
use crate::platform::SettingsProvider;
use crate::plugins::{BuildContext, PluginManager};

pub use crate::config::{InvocableConfiguration, MapFilesConfiguration, PlatformConfiguration};
pub use crate::environment::EnvironmentLookup;
pub use crate::platform::{MsvmPlatform, RequiredSubmodule};
pub use crate::plugins::{
    flatten, CopyFailurePolicy, FlattenMapFiles, MapFileFlattener, PostBuildPlugin,
};

pub use shared::types::error::{FlattenError, InvocableError, SettingsError};
pub use shared::types::hardware::{BuildArchitecture, BuildTarget};

pub mod config;
pub mod environment;
pub mod invocables;
pub mod platform;
pub mod plugins;

/// Drives one invocation of the external build tooling for a platform
pub struct PlatformBuilder<P: SettingsProvider> {
    provider: P,
    commands: InvocableConfiguration,
}

impl<P: SettingsProvider> PlatformBuilder<P> {
    pub fn new(provider: P, commands: InvocableConfiguration) -> Self {
        Self { provider, commands }
    }

    /// Run `invocable` with the forwarded arguments and return its exit status
    ///
    /// Builds additionally resolve the platform settings up front and, when the
    /// build succeeds, run the post-build plugins.
    pub async fn invoke(&self, invocable: Invocable, forwarded: Vec<String>) -> AnyhowResult<i32> {
        let overrides = BuildEnvironment::from_assignments(&forwarded);

        let settings = match invocable {
            Invocable::Build => Some(
                self.provider
                    .platform_settings(&overrides)
                    .context("Failed to resolve platform settings")?,
            ),
            Invocable::Setup | Invocable::Update => None,
        };

        if let Some(settings) = &settings {
            log_settings(settings);
            let status = self.provider.pre_build();
            if status != 0 {
                error!("Platform pre-build step returned {}", status);
                return Ok(status);
            }
        }

        let command = InvocableCommand::new(
            invocable,
            &self.commands,
            &self.provider.settings_file(),
            &forwarded,
        );
        info!("Running {}", command.display());

        let status = command
            .run(self.provider.workspace_root())
            .await
            .with_context(|| format!("Failed to run {}", invocable.name()))?;

        let settings = match settings {
            Some(settings) if status == 0 => settings,
            _ => {
                if status != 0 {
                    error!("{} exited with status {}", invocable.name(), status);
                }
                return Ok(status);
            }
        };

        let status = run_post_build_plugins(&settings, overrides).await?;
        if status != 0 {
            return Ok(status);
        }

        Ok(self.provider.post_build())
    }
}

/// Run the default post-build plugins off the async runtime
pub async fn run_post_build_plugins(
    settings: &PlatformSettings,
    overrides: BuildEnvironment,
) -> AnyhowResult<i32> {
    let manager = PluginManager::with_defaults(settings);
    let context = BuildContext::new(BuildEnvironment::from_settings(settings).merged(&overrides));
    debug!("Post-build plugins: {:?}", manager.plugin_names());

    tokio::task::spawn_blocking(move || manager.run_post_build(&context))
        .await
        .context("Post-build plugin task panicked")?
}

fn log_settings(settings: &PlatformSettings) {
    info!("Building {} for {} {}", settings.product_name, settings.architecture, settings.target);
    debug!("  Active platform: {}", settings.active_platform);
    debug!("  Tool chain: {}", settings.tool_chain_tag);
    debug!("  Build output: {}", settings.build_output_base.display());
}
