// =============================================================================
// POST-BUILD PLUGIN MODULE - tools/msvm-builder/src/plugins/mod.rs
// =============================================================================

//! Post-build plugin contract and runner
//!
//! Plugins run once per successful build, after compilation and before any
//! packaging. Each returns a status code: `0` lets the pipeline continue,
//! anything else stops it. An `Err` is an unhandled failure and aborts the
//! build step as well.

use anyhow::Result as AnyhowResult;
use log::{error, info};

use crate::config::PlatformSettings;
use crate::environment::BuildEnvironment;

pub use self::flatten_map_files::{
    flatten, CopyFailurePolicy, FlattenMapFiles, FlattenSummary, MapFileFlattener,
    MAP_DIRECTORY_NAME,
};

pub mod flatten_map_files;

/// Everything a post-build plugin can see of the finished build
#[derive(Debug, Clone)]
pub struct BuildContext {
    env: BuildEnvironment,
}

impl BuildContext {
    pub fn new(env: BuildEnvironment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &BuildEnvironment {
        &self.env
    }
}

/// Hook invoked by the build pipeline after compilation
pub trait PostBuildPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn do_post_build(&self, context: &BuildContext) -> AnyhowResult<i32>;
}

/// Ordered set of post-build plugins
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn PostBuildPlugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugins every MsvmPkg build runs
    pub fn with_defaults(settings: &PlatformSettings) -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(FlattenMapFiles::new(
            MapFileFlattener::new(settings.map_files.ignore_patterns.iter())
                .with_copy_failure_policy(settings.map_files.copy_failure_policy),
        )));
        manager
    }

    pub fn register(&mut self, plugin: Box<dyn PostBuildPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Run every plugin in registration order, stopping at the first failure
    pub fn run_post_build(&self, context: &BuildContext) -> AnyhowResult<i32> {
        for plugin in &self.plugins {
            info!("Running post-build plugin {}", plugin.name());

            let status = plugin
                .do_post_build(context)
                .map_err(|e| e.context(format!("post-build plugin {} failed", plugin.name())))?;

            if status != 0 {
                error!("Post-build plugin {} returned {}", plugin.name(), status);
                return Ok(status);
            }
        }
        Ok(0)
    }
}
