// =============================================================================
// INVOCABLE DISPATCH MODULE - tools/msvm-builder/src/invocables/mod.rs
// =============================================================================

//! Launching the external setup, update and build invocables

use log::debug;
use std::path::Path;
use tokio::process::Command;

use shared::types::error::InvocableError;

use crate::config::InvocableConfiguration;

/// Which external invocable to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocable {
    Setup,
    Update,
    Build,
}

impl Invocable {
    /// Resolve the mutually exclusive `--setup` / `--update` flags
    pub fn from_flags(setup: bool, update: bool) -> Self {
        match (setup, update) {
            (true, _) => Invocable::Setup,
            (false, true) => Invocable::Update,
            (false, false) => Invocable::Build,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Invocable::Setup => "stuart_setup",
            Invocable::Update => "stuart_update",
            Invocable::Build => "stuart_build",
        }
    }
}

/// Fully expanded command line for one invocable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocableCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InvocableCommand {
    /// `<configured command> -c <settings_file> <forwarded...>`
    pub fn new(
        invocable: Invocable,
        commands: &InvocableConfiguration,
        settings_file: &Path,
        forwarded: &[String],
    ) -> Self {
        let configured = match invocable {
            Invocable::Setup => &commands.setup,
            Invocable::Update => &commands.update,
            Invocable::Build => &commands.build,
        };

        let (program, leading) = match configured.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (invocable.name().to_string(), Vec::new()),
        };

        let mut args = leading;
        args.push("-c".to_string());
        args.push(settings_file.display().to_string());
        args.extend(forwarded.iter().cloned());

        Self { program, args }
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion in `working_dir` and return the exit code
    pub async fn run(&self, working_dir: &Path) -> Result<i32, InvocableError> {
        debug!("Launching {} in {}", self.display(), working_dir.display());

        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(working_dir)
            .status()
            .await
            .map_err(|source| InvocableError::Launch {
                program: self.program.clone(),
                source,
            })?;

        status.code().ok_or_else(|| InvocableError::Terminated {
            program: self.program.clone(),
        })
    }
}
