// =============================================================================
// MSVM BUILDER MAIN - tools/msvm-builder/src/main.rs
// Command-line entry point for the Hyper-V UEFI firmware build
// =============================================================================

//! Dispatches to `stuart_setup`, `stuart_update` or `stuart_build` and runs
//! the post-build plugins after a successful build. Every argument the
//! builder does not recognise is forwarded to the invocable unchanged.

use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use env_logger::Builder as LogBuilder;
use log::{info, LevelFilter};
use std::env;
use std::path::PathBuf;
use std::process;

use msvm_builder::invocables::Invocable;
use msvm_builder::{MsvmPlatform, PlatformBuilder, PlatformConfiguration};

const DISPATCH_FLAGS: [&str; 4] = ["--setup", "--SETUP", "--update", "--UPDATE"];
const PLATFORM_CONFIG_FLAG: &str = "--platform-config";
const PLATFORM_CONFIG_ASSIGN: &str = "--platform-config=";

/// Command-line arguments for the MsvmPkg builder
#[derive(Parser, Debug)]
#[command(name = "msvm-builder")]
#[command(about = "Hyper-V UEFI firmware build entry point")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_help_flag = true, args_override_self = true)]
struct BuilderArgs {
    /// Invoke stuart_update
    #[arg(long, visible_alias = "UPDATE", conflicts_with = "setup")]
    update: bool,

    /// Invoke stuart_setup
    #[arg(long, visible_alias = "SETUP")]
    setup: bool,

    /// TOML platform configuration overriding the MsvmPkg defaults
    #[arg(long, value_name = "FILE")]
    platform_config: Option<PathBuf>,

    /// Arguments forwarded to the invocable, in their original order
    #[arg(skip)]
    forwarded: Vec<String>,
}

impl BuilderArgs {
    /// Parse the builder's own flags wherever they appear in `argv`
    ///
    /// Only the dispatch flags and `--platform-config` reach clap; every other
    /// token is forwarded. Everything from a bare `--` onwards is forwarded
    /// untouched.
    fn parse_split<I, S>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let mut builder_tokens: Vec<String> = argv.next().into_iter().collect();
        let mut forwarded = Vec::new();

        while let Some(token) = argv.next() {
            if token == "--" {
                forwarded.push(token);
                forwarded.extend(argv.by_ref());
                break;
            }

            if DISPATCH_FLAGS.contains(&token.as_str()) {
                builder_tokens.push(token);
            } else if token == PLATFORM_CONFIG_FLAG {
                builder_tokens.push(token);
                builder_tokens.extend(argv.next());
            } else if token.starts_with(PLATFORM_CONFIG_ASSIGN) {
                builder_tokens.push(token);
            } else {
                forwarded.push(token);
            }
        }

        let mut args = Self::try_parse_from(builder_tokens)?;
        args.forwarded = forwarded;
        Ok(args)
    }
}

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let args = BuilderArgs::parse_split(env::args()).unwrap_or_else(|e| e.exit());

    initialize_logging();

    let config = match &args.platform_config {
        Some(path) => PlatformConfiguration::load(path)
            .context("Failed to load platform configuration")?,
        None => PlatformConfiguration::default(),
    };

    let current_dir = env::current_dir().context("Failed to determine current directory")?;
    let commands = config.invocables.clone();
    let builder = PlatformBuilder::new(MsvmPlatform::new(config, current_dir), commands);

    let invocable = Invocable::from_flags(args.setup, args.update);
    info!("Invoking {}", invocable.name());

    let status = builder.invoke(invocable, args.forwarded).await?;
    if status != 0 {
        process::exit(status);
    }
    Ok(())
}

/// Info by default; `RUST_LOG` overrides
fn initialize_logging() {
    LogBuilder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}
