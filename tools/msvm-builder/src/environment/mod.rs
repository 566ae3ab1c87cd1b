// =============================================================================
// BUILD ENVIRONMENT MODULE - tools/msvm-builder/src/environment/mod.rs
// =============================================================================

//! Read-only key/value build environment
//!
//! The external build framework passes settings around as string keys. This
//! module keeps that surface for plugins while the platform itself works with
//! the typed [`PlatformSettings`](crate::config::PlatformSettings).

use std::collections::BTreeMap;

use crate::config::PlatformSettings;

/// Root directory of all artifacts for the current build
pub const BUILD_OUTPUT_BASE: &str = "BUILD_OUTPUT_BASE";
/// Architecture requested on the command line (`BUILD_ARCH=AARCH64`)
pub const BUILD_ARCH: &str = "BUILD_ARCH";
pub const TARGET: &str = "TARGET";
pub const TOOL_CHAIN_TAG: &str = "TOOL_CHAIN_TAG";

/// Lookup capability handed to plugins
pub trait EnvironmentLookup {
    fn get_value(&self, key: &str) -> Option<&str>;
}

/// Ordered key/value environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    values: BTreeMap<String, String>,
}

impl BuildEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `KEY=VALUE` assignments from forwarded command-line arguments
    ///
    /// Flags and bare words are ignored; they still reach the invocable.
    pub fn from_assignments<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Self::new();
        for arg in args {
            if let Some((key, value)) = parse_assignment(arg.as_ref()) {
                env.values.insert(key.to_string(), value.to_string());
            }
        }
        env
    }

    /// Render typed platform settings into the keys the build framework reads
    pub fn from_settings(settings: &PlatformSettings) -> Self {
        let mut env = Self::new();
        let bool_flag = |b: bool| if b { "TRUE" } else { "FALSE" };

        env.insert("PRODUCT_NAME", &settings.product_name);
        env.insert(TOOL_CHAIN_TAG, &settings.tool_chain_tag);
        env.insert("BLD_*_BUILD_UNIT_TESTS", bool_flag(settings.build_unit_tests));
        env.insert("BLD_*_BUILD_APPS", bool_flag(settings.build_apps));
        env.insert("PE_VALIDATION_PATH", &settings.pe_validation_path.display().to_string());
        env.insert("ACTIVE_PLATFORM", &settings.active_platform);
        env.insert("TARGET_ARCH", settings.architecture.as_str());
        env.insert("ARCH", settings.architecture.as_str());
        env.insert(TARGET, settings.target.as_str());
        env.insert("BLD_*_BUILDID_STRING", &settings.build_id_string);
        env.insert("LaunchBuildLogProgram", &settings.launch_log.program);
        env.insert("LaunchLogOnSuccess", python_bool(settings.launch_log.on_success));
        env.insert("LaunchLogOnError", python_bool(settings.launch_log.on_error));
        env.insert(BUILD_OUTPUT_BASE, &settings.build_output_base.display().to_string());
        env
    }

    /// Layer `other` on top of `self`; keys present in both take `other`'s value
    pub fn merged(mut self, other: &BuildEnvironment) -> Self {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl EnvironmentLookup for BuildEnvironment {
    fn get_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Launch-log flags are read back as Python-style booleans
fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Split `KEY=VALUE`, rejecting flags and empty keys
pub fn parse_assignment(arg: &str) -> Option<(&str, &str)> {
    if arg.starts_with('-') {
        return None;
    }
    let (key, value) = arg.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_skip_flags_and_bare_words() {
        let env = BuildEnvironment::from_assignments([
            "BUILD_ARCH=AARCH64",
            "--clean",
            "--option=value",
            "=orphan",
            "TARGET= RELEASE",
            "PlatformBuild.py",
        ]);

        assert_eq!(env.iter().count(), 2);
        assert_eq!(env.get_value(BUILD_ARCH), Some("AARCH64"));
        assert_eq!(env.get_value(TARGET), Some("RELEASE"));
        assert_eq!(env.get_value("--option"), None);
    }

    #[test]
    fn values_may_contain_equals_signs() {
        assert_eq!(parse_assignment("BLD_*_FLAGS=-DX=1"), Some(("BLD_*_FLAGS", "-DX=1")));
    }

    #[test]
    fn merge_prefers_the_overlay() {
        let base = BuildEnvironment::from_assignments(["A=1", "B=2"]);
        let overlay = BuildEnvironment::from_assignments(["B=3", "C=4"]);
        let merged = base.merged(&overlay);

        let pairs: Vec<_> = merged.iter().collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "3"), ("C", "4")]);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let env = BuildEnvironment::from_assignments(["target=DEBUG"]);
        assert_eq!(env.get_value(TARGET), None);
        assert_eq!(env.get_value("target"), Some("DEBUG"));
    }
}
