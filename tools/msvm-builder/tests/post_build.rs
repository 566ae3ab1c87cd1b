// End-to-end: a fake build invocable produces map files and the builder
// flattens them once the build reports success.

#![cfg(unix)]

use std::fs;
use std::path::Path;

use msvm_builder::invocables::Invocable;
use msvm_builder::{
    InvocableConfiguration, MapFilesConfiguration, MsvmPlatform, PlatformBuilder,
    PlatformConfiguration,
};

fn fake_build_script(dir: &Path, body: &str) -> InvocableConfiguration {
    let script = dir.join("fake_stuart_build.sh");
    fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
    InvocableConfiguration {
        build: vec!["sh".to_string(), script.display().to_string()],
        ..Default::default()
    }
}

fn config(workspace: &Path, commands: InvocableConfiguration) -> PlatformConfiguration {
    PlatformConfiguration {
        workspace_root: Some(workspace.to_path_buf()),
        map_files: MapFilesConfiguration {
            ignore_patterns: vec!["shell".to_string()],
            ..Default::default()
        },
        invocables: commands,
        ..Default::default()
    }
}

fn platform_builder(
    workspace: &Path,
    cfg: PlatformConfiguration,
) -> PlatformBuilder<MsvmPlatform> {
    let commands = cfg.invocables.clone();
    PlatformBuilder::new(MsvmPlatform::new(cfg, workspace.to_path_buf()), commands)
}

#[tokio::test]
async fn successful_build_flattens_map_files() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workspace = tmp.path();
    let base = workspace.join("Build/MsvmPkgX64/DEBUG_VS2022");
    let commands = fake_build_script(
        workspace,
        &format!(
            "mkdir -p {base}/X64/Sec {base}/X64/Shell && \
             echo sec > {base}/X64/Sec/SecMain.map && \
             echo shell > {base}/X64/Shell/Shell.map",
            base = base.display()
        ),
    );

    let cfg = config(workspace, commands);
    let builder = platform_builder(workspace, cfg);

    let status = builder
        .invoke(Invocable::Build, vec!["TARGET=DEBUG".to_string()])
        .await
        .expect("invoke build");

    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(base.join("MAP/SecMain.map")).unwrap(), "sec\n");
    assert!(!base.join("MAP/Shell.map").exists());
}

#[tokio::test]
async fn explicit_output_base_is_honoured() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workspace = tmp.path();
    let base = workspace.join("custom-out");
    let commands = fake_build_script(
        workspace,
        &format!(
            "mkdir -p {base}/AARCH64 && echo arm > {base}/AARCH64/Pei.map",
            base = base.display()
        ),
    );

    let cfg = config(workspace, commands);
    let builder = platform_builder(workspace, cfg);

    let status = builder
        .invoke(
            Invocable::Build,
            vec![
                "BUILD_ARCH=AARCH64".to_string(),
                format!("BUILD_OUTPUT_BASE={}", base.display()),
            ],
        )
        .await
        .expect("invoke build");

    assert_eq!(status, 0);
    assert!(base.join("MAP/Pei.map").is_file());
}

#[tokio::test]
async fn failed_build_skips_post_build() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workspace = tmp.path();
    let base = workspace.join("Build/MsvmPkgX64/DEBUG_VS2022");
    let commands = fake_build_script(
        workspace,
        &format!(
            "mkdir -p {base}/X64 && echo x > {base}/X64/Dxe.map && exit 7",
            base = base.display()
        ),
    );

    let cfg = config(workspace, commands);
    let builder = platform_builder(workspace, cfg);

    let status = builder.invoke(Invocable::Build, Vec::new()).await.expect("invoke build");

    assert_eq!(status, 7);
    assert!(!base.join("MAP").exists());
}

#[tokio::test]
async fn setup_never_runs_plugins() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let workspace = tmp.path();
    let base = workspace.join("Build/MsvmPkgX64/DEBUG_VS2022");
    fs::create_dir_all(base.join("X64")).expect("create build tree");
    fs::write(base.join("X64/Dxe.map"), "x").expect("write map");

    let cfg = config(workspace, InvocableConfiguration {
        setup: vec!["true".to_string()],
        ..Default::default()
    });
    let builder = platform_builder(workspace, cfg);

    let status = builder.invoke(Invocable::Setup, Vec::new()).await.expect("invoke setup");

    assert_eq!(status, 0);
    assert!(!base.join("MAP").exists());
}
