use crate::support::{
    project_config, service, FailingPatchHook, MissingVendorResolver, RecordingBundler,
};
use dualbuild::core::models::{BuildArgs, BuildTarget, ServerBuildOption};
use dualbuild::utils::{BuildSection, DualBuildError};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_builds_client_then_server() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new());

    let result = service(bundler.clone())
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap();

    assert_eq!(bundler.targets(), vec![BuildTarget::Client, BuildTarget::Server]);
    assert_eq!(result.client_output.as_ref().map(Vec::len), Some(1));
    assert_eq!(result.server_output.as_ref().map(Vec::len), Some(1));

    let manifest = result.client_manifest.expect("manifest read after server build");
    assert_eq!(manifest["virtual:app-entry"]["file"], "assets/entry.js");

    assert!(temp_dir.path().join("dist/client/entry.js").exists());
    assert!(temp_dir.path().join("dist/server/entry.js").exists());
    assert_eq!(result.server_resolve.alias.len(), 5);
    assert!(result
        .server_resolve
        .get("react")
        .unwrap()
        .ends_with("@dualbuild/vendor/react-19-prod.js"));
}

#[tokio::test]
async fn test_generate_step_skips_client_build() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler {
        manifest_on: Some(BuildTarget::Server),
        ..RecordingBundler::new()
    });

    let result = service(bundler.clone())
        .build(project_config(temp_dir.path()), BuildArgs::generate_only())
        .await
        .unwrap();

    assert_eq!(bundler.targets(), vec![BuildTarget::Server]);
    assert!(result.client_output.is_none());
    assert!(result.server_output.is_some());
    assert!(result.client_manifest.is_some());
    // both configs are still assembled
    assert_eq!(result.client_config.target(), BuildTarget::Client);
}

#[tokio::test]
async fn test_generate_step_without_manifest_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new());

    let err = service(bundler.clone())
        .build(project_config(temp_dir.path()), BuildArgs::generate_only())
        .await
        .unwrap_err();

    assert!(matches!(err, DualBuildError::Manifest { .. }));
    assert_eq!(bundler.targets(), vec![BuildTarget::Server]);
}

#[tokio::test]
async fn test_server_disabled_skips_server_and_manifest() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler {
        // a manifest read would fail: nothing writes it
        manifest_on: Some(BuildTarget::Server),
        ..RecordingBundler::new()
    });
    let mut config = project_config(temp_dir.path());
    config.build = Some(BuildSection {
        server: Some(ServerBuildOption::Toggle(false)),
        analyze: None,
    });

    let result = service(bundler.clone())
        .build(config, BuildArgs::default())
        .await
        .unwrap();

    assert_eq!(bundler.targets(), vec![BuildTarget::Client]);
    assert!(result.client_output.is_some());
    assert!(result.server_output.is_none());
    assert!(result.client_manifest.is_none());
}

#[tokio::test]
async fn test_failing_patch_hook_does_not_stop_build() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("dist/stale")).unwrap();
    let bundler = Arc::new(RecordingBundler::new());
    let hook = Arc::new(FailingPatchHook::new());

    let result = service(bundler.clone())
        .with_patch_hook(hook.clone())
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap();

    assert_eq!(hook.calls(), 1);
    assert!(!temp_dir.path().join("dist/stale").exists());
    assert!(result.server_output.is_some());
}

#[tokio::test]
async fn test_client_failure_aborts_run() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new().failing_on(BuildTarget::Client));

    let err = service(bundler.clone())
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap_err();

    match &err {
        DualBuildError::Bundler {
            target, diagnostics, ..
        } => {
            assert_eq!(*target, BuildTarget::Client);
            assert_eq!(diagnostics.as_deref(), Some("Could not resolve entry module"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.format_detailed().contains("│ Could not resolve entry module"));
    assert_eq!(bundler.targets(), vec![BuildTarget::Client]);
}

#[tokio::test]
async fn test_cleanup_removes_output_and_deps_cache() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("dist/client/old")).unwrap();
    std::fs::create_dir_all(temp_dir.path().join("node_modules/.vite/deps")).unwrap();
    std::fs::write(temp_dir.path().join("node_modules/.vite/deps/react.js"), "").unwrap();
    let bundler = Arc::new(RecordingBundler::new());

    service(bundler)
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap();

    assert!(!temp_dir.path().join("dist/client/old").exists());
    assert!(!temp_dir.path().join("node_modules/.vite").exists());
}

#[tokio::test]
async fn test_user_no_external_reaches_both_targets() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new().with_user_config(json!({
        "ssr": { "noExternal": true, "target": "node" },
        "define": { "__APP_NAME__": "\"demo\"" },
    })));

    let result = service(bundler.clone())
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap();

    for config in [&result.client_config, &result.server_config] {
        assert_eq!(config.get(&["ssr", "noExternal"]), Some(&json!(true)));
        assert_eq!(config.get(&["ssr", "target"]), Some(&json!("node")));
        assert_eq!(config.get(&["define", "__APP_NAME__"]), Some(&json!("\"demo\"")));
    }

    let builds = bundler.builds.lock().unwrap();
    let (_, server_sent) = &builds[1];
    assert_eq!(server_sent["define"]["process.env.NODE_ENV"], json!("\"production\""));
    assert_eq!(
        server_sent["define"]["process.env.API_URL"],
        json!("\"https://api.example.com\"")
    );
}

#[tokio::test]
async fn test_server_failure_after_client_success() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new().failing_on(BuildTarget::Server));

    let err = service(bundler.clone())
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DualBuildError::Bundler {
            target: BuildTarget::Server,
            ..
        }
    ));
    assert!(temp_dir.path().join("dist/client/entry.js").exists());
}

#[tokio::test]
async fn test_static_site_builds_without_vendor_package() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new());
    let mut config = project_config(temp_dir.path());
    config.build = Some(BuildSection {
        server: Some(ServerBuildOption::Toggle(false)),
        analyze: None,
    });

    let result = service(bundler.clone())
        .with_vendor_resolver(Arc::new(MissingVendorResolver))
        .build(config, BuildArgs::default())
        .await
        .unwrap();

    assert_eq!(bundler.targets(), vec![BuildTarget::Client]);
    assert!(result.server_resolve.alias.is_empty());
    assert!(result.client_output.is_some());
}

#[tokio::test]
async fn test_missing_vendor_package_fails_server_site() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = Arc::new(RecordingBundler::new());

    let err = service(bundler.clone())
        .with_vendor_resolver(Arc::new(MissingVendorResolver))
        .build(project_config(temp_dir.path()), BuildArgs::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DualBuildError::Resolve(_)));
    assert!(bundler.targets().is_empty());
}
