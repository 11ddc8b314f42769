use crate::support::{project_config, service, FlatVendorResolver, RecordingBundler};
use dualbuild::cli::render_configs;
use dualbuild::core::models::{BuildArgs, BuildTarget};
use dualbuild::core::services::DualBuildService;
use dualbuild::utils::{
    CliOverrides, ConfigLoader, EnvSnapshot, CONFIG_FILE_NAME, DISABLE_PROD_OPTIMIZATION_VAR,
};
use serde_json::json;
use std::sync::Arc;

fn plugin_names(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|plugin| plugin["name"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_config_file_drives_server_format_and_analyzer() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        r#"{ "port": 3000, "build": { "server": { "outputFormat": "cjs" }, "analyze": true } }"#,
    )
    .unwrap();

    let file_config = ConfigLoader::load_from_file(temp_dir.path()).await.unwrap();
    let config = ConfigLoader::merge_with_cli(
        file_config,
        temp_dir.path().to_path_buf(),
        &CliOverrides::default(),
    );

    let prepared = service(Arc::new(RecordingBundler::new()))
        .inspect(config, &BuildArgs::default())
        .await
        .unwrap();

    assert_eq!(prepared.client.get(&["server", "port"]), Some(&json!(3000)));
    assert_eq!(
        prepared.server.get(&["build", "rollupOptions", "output"]),
        Some(&json!({ "format": "cjs", "entryFileNames": "[name].cjs" }))
    );

    let client = prepared.client.to_value();
    assert_eq!(
        plugin_names(&client["plugins"]),
        vec!["omit-api-routes", "bundle-analyzer"]
    );
    let server = prepared.server.to_value();
    assert_eq!(plugin_names(&server["plugins"]), vec!["omit-api-routes"]);
    assert_eq!(
        plugin_names(&server["build"]["rollupOptions"]["plugins"]),
        vec!["remove-unused-imports"]
    );
}

#[tokio::test]
async fn test_user_plugins_and_deps_are_concatenated() {
    let temp_dir = tempfile::tempdir().unwrap();
    let bundler = RecordingBundler::new().with_user_config(json!({
        "plugins": ["tsconfig-paths", null, { "name": "svgr" }],
        "optimizeDeps": { "include": ["dayjs"], "exclude": ["@dualbuild/vendor", "fsevents"] },
    }));

    let prepared = service(Arc::new(bundler))
        .inspect(project_config(temp_dir.path()), &BuildArgs::default())
        .await
        .unwrap();

    let client = prepared.client.to_value();
    assert_eq!(
        plugin_names(&client["plugins"]),
        vec!["tsconfig-paths", "svgr", "omit-api-routes"]
    );
    assert_eq!(
        client["optimizeDeps"]["exclude"],
        json!(["@dualbuild/vendor", "fsevents"])
    );
    assert_eq!(client["optimizeDeps"]["include"], json!(["dayjs"]));
    assert_eq!(
        prepared.server.get(&["ssr", "optimizeDeps"]),
        prepared.client.get(&["optimizeDeps"])
    );
}

#[tokio::test]
async fn test_disable_optimization_only_touches_client() {
    let temp_dir = tempfile::tempdir().unwrap();
    let service = DualBuildService::new(Arc::new(RecordingBundler::new()))
        .with_vendor_resolver(Arc::new(FlatVendorResolver))
        .with_env(EnvSnapshot::default().with_var(DISABLE_PROD_OPTIMIZATION_VAR, "1"));

    let prepared = service
        .inspect(project_config(temp_dir.path()), &BuildArgs::default())
        .await
        .unwrap();

    assert_eq!(prepared.client.get(&["build", "minify"]), Some(&json!(false)));
    assert_eq!(prepared.server.get(&["build", "minify"]), None);
    assert_eq!(
        prepared.server.get(&["build", "rollupOptions", "treeshake"]),
        Some(&json!(true))
    );
}

#[tokio::test]
async fn test_render_configs_for_one_target() {
    let temp_dir = tempfile::tempdir().unwrap();

    let prepared = service(Arc::new(RecordingBundler::new()))
        .inspect(project_config(temp_dir.path()), &BuildArgs::default())
        .await
        .unwrap();

    let both = render_configs(&prepared, None);
    assert_eq!(both["client"]["build"]["outDir"], "dist/client");
    assert_eq!(both["server"]["build"]["outDir"], "dist/server");

    for target in ["client", "server"] {
        let omit = &both[target]["plugins"][0];
        assert_eq!(omit["name"], "omit-api-routes", "{}", target);
        assert_eq!(omit["pattern"], r"\+api\.tsx?$", "{}", target);
    }

    let server = render_configs(&prepared, Some(BuildTarget::Server));
    assert_eq!(server["build"]["ssr"], json!(true));
    assert_eq!(server["define"]["process.env.IS_SERVER"], json!("\"1\""));
    assert!(server["resolve"]["alias"]["react-dom/client"]
        .as_str()
        .unwrap()
        .ends_with("react-dom-client-19.js"));
}
