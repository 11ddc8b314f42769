use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::core::config::{EffectiveConfig, PartialConfig};
use crate::core::merge::{merge, Deferred, DEFERRED_FIELDS};
use crate::core::models::{
    BuildArgs, BuildOptions, BuildTarget, ServerOutputFormat, ServerResolve, CLIENT_OUT_DIR,
    ENTRY_MODULE, SERVER_OUT_DIR,
};
use crate::core::plugin::Plugin;
use crate::plugins::{BundleAnalyzerPlugin, OmitApiRoutesPlugin, RemoveUnusedImportsPlugin};
use crate::utils::{EnvSnapshot, DISABLE_PROD_OPTIMIZATION_VAR};

/// Extensions the web platform resolves, most specific first
const WEB_EXTENSIONS: &[&str] = &[
    ".web.tsx", ".web.ts", ".web.jsx", ".web.js", ".tsx", ".ts", ".jsx", ".js", ".mjs", ".json",
];

/// Defines only the server bundle sees. They win over everything else.
const SERVER_DEFINES: &[(&str, &str)] = &[("process.env.IS_SERVER", "\"1\"")];

/// Assembles the effective bundler config for each target
pub struct TargetConfigBuilder<'a> {
    options: &'a BuildOptions,
    args: &'a BuildArgs,
    env: &'a EnvSnapshot,
    server_resolve: &'a ServerResolve,
    omit_api_routes: Arc<OmitApiRoutesPlugin>,
    post_processor: Arc<RemoveUnusedImportsPlugin>,
}

impl<'a> TargetConfigBuilder<'a> {
    pub fn new(
        options: &'a BuildOptions,
        args: &'a BuildArgs,
        env: &'a EnvSnapshot,
        server_resolve: &'a ServerResolve,
    ) -> Self {
        Self {
            options,
            args,
            env,
            server_resolve,
            omit_api_routes: Arc::new(OmitApiRoutesPlugin::new()),
            post_processor: Arc::new(RemoveUnusedImportsPlugin::new()),
        }
    }

    /// The chunk post-processor attached to the server build
    pub fn post_processor(&self) -> Arc<RemoveUnusedImportsPlugin> {
        Arc::clone(&self.post_processor)
    }

    /// Production defaults shared by both targets
    pub fn base_config(&self) -> PartialConfig {
        let options = self.options;
        let mut exclude = options.deps.exclude.clone();
        push_unique(&mut exclude, &options.vendor_package);

        let config = json!({
            "root": options.root.to_string_lossy(),
            "mode": "production",
            "clearScreen": false,
            "configFile": false,
            "server": { "host": options.host, "port": options.port },
            "resolve": { "extensions": WEB_EXTENSIONS },
            "define": {
                "process.env.NODE_ENV": "\"production\"",
                "__DEV__": "false",
            },
            "optimizeDeps": {
                "include": options.deps.include,
                "exclude": exclude,
            },
        });

        PartialConfig::from_value(config).unwrap_or_default()
    }

    pub fn build(
        &self,
        target: BuildTarget,
        base: &PartialConfig,
        user: &PartialConfig,
    ) -> EffectiveConfig {
        let (shared, deferred) = self.shared_config(base, user);

        let layers = match target {
            BuildTarget::Client => self.client_layers(&shared),
            BuildTarget::Server => self.server_layers(&shared),
        };

        let mut config = merge(std::iter::once(shared).chain(layers));
        deferred.reinject(&mut config);

        EffectiveConfig::new(target, config)
    }

    /// Base merged with the user's config. Fields needing concatenation are
    /// composed here; deferred fields are held back for the caller.
    fn shared_config(&self, base: &PartialConfig, user: &PartialConfig) -> (PartialConfig, Deferred) {
        let mut user = user.clone();
        let deferred = Deferred::extract(&mut user, DEFERRED_FIELDS);

        let include = union_lists(
            base.get(&["optimizeDeps", "include"]),
            user.get(&["optimizeDeps", "include"]),
        );
        let exclude = union_lists(
            base.get(&["optimizeDeps", "exclude"]),
            user.get(&["optimizeDeps", "exclude"]),
        );

        let composed = PartialConfig::new()
            .with(&["optimizeDeps", "include"], include)
            .with(&["optimizeDeps", "exclude"], exclude)
            .with_plugins(concat(base.plugins(), user.plugins()))
            .with_output_plugins(concat(base.output_plugins(), user.output_plugins()));

        (merge([base.clone(), user, composed]), deferred)
    }

    fn client_layers(&self, shared: &PartialConfig) -> Vec<PartialConfig> {
        let mut plugins = shared.plugins().to_vec();
        plugins.push(self.omit_api_routes.clone());
        if self.args.analyze || self.options.build.analyze {
            plugins.push(Arc::new(BundleAnalyzerPlugin::static_report()));
        }

        let client = PartialConfig::new()
            .with_plugins(plugins)
            .with(&["configFile"], json!(false))
            .with(&["build", "ssrManifest"], json!(true))
            .with(&["build", "outDir"], json!(CLIENT_OUT_DIR))
            .with(&["build", "manifest"], json!(true))
            .with(&["build", "rollupOptions", "input"], json!([ENTRY_MODULE]));

        let mut layers = vec![client];
        if self.env.is_set(DISABLE_PROD_OPTIMIZATION_VAR) {
            layers.push(disable_optimization_layer());
        }
        layers
    }

    fn server_layers(&self, shared: &PartialConfig) -> Vec<PartialConfig> {
        let mut plugins = shared.plugins().to_vec();
        plugins.push(self.omit_api_routes.clone());

        let mut output_plugins = shared.output_plugins().to_vec();
        output_plugins.push(self.post_processor.clone());

        let mut define = self.env.to_defines();
        for (key, value) in SERVER_DEFINES {
            define.insert(key.to_string(), json!(value));
        }

        let optimize_deps = shared
            .get(&["optimizeDeps"])
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let mut server = PartialConfig::new()
            .with_plugins(plugins)
            .with_output_plugins(output_plugins)
            .with(&["define"], Value::Object(define))
            .with(&["resolve"], self.server_resolve.to_value())
            .with(&["ssr", "noExternal"], json!(true))
            .with(&["ssr", "optimizeDeps"], optimize_deps)
            .with(&["build", "cssCodeSplit"], json!(false))
            .with(&["build", "ssr"], json!(true))
            .with(&["build", "outDir"], json!(SERVER_OUT_DIR))
            .with(&["build", "rollupOptions", "treeshake"], json!(true))
            .with(&["build", "rollupOptions", "input"], json!([ENTRY_MODULE]));

        if self.options.build.server.output_format() == ServerOutputFormat::Cjs {
            server.set(
                &["build", "rollupOptions", "output"],
                json!({ "format": "cjs", "entryFileNames": "[name].cjs" }),
            );
        }

        vec![server]
    }
}

/// Diagnostic mode: no minification or tree-shaking anywhere
fn disable_optimization_layer() -> PartialConfig {
    PartialConfig::new()
        .with(&["optimizeDeps", "esbuildOptions", "minify"], json!(false))
        .with(&["build", "minify"], json!(false))
        .with(&["build", "rollupOptions", "treeshake"], json!(false))
        .with(
            &["build", "rollupOptions", "output", "minifyInternalExports"],
            json!(false),
        )
}

fn concat(first: &[Arc<dyn Plugin>], second: &[Arc<dyn Plugin>]) -> Vec<Arc<dyn Plugin>> {
    first.iter().chain(second).cloned().collect()
}

/// Order-preserving union of two JSON string lists; non-list values count as empty
fn union_lists(first: Option<&Value>, second: Option<&Value>) -> Value {
    let mut merged = Vec::new();
    for list in [first, second].into_iter().flatten() {
        for entry in list.as_array().into_iter().flatten() {
            if let Some(name) = entry.as_str() {
                push_unique(&mut merged, name);
            }
        }
    }
    json!(merged)
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}
