use asset_intel_server::Settings;
use env_collector::{run_env_collector_cli, EnvCollectorSettingsBuilder, PrefixFilter};

fn main() {
    let vars_filter = PrefixFilter::blacklist(&[
        "ASSET_INTEL__SERVER",
        "ASSET_INTEL__JAEGER",
        "ASSET_INTEL__METRICS",
        "ASSET_INTEL__TRACING",
        "ASSET_INTEL__DATABASE__CONNECT_OPTIONS",
    ]);

    let settings = EnvCollectorSettingsBuilder::default()
        .service_name("ASSET_INTEL".to_string())
        .markdown_path("README.md".to_string())
        .config_path("asset-intel-server/config/example.toml".to_string())
        .vars_filter(vars_filter)
        .anchor_postfix(None)
        .build()
        .expect("invalid settings");

    run_env_collector_cli::<Settings>(settings);
}
