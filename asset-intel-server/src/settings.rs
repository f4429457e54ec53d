use blockscout_service_launcher::{
    database::{DatabaseConnectSettings, DatabaseSettings, ReplicaDatabaseSettings},
    launcher::{ConfigSettings, MetricsSettings, ServerSettings},
    tracing::{JaegerSettings, TracingSettings},
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub tracing: TracingSettings,
    #[serde(default)]
    pub jaeger: JaegerSettings,
    pub database: DatabaseSettings,
    // Optional read-only replica; search and listing queries would be
    // redirected here if configured. Unused today since every handler reads
    // off the primary connection.
    #[serde(default)]
    pub replica_database: Option<ReplicaDatabaseSettings>,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RedisSettings {
    pub url: Url,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: Url::parse("redis://localhost:6379").unwrap(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceSettings {
    #[serde(default = "default_asset_fetcher_url")]
    pub asset_fetcher_url: Url,
    // When true, the HTTP server also spawns an embedded worker loop in this
    // process -- convenient for a single-node deployment. Production setups
    // run `asset-intel-worker` as its own scaled-out process and should set
    // this to false to avoid double-consuming the queue.
    #[serde(default = "default_use_arq_worker")]
    pub use_arq_worker: bool,
    #[serde(default = "default_arq_max_tries")]
    pub arq_max_tries: i32,
    #[serde(default = "default_deadletter_max_items")]
    pub deadletter_max_items: usize,
    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_job_timeout")]
    pub job_timeout: time::Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            asset_fetcher_url: default_asset_fetcher_url(),
            use_arq_worker: default_use_arq_worker(),
            arq_max_tries: default_arq_max_tries(),
            deadletter_max_items: default_deadletter_max_items(),
            worker_concurrency: default_worker_concurrency(),
            job_timeout: default_job_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AdminSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub admin_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    #[serde(default = "default_default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl ConfigSettings for Settings {
    const SERVICE_NAME: &'static str = "ASSET_INTEL";
}

impl Settings {
    pub fn default(database_url: String) -> Self {
        Self {
            server: Default::default(),
            metrics: Default::default(),
            tracing: Default::default(),
            jaeger: Default::default(),
            database: DatabaseSettings {
                connect: DatabaseConnectSettings::Url(database_url),
                connect_options: Default::default(),
                create_database: Default::default(),
                run_migrations: Default::default(),
            },
            replica_database: Default::default(),
            redis: Default::default(),
            service: Default::default(),
            admin: Default::default(),
            api: Default::default(),
        }
    }
}

fn default_asset_fetcher_url() -> Url {
    Url::parse("http://localhost:8090").unwrap()
}

fn default_use_arq_worker() -> bool {
    true
}

fn default_arq_max_tries() -> i32 {
    3
}

fn default_deadletter_max_items() -> usize {
    200
}

fn default_worker_concurrency() -> usize {
    10
}

fn default_job_timeout() -> time::Duration {
    time::Duration::from_secs(10 * 60)
}

fn default_default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    100
}
