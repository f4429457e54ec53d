use crate::{
    http::{self, AppState},
    settings::Settings,
    worker,
};
use asset_intel_logic::{clients::asset_fetcher::AssetFetcherClient, services::queue::QueueAdapter};
use blockscout_service_launcher::{
    database,
    launcher::{self, LaunchSettings},
};
use migration::Migrator;
use std::sync::Arc;

const SERVICE_NAME: &str = "asset_intel";

#[derive(Clone)]
struct Router {
    state: Arc<AppState>,
}

impl Router {
    /// No services are ever added: the gRPC surface is dropped entirely and
    /// this router exists only to satisfy `launcher::launch`'s signature.
    /// `server.grpc.enabled` defaults to `false`, so it's never actually served.
    pub fn grpc_router(&self) -> tonic::transport::server::Router {
        tonic::transport::Server::builder()
    }
}

impl launcher::HttpRouter for Router {
    fn register_routes(&self, service_config: &mut actix_web::web::ServiceConfig) {
        let state = self.state.clone();
        service_config
            .app_data(actix_web::web::Data::from(state))
            .configure(http::configure);
    }
}

pub async fn run(settings: Settings) -> Result<(), anyhow::Error> {
    blockscout_service_launcher::tracing::init_logs(
        SERVICE_NAME,
        &settings.tracing,
        &settings.jaeger,
    )?;

    let repo = database::ReadWriteRepo::new::<Migrator>(
        &settings.database,
        settings.replica_database.as_ref(),
    )
    .await?;

    let queue = QueueAdapter::connect_with_backoff(settings.redis.url.as_str()).await?;
    let asset_client = AssetFetcherClient::new(settings.service.asset_fetcher_url.to_string());

    if settings.service.use_arq_worker {
        let worker_db = repo.main_db().clone();
        let worker_queue = queue.clone();
        let worker_settings = settings.clone();
        tokio::spawn(async move {
            if let Err(err) = worker::run_worker(worker_settings, worker_db, worker_queue).await {
                tracing::error!(err = ?err, "worker loop exited");
            }
        });
    }

    let state = Arc::new(AppState {
        db: repo.main_db().clone(),
        queue,
        asset_client,
        api: settings.api.clone(),
        admin: settings.admin.clone(),
        service: settings.service.clone(),
    });

    let router = Router { state };
    let grpc_router = router.grpc_router();
    let http_router = router;

    let launch_settings = LaunchSettings {
        service_name: SERVICE_NAME.to_string(),
        server: settings.server,
        metrics: settings.metrics,
        graceful_shutdown: Default::default(),
    };

    launcher::launch(launch_settings, http_router, grpc_router).await
}
