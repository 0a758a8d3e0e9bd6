use reservation_service::adapter::driven::{
    AccommodationServiceClient, EndpointPool, InMemoryReservationRequestRepository,
    MySqlReservationRequestRepository, SystemClock, UserServiceClient,
};
use reservation_service::adapter::driver::{create_router, AppState};
use reservation_service::adapter::{DatabaseConfig, DatabaseMigration, ServiceConfig};
use reservation_service::application::service::{
    AuthorizationService, ReservationQueryService, ReservationRequestService,
};
use reservation_service::domain::port::{Clock, ReservationRequestRepository};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reservation_service=debug,sqlx=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service_config = ServiceConfig::from_env()?;

    let repository: Arc<dyn ReservationRequestRepository> =
        if std::env::var("RESERVATION_STORE").as_deref() == Ok("memory") {
            tracing::warn!("インメモリストアを使用します（再起動でデータは失われます）");
            Arc::new(InMemoryReservationRequestRepository::new())
        } else {
            // データベース設定を読み込む
            let config = DatabaseConfig::from_env()?;
            tracing::info!(host = %config.host, port = config.port, "データベース設定を読み込みました");

            // 接続プールを作成
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.query_timeout())
                .connect(&config.connection_string())
                .await?;

            DatabaseMigration::new(pool.clone()).run().await?;

            Arc::new(MySqlReservationRequestRepository::new(
                pool,
                config.query_timeout(),
            ))
        };

    let accommodation_client = Arc::new(AccommodationServiceClient::new(
        EndpointPool::new(service_config.accommodation_service_urls.clone())?,
        service_config.outbound_timeout(),
    )?);
    let user_client = Arc::new(UserServiceClient::new(
        EndpointPool::new(service_config.user_service_urls.clone())?,
        service_config.outbound_timeout(),
    )?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // アプリケーション状態を作成
    let app_state = AppState {
        reservation_service: Arc::new(ReservationRequestService::new(
            repository.clone(),
            accommodation_client.clone(),
            accommodation_client,
            clock.clone(),
        )),
        query_service: Arc::new(ReservationQueryService::new(repository, clock)),
        authorization_service: Arc::new(AuthorizationService::new(user_client)),
    };

    // REST APIルーターを作成
    let app = create_router().with_state(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind(&service_config.bind_address).await?;
    tracing::info!(address = %service_config.bind_address, "予約リクエストサービスが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
