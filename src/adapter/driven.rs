// 駆動される側アダプター（リポジトリ実装、外部サービスクライアントなど）

mod accommodation_service_client;
mod endpoint_pool;
mod in_memory_reservation_request_repository;
mod reservation_request_repository;
mod system_clock;
mod user_service_client;

pub use accommodation_service_client::AccommodationServiceClient;
pub use endpoint_pool::EndpointPool;
pub use in_memory_reservation_request_repository::InMemoryReservationRequestRepository;
pub use reservation_request_repository::MySqlReservationRequestRepository;
pub use system_clock::SystemClock;
pub use user_service_client::UserServiceClient;
