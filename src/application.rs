// アプリケーション層
// ユースケースの調整とトランザクション境界

pub mod error;
pub mod service;

pub use error::ApplicationError;
pub use service::{AuthorizationService, ReservationQueryService, ReservationRequestService};
