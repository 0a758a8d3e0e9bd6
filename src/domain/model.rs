// ドメインモデル（エンティティと値オブジェクト）

mod accommodation;
mod reservation_request;
mod value_objects;

pub use value_objects::{
    AccommodationId, ReservationRequestId, ReservationStatus, ReservedTermId, StayPeriod, UserId,
    UserRole,
};

pub use accommodation::{AcceptancePolicy, AccommodationInfo, AvailableTerm};
pub use reservation_request::{ReservationDraft, ReservationRequest};
