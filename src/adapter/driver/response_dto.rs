use crate::domain::model::ReservationRequest;
use crate::domain::service::TermAttachment;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 予約リクエスト用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationRequestResponse {
    pub id: String,
    pub status: String,
    #[serde(rename = "guestID")]
    pub guest_id: u64,
    #[serde(rename = "accommodationID")]
    pub accommodation_id: u64,
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,
    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,
    #[serde(rename = "guestNumber")]
    pub guest_number: u32,
    #[serde(rename = "accommodationName")]
    pub accommodation_name: String,
    #[serde(rename = "reservedTermId")]
    pub reserved_term_id: Option<u64>,
}

impl ReservationRequestResponse {
    /// ドメインオブジェクトからReservationRequestResponseを作成
    pub fn from_request(request: &ReservationRequest) -> Self {
        Self {
            id: request.id().to_string(),
            status: request.status().to_string(),
            guest_id: request.guest_id().value(),
            accommodation_id: request.accommodation_id().value(),
            start_date: request.stay().start(),
            end_date: request.stay().end(),
            guest_number: request.guest_number(),
            accommodation_name: request.accommodation_name().to_string(),
            reserved_term_id: request.reserved_term_id().map(|id| id.value()),
        }
    }
}

/// 件数用のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// 予約済み期間の紐付け結果のレスポンスDTO
#[derive(Debug, Serialize, Deserialize)]
pub struct TermAttachmentResponse {
    pub outcome: String,
    #[serde(rename = "reservedTermId", skip_serializing_if = "Option::is_none")]
    pub reserved_term_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TermAttachmentResponse {
    pub fn from_attachment(attachment: &TermAttachment) -> Self {
        match attachment {
            TermAttachment::Attached(id) => Self {
                outcome: "ATTACHED".to_string(),
                reserved_term_id: Some(id.value()),
                error: None,
            },
            TermAttachment::Failed(reason) => Self {
                outcome: "FAILED".to_string(),
                reserved_term_id: None,
                error: Some(reason.clone()),
            },
        }
    }
}
