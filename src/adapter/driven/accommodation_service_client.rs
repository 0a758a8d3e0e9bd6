use crate::adapter::driven::endpoint_pool::{ensure_success, transport_error, EndpointPool};
use crate::domain::model::{
    AcceptancePolicy, AccommodationId, AccommodationInfo, AvailableTerm, ReservationRequest,
    ReservedTermId, UserId,
};
use crate::domain::port::{AvailabilityOracle, GatewayError, TermReservationGateway};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// 宿泊施設サービスのクライアント
/// 宿泊施設情報の取得と予約済み期間の作成・削除を行う
pub struct AccommodationServiceClient {
    http_client: Client,
    endpoints: EndpointPool,
}

impl AccommodationServiceClient {
    /// # Arguments
    /// * `endpoints` - 宿泊施設サービスのエンドポイント群
    /// * `timeout` - 1回の呼び出しに許容する時間
    pub fn new(endpoints: EndpointPool, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            http_client,
            endpoints,
        })
    }
}

// 日付は "2030-01-05" と "2030-01-05T00:00:00Z" の両方の形式を受け付ける
// オフセット付きの日時は送信元の暦日をそのまま使う
fn deserialize_wire_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_wire_date(&raw).map_err(serde::de::Error::custom)
}

fn parse_wire_date(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date_time.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", raw, e))
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Deserialize)]
struct AvailableTermDto {
    #[serde(rename = "startDate", alias = "StartDate", deserialize_with = "deserialize_wire_date")]
    start_date: NaiveDate,
    #[serde(rename = "endDate", alias = "EndDate", deserialize_with = "deserialize_wire_date")]
    end_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct AccommodationDto {
    id: u64,
    #[serde(rename = "minimimGuests", alias = "minGuests", default)]
    min_guests: u32,
    #[serde(rename = "maximumGuests", alias = "maxGuests", default)]
    max_guests: u32,
    #[serde(rename = "availableTerms", default)]
    available_terms: Option<Vec<AvailableTermDto>>,
    #[serde(rename = "userID", alias = "userId")]
    user_id: u64,
    #[serde(rename = "acceptReservationType", default)]
    accept_reservation_type: String,
    #[serde(default)]
    name: String,
}

impl AccommodationDto {
    fn into_domain(self) -> Result<AccommodationInfo, GatewayError> {
        let acceptance_policy = match self.accept_reservation_type.as_str() {
            "AUTOMATIC" | "AUTOMATICALLY" => AcceptancePolicy::Automatic,
            "MANUAL" | "" => AcceptancePolicy::Manual,
            other => {
                return Err(GatewayError::InvalidResponse(format!(
                    "unknown acceptReservationType: {}",
                    other
                )))
            }
        };

        let available_terms = self
            .available_terms
            .unwrap_or_default()
            .into_iter()
            .map(|term| AvailableTerm::new(term.start_date, term.end_date))
            .collect();

        Ok(AccommodationInfo::new(
            AccommodationId::new(self.id),
            self.min_guests,
            self.max_guests,
            available_terms,
            UserId::new(self.user_id),
            acceptance_policy,
            self.name,
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReservedTermDto {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    accommodation_id: u64,
}

#[derive(Debug, Deserialize)]
struct ReservedTermDto {
    id: u64,
}

#[async_trait]
impl AvailabilityOracle for AccommodationServiceClient {
    async fn fetch(
        &self,
        accommodation_id: AccommodationId,
    ) -> Result<AccommodationInfo, GatewayError> {
        let url = self
            .endpoints
            .url(&format!("/api/accomodation/{}", accommodation_id));
        tracing::debug!(%url, "宿泊施設情報を取得します");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        let response =
            ensure_success(response, &format!("accommodation {}", accommodation_id)).await?;

        let dto: AccommodationDto = response.json().await.map_err(transport_error)?;
        dto.into_domain()
    }
}

#[async_trait]
impl TermReservationGateway for AccommodationServiceClient {
    async fn create_reserved_term(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservedTermId, GatewayError> {
        let url = self.endpoints.url("/api/accomodation/reservedTerm");
        let body = CreateReservedTermDto {
            start_date: midnight_utc(request.stay().start()),
            end_date: midnight_utc(request.stay().end()),
            accommodation_id: request.accommodation_id().value(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response, "reserved term").await?;

        let dto: ReservedTermDto = response.json().await.map_err(transport_error)?;
        Ok(ReservedTermId::new(dto.id))
    }

    async fn delete_reserved_term(
        &self,
        reserved_term_id: ReservedTermId,
    ) -> Result<(), GatewayError> {
        let url = self
            .endpoints
            .url(&format!("/api/accomodation/reservedTerm/{}", reserved_term_id));

        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response, &format!("reserved term {}", reserved_term_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_accommodation_json_is_mapped_to_domain() {
        let json = r#"{
            "id": 12,
            "minimimGuests": 1,
            "maximumGuests": 3,
            "availableTerms": [
                {"StartDate": "2030-01-01T00:00:00Z", "EndDate": "2030-01-10T00:00:00Z"},
                {"startDate": "2030-02-01", "endDate": "2030-02-05"}
            ],
            "userID": 7,
            "acceptReservationType": "AUTOMATICALLY",
            "name": "Harbour View"
        }"#;

        let dto: AccommodationDto = serde_json::from_str(json).unwrap();
        let info = dto.into_domain().unwrap();

        assert_eq!(info.id(), AccommodationId::new(12));
        assert_eq!(info.max_guests(), 3);
        assert_eq!(info.owner_id(), UserId::new(7));
        assert_eq!(info.acceptance_policy(), AcceptancePolicy::Automatic);
        assert_eq!(info.name(), "Harbour View");
        assert_eq!(
            info.available_terms(),
            &[
                AvailableTerm::new(date(2030, 1, 1), date(2030, 1, 10)),
                AvailableTerm::new(date(2030, 2, 1), date(2030, 2, 5)),
            ]
        );
    }

    #[test]
    fn test_offset_midnight_keeps_sender_calendar_day() {
        let json = r#"{
            "id": 4,
            "userID": 2,
            "acceptReservationType": "MANUAL",
            "availableTerms": [
                {"startDate": "2030-01-05T00:00:00+01:00", "endDate": "2030-01-10T00:00:00+01:00"},
                {"startDate": "2030-03-01T00:00:00+09:00", "endDate": "2030-03-03T00:00:00+09:00"}
            ]
        }"#;
        let info = serde_json::from_str::<AccommodationDto>(json)
            .unwrap()
            .into_domain()
            .unwrap();

        assert_eq!(
            info.available_terms(),
            &[
                AvailableTerm::new(date(2030, 1, 5), date(2030, 1, 10)),
                AvailableTerm::new(date(2030, 3, 1), date(2030, 3, 3)),
            ]
        );
        assert!(!info.is_day_available(date(2030, 1, 4)));
        assert!(info.is_day_available(date(2030, 1, 9)));
    }

    #[test]
    fn test_parse_wire_date_formats() {
        assert_eq!(parse_wire_date("2030-01-05"), Ok(date(2030, 1, 5)));
        assert_eq!(parse_wire_date("2030-01-05T00:00:00Z"), Ok(date(2030, 1, 5)));
        assert_eq!(parse_wire_date("2030-01-05T00:00:00+09:00"), Ok(date(2030, 1, 5)));
        assert_eq!(parse_wire_date("2030-01-05T23:00:00-03:00"), Ok(date(2030, 1, 5)));
        assert!(parse_wire_date("05/01/2030").is_err());
    }

    #[test]
    fn test_missing_terms_mean_nothing_available() {
        let json = r#"{"id": 1, "userID": 2, "availableTerms": null, "acceptReservationType": "MANUAL"}"#;
        let info: AccommodationInfo = serde_json::from_str::<AccommodationDto>(json)
            .unwrap()
            .into_domain()
            .unwrap();
        assert!(info.available_terms().is_empty());
        assert_eq!(info.acceptance_policy(), AcceptancePolicy::Manual);
    }

    #[test]
    fn test_unknown_policy_is_invalid_response() {
        let json = r#"{"id": 1, "userID": 2, "acceptReservationType": "SOMETIMES"}"#;
        let dto: AccommodationDto = serde_json::from_str(json).unwrap();
        assert!(matches!(
            dto.into_domain(),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_reserved_term_body_uses_midnight_utc() {
        let body = CreateReservedTermDto {
            start_date: midnight_utc(date(2030, 1, 1)),
            end_date: midnight_utc(date(2030, 1, 5)),
            accommodation_id: 3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["startDate"], "2030-01-01T00:00:00Z");
        assert_eq!(json["endDate"], "2030-01-05T00:00:00Z");
        assert_eq!(json["accommodationId"], 3);
    }
}
