use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

/// 予約リクエスト作成用のリクエストDTO
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequestBody {
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "numberOfDays")]
    pub number_of_days: i64,
    #[serde(rename = "accommodationID", alias = "accommodationId")]
    pub accommodation_id: u64,
    #[serde(rename = "guestNumber")]
    pub guest_number: u32,
}

impl CreateReservationRequestBody {
    /// 開始日を解析する
    /// "YYYY-MM-DD" とRFC 3339形式（送信元のオフセットでの日付）を受け付ける
    pub fn parse_start_date(&self) -> Option<NaiveDate> {
        if let Ok(date) = NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d") {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(&self.start_date)
            .ok()
            .map(|date_time| date_time.date_naive())
    }
}

/// オーナーの予約リクエスト一覧取得用のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct OwnerRequestsQueryParams {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(start_date: &str) -> CreateReservationRequestBody {
        CreateReservationRequestBody {
            start_date: start_date.to_string(),
            number_of_days: 3,
            accommodation_id: 1,
            guest_number: 2,
        }
    }

    #[test]
    fn test_create_body_field_names() {
        let json = r#"{"startDate": "2030-05-01", "numberOfDays": 3, "accommodationID": 4, "guestNumber": 2}"#;
        let parsed: CreateReservationRequestBody = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.number_of_days, 3);
        assert_eq!(parsed.accommodation_id, 4);
        assert_eq!(parsed.guest_number, 2);
    }

    #[test]
    fn test_parse_start_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2030, 5, 1);
        assert_eq!(body("2030-05-01").parse_start_date(), expected);
        assert_eq!(body("2030-05-01T00:00:00Z").parse_start_date(), expected);
        assert_eq!(body("2030-05-01T09:00:00+09:00").parse_start_date(), expected);
        assert_eq!(body("2030-05-01T00:00:00+09:00").parse_start_date(), expected);
        assert_eq!(body("2030-05-01T00:00:00+01:00").parse_start_date(), expected);
        assert_eq!(body("2030-05-01T23:30:00-05:00").parse_start_date(), expected);
        assert_eq!(body("May 1st").parse_start_date(), None);
    }
}
