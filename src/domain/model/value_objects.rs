use crate::domain::error::DomainError;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 予約リクエストの一意識別子
/// 12バイトの不透明な値で、24文字の16進数として表現する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReservationRequestId([u8; 12]);

impl ReservationRequestId {
    /// 新しい一意のReservationRequestIdを生成
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(&Uuid::new_v4().as_bytes()[..12]);
        Self(bytes)
    }

    /// 24文字の16進数文字列からReservationRequestIdを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        if s.len() != 24 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::Validation(format!(
                "予約リクエストIDは24文字の16進数である必要があります: {}",
                s
            )));
        }

        let mut bytes = [0u8; 12];
        for (index, byte) in bytes.iter_mut().enumerate() {
            let pair = &s[index * 2..index * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|e| {
                DomainError::Validation(format!("予約リクエストIDの解析に失敗しました: {}", e))
            })?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ReservationRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// ユーザー（ゲストまたはホスト）の識別子
/// ユーザーサービスが発行する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 宿泊施設の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccommodationId(u64);

impl AccommodationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccommodationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 宿泊施設サービス側の予約済み期間レコードの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservedTermId(u64);

impl ReservedTermId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReservedTermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 宿泊期間を表す値オブジェクト
/// 半開区間 [start, end) で、endはチェックアウト日（宿泊しない日）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StayPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl StayPeriod {
    /// 開始日と宿泊数から宿泊期間を作成
    /// 宿泊数は1以上である必要がある
    pub fn from_nights(start: NaiveDate, nights: i64) -> Result<Self, DomainError> {
        if nights < 1 {
            return Err(DomainError::Validation(
                "宿泊数は1以上である必要があります".to_string(),
            ));
        }

        let end = start.checked_add_days(Days::new(nights as u64)).ok_or_else(|| {
            DomainError::Validation("宿泊期間が日付の範囲を超えています".to_string())
        })?;

        Ok(Self { start, end })
    }

    /// 永続化された開始日と終了日から宿泊期間を再構築
    pub fn reconstruct(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::Validation(format!(
                "終了日は開始日より後である必要があります: {} - {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 開始日を取得
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// 終了日（チェックアウト日）を取得
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 宿泊数を取得
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// 宿泊する各日を開始日から順に返す
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day < end)
    }

    /// 2つの宿泊期間が重複しているか判定
    /// 半開区間同士なので s1 < e2 かつ s2 < e1 のときのみ重複する
    pub fn overlaps(&self, other: &StayPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 開始日が過去でないことを確認
    pub fn ensure_not_in_past(&self, today: NaiveDate) -> Result<(), DomainError> {
        if self.start < today {
            return Err(DomainError::Validation(
                "開始日を過去に設定することはできません".to_string(),
            ));
        }
        Ok(())
    }

    /// 開始日が今日から1か月以上前か判定
    /// キャンセル可能期限の判定に使用する
    pub fn started_more_than_a_month_before(&self, today: NaiveDate) -> bool {
        match today.checked_sub_months(Months::new(1)) {
            Some(cutoff) => self.start < cutoff,
            None => false,
        }
    }

    /// 宿泊が終了しているか判定（終了日が今日以前）
    pub fn has_ended_by(&self, today: NaiveDate) -> bool {
        self.end <= today
    }
}

impl fmt::Display for StayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// 予約リクエストのステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    /// 申請中（ホストの承認待ち）
    Submitted,
    /// 承認済み
    Accepted,
    /// 却下済み
    Declined,
    /// キャンセル済み
    Cancelled,
}

impl ReservationStatus {
    /// すべてのステータス
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Accepted,
        ReservationStatus::Submitted,
        ReservationStatus::Declined,
        ReservationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Submitted => "SUBMITTED",
            ReservationStatus::Accepted => "ACCEPTED",
            ReservationStatus::Declined => "DECLINED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    /// 文字列からReservationStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "SUBMITTED" => Ok(ReservationStatus::Submitted),
            "ACCEPTED" => Ok(ReservationStatus::Accepted),
            "DECLINED" => Ok(ReservationStatus::Declined),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            _ => Err(DomainError::Validation(format!(
                "無効な予約ステータス: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ユーザーのロール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Host,
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Host => "HOST",
            UserRole::Guest => "GUEST",
        }
    }

    /// 文字列からUserRoleを作成
    /// ユーザーサービスが返すロール文字列のみを受け付ける
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "HOST" => Some(UserRole::Host),
            "GUEST" => Some(UserRole::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
