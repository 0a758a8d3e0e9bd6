use crate::domain::error::DomainError;
use crate::domain::model::{AccommodationId, ReservationStatus, StayPeriod, UserId};
use chrono::NaiveDate;

/// 宿泊施設の予約受付方針
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptancePolicy {
    /// ホストが手動で承認する
    Manual,
    /// 作成と同時に自動で承認する
    Automatic,
}

impl AcceptancePolicy {
    /// 新しい予約リクエストの初期ステータスを決定
    pub fn initial_status(&self) -> ReservationStatus {
        match self {
            AcceptancePolicy::Manual => ReservationStatus::Submitted,
            AcceptancePolicy::Automatic => ReservationStatus::Accepted,
        }
    }
}

/// 宿泊施設の空き期間
/// 半開区間 [start, end) で、startの日は空きに含まれ、endの日は含まれない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailableTerm {
    start: NaiveDate,
    end: NaiveDate,
}

impl AvailableTerm {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 指定日がこの空き期間に含まれるか判定
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }
}

/// 宿泊施設サービスから取得した宿泊施設情報のスナップショット
/// ローカルには永続化せず、予約リクエスト作成のたびに取得する
#[derive(Debug, Clone, PartialEq)]
pub struct AccommodationInfo {
    id: AccommodationId,
    min_guests: u32,
    max_guests: u32,
    available_terms: Vec<AvailableTerm>,
    owner_id: UserId,
    acceptance_policy: AcceptancePolicy,
    name: String,
}

impl AccommodationInfo {
    pub fn new(
        id: AccommodationId,
        min_guests: u32,
        max_guests: u32,
        available_terms: Vec<AvailableTerm>,
        owner_id: UserId,
        acceptance_policy: AcceptancePolicy,
        name: String,
    ) -> Self {
        Self {
            id,
            min_guests,
            max_guests,
            available_terms,
            owner_id,
            acceptance_policy,
            name,
        }
    }

    pub fn id(&self) -> AccommodationId {
        self.id
    }

    pub fn min_guests(&self) -> u32 {
        self.min_guests
    }

    pub fn max_guests(&self) -> u32 {
        self.max_guests
    }

    pub fn available_terms(&self) -> &[AvailableTerm] {
        &self.available_terms
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn acceptance_policy(&self) -> AcceptancePolicy {
        self.acceptance_policy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 指定日がいずれかの空き期間に含まれるか判定
    pub fn is_day_available(&self, day: NaiveDate) -> bool {
        self.available_terms.iter().any(|term| term.contains(day))
    }

    /// 宿泊期間のすべての日が空き期間に含まれることを確認
    /// 空き期間同士は連続・結合している必要はなく、日ごとに判定する
    pub fn ensure_available(&self, stay: &StayPeriod) -> Result<(), DomainError> {
        match stay.days().find(|day| !self.is_day_available(*day)) {
            Some(day) => Err(DomainError::Unavailable(format!(
                "{} は宿泊施設 {} の空き期間に含まれていません",
                day, self.id
            ))),
            None => Ok(()),
        }
    }

    /// 宿泊人数が施設の受け入れ範囲内であることを確認
    /// 最大人数が0の場合は上限・下限を判定しない
    pub fn ensure_guest_count(&self, guest_number: u32) -> Result<(), DomainError> {
        if guest_number == 0 {
            return Err(DomainError::Validation(
                "宿泊人数は1以上である必要があります".to_string(),
            ));
        }

        if self.max_guests > 0 && (guest_number < self.min_guests || guest_number > self.max_guests)
        {
            return Err(DomainError::Validation(format!(
                "宿泊人数は{}人から{}人の範囲である必要があります",
                self.min_guests, self.max_guests
            )));
        }

        Ok(())
    }
}
