use crate::domain::error::DomainError;
use crate::domain::model::{
    AccommodationId, AccommodationInfo, ReservationRequestId, ReservationStatus, ReservedTermId,
    StayPeriod, UserId,
};
use chrono::NaiveDate;

/// IDが割り当てられる前の予約リクエスト
/// リポジトリへの挿入時にIDが割り当てられ、ReservationRequestになる
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDraft {
    stay: StayPeriod,
    accommodation_id: AccommodationId,
    guest_id: UserId,
    owner_id: UserId,
    guest_number: u32,
    status: ReservationStatus,
    accommodation_name: String,
}

impl ReservationDraft {
    /// 宿泊施設情報から新しい予約リクエストを作成
    /// 初期ステータスは施設の受付方針で決まる（手動ならSUBMITTED、自動ならACCEPTED）
    pub fn submit(
        stay: StayPeriod,
        guest_id: UserId,
        guest_number: u32,
        accommodation: &AccommodationInfo,
    ) -> Self {
        Self {
            stay,
            accommodation_id: accommodation.id(),
            guest_id,
            owner_id: accommodation.owner_id(),
            guest_number,
            status: accommodation.acceptance_policy().initial_status(),
            accommodation_name: accommodation.name().to_string(),
        }
    }

    pub fn stay(&self) -> StayPeriod {
        self.stay
    }

    pub fn accommodation_id(&self) -> AccommodationId {
        self.accommodation_id
    }

    pub fn guest_id(&self) -> UserId {
        self.guest_id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn guest_number(&self) -> u32 {
        self.guest_number
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn accommodation_name(&self) -> &str {
        &self.accommodation_name
    }

    /// IDを割り当てて予約リクエスト集約にする
    pub fn into_request(self, id: ReservationRequestId) -> ReservationRequest {
        ReservationRequest {
            id,
            stay: self.stay,
            accommodation_id: self.accommodation_id,
            guest_id: self.guest_id,
            owner_id: self.owner_id,
            guest_number: self.guest_number,
            status: self.status,
            reserved_term_id: None,
            accommodation_name: self.accommodation_name,
        }
    }
}

/// 予約リクエスト集約
/// ステータス遷移（承認・キャンセル・削除）の事前条件を管理する
///
/// SUBMITTED → ACCEPTED | DECLINED、ACCEPTED → CANCELLED の遷移のみ許可する。
/// DECLINEDとCANCELLEDは終端状態で、履歴として残る。
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRequest {
    id: ReservationRequestId,
    stay: StayPeriod,
    accommodation_id: AccommodationId,
    guest_id: UserId,
    owner_id: UserId,
    guest_number: u32,
    status: ReservationStatus,
    reserved_term_id: Option<ReservedTermId>,
    accommodation_name: String,
}

impl ReservationRequest {
    /// データベースから取得したデータで予約リクエストを再構築
    /// リポジトリでの使用を想定
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: ReservationRequestId,
        stay: StayPeriod,
        accommodation_id: AccommodationId,
        guest_id: UserId,
        owner_id: UserId,
        guest_number: u32,
        status: ReservationStatus,
        reserved_term_id: Option<ReservedTermId>,
        accommodation_name: String,
    ) -> Self {
        Self {
            id,
            stay,
            accommodation_id,
            guest_id,
            owner_id,
            guest_number,
            status,
            reserved_term_id,
            accommodation_name,
        }
    }

    pub fn id(&self) -> ReservationRequestId {
        self.id
    }

    pub fn stay(&self) -> StayPeriod {
        self.stay
    }

    pub fn accommodation_id(&self) -> AccommodationId {
        self.accommodation_id
    }

    pub fn guest_id(&self) -> UserId {
        self.guest_id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn guest_number(&self) -> u32 {
        self.guest_number
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn reserved_term_id(&self) -> Option<ReservedTermId> {
        self.reserved_term_id
    }

    pub fn accommodation_name(&self) -> &str {
        &self.accommodation_name
    }

    /// 承認済みかつ宿泊が終了していない予約か判定
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.status == ReservationStatus::Accepted && self.stay.end() >= today
    }

    /// 予約リクエストを承認
    /// 事前条件:
    /// - 呼び出し元が宿泊施設のオーナー
    /// - ステータスがSUBMITTED
    pub fn accept(&mut self, host_id: UserId) -> Result<(), DomainError> {
        if self.owner_id != host_id {
            return Err(DomainError::AccessDenied(format!(
                "ホスト {} はこの予約リクエストにアクセスできません",
                host_id
            )));
        }

        if self.status != ReservationStatus::Submitted {
            return Err(DomainError::InvalidState(format!(
                "承認できるのはSUBMITTED状態のみです（現在: {}）",
                self.status
            )));
        }

        self.status = ReservationStatus::Accepted;
        Ok(())
    }

    /// 予約リクエストを却下
    /// 重複する予約が先に承認された場合に使用する
    pub fn decline(&mut self) -> Result<(), DomainError> {
        if self.status != ReservationStatus::Submitted {
            return Err(DomainError::InvalidState(format!(
                "却下できるのはSUBMITTED状態のみです（現在: {}）",
                self.status
            )));
        }

        self.status = ReservationStatus::Declined;
        Ok(())
    }

    /// 予約をキャンセル
    /// 事前条件:
    /// - 呼び出し元が予約したゲスト
    /// - ステータスがACCEPTED
    /// - 開始日が1か月以上前ではない
    pub fn cancel(&mut self, guest_id: UserId, today: NaiveDate) -> Result<(), DomainError> {
        if self.guest_id != guest_id {
            return Err(DomainError::AccessDenied(format!(
                "ゲスト {} はこの予約リクエストにアクセスできません",
                guest_id
            )));
        }

        if self.status != ReservationStatus::Accepted {
            return Err(DomainError::InvalidState(format!(
                "キャンセルできるのはACCEPTED状態のみです（現在: {}）",
                self.status
            )));
        }

        if self.stay.started_more_than_a_month_before(today) {
            return Err(DomainError::InvalidState(
                "開始日から1か月以上経過した予約はキャンセルできません".to_string(),
            ));
        }

        self.status = ReservationStatus::Cancelled;
        Ok(())
    }

    /// 予約リクエストを削除できるか確認
    /// 事前条件:
    /// - 呼び出し元が予約したゲスト
    /// - ステータスがSUBMITTED（一度も承認されていない）
    pub fn ensure_deletable_by(&self, guest_id: UserId) -> Result<(), DomainError> {
        if self.guest_id != guest_id {
            return Err(DomainError::AccessDenied(format!(
                "ゲスト {} はこの予約リクエストにアクセスできません",
                guest_id
            )));
        }

        if self.status != ReservationStatus::Submitted {
            return Err(DomainError::InvalidState(format!(
                "削除できるのはSUBMITTED状態のみです（現在: {}）",
                self.status
            )));
        }

        Ok(())
    }

    /// 宿泊施設サービス側の予約済み期間を紐付ける
    pub fn attach_reserved_term(&mut self, reserved_term_id: ReservedTermId) {
        self.reserved_term_id = Some(reserved_term_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AcceptancePolicy, AvailableTerm};

    const HOST: u64 = 10;
    const GUEST: u64 = 20;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn accommodation(policy: AcceptancePolicy) -> AccommodationInfo {
        AccommodationInfo::new(
            AccommodationId::new(3),
            1,
            4,
            vec![AvailableTerm::new(date(2030, 1, 1), date(2030, 2, 1))],
            UserId::new(HOST),
            policy,
            "Mountain Lodge".to_string(),
        )
    }

    fn request_with_status(status: ReservationStatus) -> ReservationRequest {
        ReservationRequest::reconstruct(
            ReservationRequestId::generate(),
            StayPeriod::from_nights(date(2030, 1, 10), 3).unwrap(),
            AccommodationId::new(3),
            UserId::new(GUEST),
            UserId::new(HOST),
            2,
            status,
            None,
            "Mountain Lodge".to_string(),
        )
    }

    #[test]
    fn test_manual_policy_draft_is_submitted() {
        let stay = StayPeriod::from_nights(date(2030, 1, 10), 3).unwrap();
        let draft = ReservationDraft::submit(
            stay,
            UserId::new(GUEST),
            2,
            &accommodation(AcceptancePolicy::Manual),
        );

        assert_eq!(draft.status(), ReservationStatus::Submitted);
        assert_eq!(draft.owner_id(), UserId::new(HOST));
        assert_eq!(draft.accommodation_name(), "Mountain Lodge");
    }

    #[test]
    fn test_automatic_policy_draft_is_accepted() {
        let stay = StayPeriod::from_nights(date(2030, 1, 10), 3).unwrap();
        let draft = ReservationDraft::submit(
            stay,
            UserId::new(GUEST),
            2,
            &accommodation(AcceptancePolicy::Automatic),
        );

        assert_eq!(draft.status(), ReservationStatus::Accepted);
        let request = draft.into_request(ReservationRequestId::generate());
        assert!(request.reserved_term_id().is_none());
    }

    #[test]
    fn test_accept_submitted_request() {
        let mut request = request_with_status(ReservationStatus::Submitted);
        assert!(request.accept(UserId::new(HOST)).is_ok());
        assert_eq!(request.status(), ReservationStatus::Accepted);
    }

    #[test]
    fn test_accept_by_other_host_fails() {
        let mut request = request_with_status(ReservationStatus::Submitted);
        let result = request.accept(UserId::new(HOST + 1));
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
        assert_eq!(request.status(), ReservationStatus::Submitted);
    }

    #[test]
    fn test_accept_non_submitted_request_fails() {
        for status in [
            ReservationStatus::Accepted,
            ReservationStatus::Declined,
            ReservationStatus::Cancelled,
        ] {
            let mut request = request_with_status(status);
            let result = request.accept(UserId::new(HOST));
            assert!(matches!(result, Err(DomainError::InvalidState(_))));
            assert_eq!(request.status(), status);
        }
    }

    #[test]
    fn test_decline_only_from_submitted() {
        let mut request = request_with_status(ReservationStatus::Submitted);
        assert!(request.decline().is_ok());
        assert_eq!(request.status(), ReservationStatus::Declined);
        assert!(request.decline().is_err());
    }

    #[test]
    fn test_cancel_accepted_request_within_grace_window() {
        let mut request = request_with_status(ReservationStatus::Accepted);
        let result = request.cancel(UserId::new(GUEST), date(2030, 2, 5));
        assert!(result.is_ok());
        assert_eq!(request.status(), ReservationStatus::Cancelled);
    }

    #[test]
    fn test_cancel_after_grace_window_fails() {
        let mut request = request_with_status(ReservationStatus::Accepted);
        let result = request.cancel(UserId::new(GUEST), date(2030, 2, 11));
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert_eq!(request.status(), ReservationStatus::Accepted);
    }

    #[test]
    fn test_cancel_by_other_guest_fails() {
        let mut request = request_with_status(ReservationStatus::Accepted);
        let result = request.cancel(UserId::new(GUEST + 1), date(2030, 1, 1));
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[test]
    fn test_cancel_submitted_request_fails() {
        let mut request = request_with_status(ReservationStatus::Submitted);
        let result = request.cancel(UserId::new(GUEST), date(2030, 1, 1));
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[test]
    fn test_delete_rules() {
        let submitted = request_with_status(ReservationStatus::Submitted);
        assert!(submitted.ensure_deletable_by(UserId::new(GUEST)).is_ok());
        assert!(matches!(
            submitted.ensure_deletable_by(UserId::new(GUEST + 1)),
            Err(DomainError::AccessDenied(_))
        ));

        let accepted = request_with_status(ReservationStatus::Accepted);
        assert!(matches!(
            accepted.ensure_deletable_by(UserId::new(GUEST)),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn test_is_active_on() {
        let accepted = request_with_status(ReservationStatus::Accepted);
        assert!(accepted.is_active_on(date(2030, 1, 13)));
        assert!(!accepted.is_active_on(date(2030, 1, 14)));

        let submitted = request_with_status(ReservationStatus::Submitted);
        assert!(!submitted.is_active_on(date(2030, 1, 1)));
    }
}
