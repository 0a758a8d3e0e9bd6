use crate::application::ApplicationError;
use crate::domain::model::{AccommodationId, ReservationRequest, ReservationStatus, UserId};
use crate::domain::port::{Clock, ReservationRequestRepository};
use std::sync::Arc;

/// 予約リクエストクエリサービス
/// 読み取り専用の予約リクエスト操作を提供する
pub struct ReservationQueryService {
    reservation_request_repository: Arc<dyn ReservationRequestRepository>,
    clock: Arc<dyn Clock>,
}

impl ReservationQueryService {
    /// 新しい予約リクエストクエリサービスを作成
    ///
    /// # Arguments
    /// * `reservation_request_repository` - 予約リクエストリポジトリ
    /// * `clock` - 現在日付の取得元
    pub fn new(
        reservation_request_repository: Arc<dyn ReservationRequestRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reservation_request_repository,
            clock,
        }
    }

    /// ゲストの有効な（承認済みで終了していない）予約を取得
    pub async fn get_active_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<ReservationRequest>, ApplicationError> {
        self.reservation_request_repository
            .find_active_by_guest(guest_id, self.clock.today())
            .await
            .map_err(ApplicationError::from)
    }

    /// ゲストのすべての予約リクエストを取得
    pub async fn get_all_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<ReservationRequest>, ApplicationError> {
        self.reservation_request_repository
            .find_all_by_guest(guest_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// オーナーの有効な（承認済みで終了していない）予約を取得
    pub async fn get_active_by_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<ReservationRequest>, ApplicationError> {
        self.reservation_request_repository
            .find_active_by_owner(owner_id, self.clock.today())
            .await
            .map_err(ApplicationError::from)
    }

    /// オーナーの予約リクエストを取得
    /// ステータスを指定しない場合はすべてのステータスを対象にする
    ///
    /// # Arguments
    /// * `owner_id` - オーナーのID
    /// * `status` - フィルタリングするステータス（オプション）
    pub async fn get_by_owner(
        &self,
        owner_id: UserId,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<ReservationRequest>, ApplicationError> {
        let statuses: Vec<ReservationStatus> = match status {
            Some(status) => vec![status],
            None => ReservationStatus::ALL.to_vec(),
        };

        self.reservation_request_repository
            .find_by_owner_and_statuses(owner_id, &statuses)
            .await
            .map_err(ApplicationError::from)
    }

    /// ゲストがキャンセルした予約の件数を取得
    pub async fn count_cancelled(&self, guest_id: UserId) -> Result<u64, ApplicationError> {
        self.reservation_request_repository
            .count_by_guest_and_status(guest_id, ReservationStatus::Cancelled)
            .await
            .map_err(ApplicationError::from)
    }

    /// ゲストが指定したホストの施設に宿泊したことがあるか判定
    /// 承認済みで宿泊が終了している予約のみを対象にする
    pub async fn was_guest_hosted_by(
        &self,
        guest_id: UserId,
        host_id: UserId,
    ) -> Result<bool, ApplicationError> {
        let completed = self.completed_stays(guest_id).await?;
        Ok(completed.iter().any(|request| request.owner_id() == host_id))
    }

    /// ゲストが指定した宿泊施設に宿泊したことがあるか判定
    /// 承認済みで宿泊が終了している予約のみを対象にする
    pub async fn was_guest_at_accommodation(
        &self,
        guest_id: UserId,
        accommodation_id: AccommodationId,
    ) -> Result<bool, ApplicationError> {
        let completed = self.completed_stays(guest_id).await?;
        Ok(completed
            .iter()
            .any(|request| request.accommodation_id() == accommodation_id))
    }

    async fn completed_stays(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<ReservationRequest>, ApplicationError> {
        let today = self.clock.today();
        let requests = self
            .reservation_request_repository
            .find_all_by_guest(guest_id)
            .await?;

        Ok(requests
            .into_iter()
            .filter(|request| {
                request.status() == ReservationStatus::Accepted
                    && request.stay().has_ended_by(today)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryReservationRequestRepository;
    use crate::domain::model::{
        AcceptancePolicy, AccommodationInfo, AvailableTerm, ReservationDraft, StayPeriod,
    };
    use chrono::NaiveDate;

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn accommodation(id: u64, owner: u64, policy: AcceptancePolicy) -> AccommodationInfo {
        AccommodationInfo::new(
            AccommodationId::new(id),
            1,
            4,
            vec![AvailableTerm::new(date(2030, 1, 1), date(2030, 12, 31))],
            UserId::new(owner),
            policy,
            format!("Accommodation {}", id),
        )
    }

    async fn seed(
        repository: &InMemoryReservationRequestRepository,
        start: NaiveDate,
        nights: i64,
        guest: u64,
        info: &AccommodationInfo,
    ) -> ReservationRequest {
        let stay = StayPeriod::from_nights(start, nights).unwrap();
        repository
            .insert(ReservationDraft::submit(stay, UserId::new(guest), 2, info))
            .await
            .unwrap()
    }

    fn service(
        repository: Arc<InMemoryReservationRequestRepository>,
        today: NaiveDate,
    ) -> ReservationQueryService {
        ReservationQueryService::new(repository, Arc::new(FixedClock(today)))
    }

    #[tokio::test]
    async fn test_active_by_guest_excludes_finished_and_unaccepted() {
        let repository = Arc::new(InMemoryReservationRequestRepository::new());
        let automatic = accommodation(1, 10, AcceptancePolicy::Automatic);
        let manual = accommodation(2, 10, AcceptancePolicy::Manual);

        seed(&repository, date(2030, 3, 1), 2, 5, &automatic).await;
        seed(&repository, date(2030, 6, 1), 2, 5, &automatic).await;
        seed(&repository, date(2030, 6, 1), 2, 5, &manual).await;

        let service = service(repository, date(2030, 5, 1));
        let active = service.get_active_by_guest(UserId::new(5)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].stay().start(), date(2030, 6, 1));

        let all = service.get_all_by_guest(UserId::new(5)).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_get_by_owner_with_and_without_status() {
        let repository = Arc::new(InMemoryReservationRequestRepository::new());
        let automatic = accommodation(1, 10, AcceptancePolicy::Automatic);
        let manual = accommodation(2, 10, AcceptancePolicy::Manual);

        seed(&repository, date(2030, 3, 1), 2, 5, &automatic).await;
        seed(&repository, date(2030, 4, 1), 2, 6, &manual).await;

        let service = service(repository, date(2030, 1, 1));
        let all = service.get_by_owner(UserId::new(10), None).await.unwrap();
        assert_eq!(all.len(), 2);

        let submitted = service
            .get_by_owner(UserId::new(10), Some(ReservationStatus::Submitted))
            .await
            .unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].guest_id(), UserId::new(6));
    }

    #[tokio::test]
    async fn test_count_cancelled() {
        let repository = Arc::new(InMemoryReservationRequestRepository::new());
        let automatic = accommodation(1, 10, AcceptancePolicy::Automatic);

        let first = seed(&repository, date(2030, 3, 1), 2, 5, &automatic).await;
        seed(&repository, date(2030, 4, 1), 2, 5, &automatic).await;
        repository
            .update_status(first.id(), ReservationStatus::Cancelled)
            .await
            .unwrap();

        let service = service(repository, date(2030, 1, 1));
        assert_eq!(service.count_cancelled(UserId::new(5)).await.unwrap(), 1);
        assert_eq!(service.count_cancelled(UserId::new(6)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_checks_require_finished_accepted_stay() {
        let repository = Arc::new(InMemoryReservationRequestRepository::new());
        let finished = accommodation(1, 10, AcceptancePolicy::Automatic);
        let upcoming = accommodation(2, 11, AcceptancePolicy::Automatic);
        let pending = accommodation(3, 12, AcceptancePolicy::Manual);

        seed(&repository, date(2030, 3, 1), 2, 5, &finished).await;
        seed(&repository, date(2030, 6, 1), 2, 5, &upcoming).await;
        seed(&repository, date(2030, 3, 1), 2, 5, &pending).await;

        let service = service(repository, date(2030, 3, 3));
        let guest = UserId::new(5);

        assert!(service.was_guest_hosted_by(guest, UserId::new(10)).await.unwrap());
        assert!(!service.was_guest_hosted_by(guest, UserId::new(11)).await.unwrap());
        assert!(!service.was_guest_hosted_by(guest, UserId::new(12)).await.unwrap());

        assert!(service
            .was_guest_at_accommodation(guest, AccommodationId::new(1))
            .await
            .unwrap());
        assert!(!service
            .was_guest_at_accommodation(guest, AccommodationId::new(2))
            .await
            .unwrap());
    }
}
