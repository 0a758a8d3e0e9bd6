use crate::domain::model::{
    AccommodationId, ReservationDraft, ReservationRequest, ReservationRequestId,
    ReservationStatus, ReservedTermId, StayPeriod, UserId,
};
use crate::domain::port::{RepositoryError, ReservationRequestRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

/// インメモリ予約リクエストリポジトリ
/// MySQL実装と同じ問い合わせ結果を返す（テストとローカル実行用）
/// 挿入順を保持し、作成日時の新しい順の並びを再現する
#[derive(Default)]
pub struct InMemoryReservationRequestRepository {
    requests: Mutex<Vec<ReservationRequest>>,
}

impl InMemoryReservationRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, predicate: F) -> Vec<ReservationRequest>
    where
        F: Fn(&ReservationRequest) -> bool,
    {
        let requests = self.requests.lock().await;
        requests.iter().filter(|r| predicate(r)).cloned().collect()
    }

    fn sorted_by_start(mut requests: Vec<ReservationRequest>) -> Vec<ReservationRequest> {
        requests.sort_by_key(|r| r.stay().start());
        requests
    }

    fn newest_first(mut requests: Vec<ReservationRequest>) -> Vec<ReservationRequest> {
        requests.reverse();
        requests
    }
}

fn with_status(request: &ReservationRequest, status: ReservationStatus) -> ReservationRequest {
    ReservationRequest::reconstruct(
        request.id(),
        request.stay(),
        request.accommodation_id(),
        request.guest_id(),
        request.owner_id(),
        request.guest_number(),
        status,
        request.reserved_term_id(),
        request.accommodation_name().to_string(),
    )
}

#[async_trait]
impl ReservationRequestRepository for InMemoryReservationRequestRepository {
    async fn insert(&self, draft: ReservationDraft) -> Result<ReservationRequest, RepositoryError> {
        let request = draft.into_request(ReservationRequestId::generate());
        self.requests.lock().await.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(
        &self,
        id: ReservationRequestId,
    ) -> Result<Option<ReservationRequest>, RepositoryError> {
        let requests = self.requests.lock().await;
        Ok(requests.iter().find(|r| r.id() == id).cloned())
    }

    async fn delete_by_id(&self, id: ReservationRequestId) -> Result<bool, RepositoryError> {
        let mut requests = self.requests.lock().await;
        let before = requests.len();
        requests.retain(|r| r.id() != id);
        Ok(requests.len() < before)
    }

    async fn find_accepted_by_accommodation(
        &self,
        accommodation_id: AccommodationId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let found = self
            .select(|r| {
                r.accommodation_id() == accommodation_id
                    && r.status() == ReservationStatus::Accepted
            })
            .await;
        Ok(Self::sorted_by_start(found))
    }

    async fn find_active_by_guest(
        &self,
        guest_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let found = self
            .select(|r| r.guest_id() == guest_id && r.is_active_on(today))
            .await;
        Ok(Self::sorted_by_start(found))
    }

    async fn find_active_by_owner(
        &self,
        owner_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let found = self
            .select(|r| r.owner_id() == owner_id && r.is_active_on(today))
            .await;
        Ok(Self::sorted_by_start(found))
    }

    async fn find_all_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let found = self.select(|r| r.guest_id() == guest_id).await;
        Ok(Self::newest_first(found))
    }

    async fn find_by_owner_and_statuses(
        &self,
        owner_id: UserId,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let found = self
            .select(|r| r.owner_id() == owner_id && statuses.contains(&r.status()))
            .await;
        Ok(Self::newest_first(found))
    }

    async fn decline_overlapping(
        &self,
        accommodation_id: AccommodationId,
        stay: &StayPeriod,
    ) -> Result<u64, RepositoryError> {
        let mut requests = self.requests.lock().await;
        let mut declined = 0;

        for request in requests.iter_mut().filter(|r| {
            r.accommodation_id() == accommodation_id
                && r.status() == ReservationStatus::Submitted
                && r.stay().overlaps(stay)
        }) {
            request
                .decline()
                .map_err(|e| RepositoryError::OperationFailed(e.to_string()))?;
            declined += 1;
        }

        Ok(declined)
    }

    async fn update_status(
        &self,
        id: ReservationRequestId,
        status: ReservationStatus,
    ) -> Result<(), RepositoryError> {
        let mut requests = self.requests.lock().await;
        if let Some(request) = requests.iter_mut().find(|r| r.id() == id) {
            *request = with_status(request, status);
        }
        Ok(())
    }

    async fn update_reserved_term(
        &self,
        id: ReservationRequestId,
        reserved_term_id: ReservedTermId,
    ) -> Result<(), RepositoryError> {
        let mut requests = self.requests.lock().await;
        if let Some(request) = requests.iter_mut().find(|r| r.id() == id) {
            request.attach_reserved_term(reserved_term_id);
        }
        Ok(())
    }

    async fn count_by_guest_and_status(
        &self,
        guest_id: UserId,
        status: ReservationStatus,
    ) -> Result<u64, RepositoryError> {
        let requests = self.requests.lock().await;
        Ok(requests
            .iter()
            .filter(|r| r.guest_id() == guest_id && r.status() == status)
            .count() as u64)
    }
}
