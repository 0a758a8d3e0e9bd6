use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{
    AccommodationId, ReservationDraft, ReservationRequest, ReservationRequestId,
    ReservationStatus, StayPeriod, UserId,
};
use crate::domain::port::{
    AvailabilityOracle, Clock, RepositoryError, ReservationRequestRepository,
    TermReservationGateway,
};
use crate::domain::service::{ConflictDetector, TermAttachment, TermReservationCoordinator};
use chrono::NaiveDate;
use std::sync::Arc;

mod authorization_service;
mod reservation_query_service;

pub use authorization_service::AuthorizationService;
pub use reservation_query_service::ReservationQueryService;

/// 予約リクエストアプリケーションサービス
/// 作成・承認・キャンセル・削除の各操作で、宿泊施設情報の取得、競合検出、
/// 状態遷移、永続化、予約済み期間の調整を順に実行する
pub struct ReservationRequestService {
    reservation_request_repository: Arc<dyn ReservationRequestRepository>,
    availability_oracle: Arc<dyn AvailabilityOracle>,
    conflict_detector: ConflictDetector,
    term_coordinator: TermReservationCoordinator,
    clock: Arc<dyn Clock>,
}

impl ReservationRequestService {
    /// 新しい予約リクエストアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `reservation_request_repository` - 予約リクエストリポジトリ
    /// * `availability_oracle` - 宿泊施設情報の取得元
    /// * `term_gateway` - 予約済み期間の作成・削除先
    /// * `clock` - 現在日付の取得元
    pub fn new(
        reservation_request_repository: Arc<dyn ReservationRequestRepository>,
        availability_oracle: Arc<dyn AvailabilityOracle>,
        term_gateway: Arc<dyn TermReservationGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            conflict_detector: ConflictDetector::new(reservation_request_repository.clone()),
            term_coordinator: TermReservationCoordinator::new(term_gateway),
            reservation_request_repository,
            availability_oracle,
            clock,
        }
    }

    async fn find_existing(
        &self,
        id: ReservationRequestId,
    ) -> Result<ReservationRequest, ApplicationError> {
        self.reservation_request_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("予約リクエストが見つかりません: {}", id))
            })
    }

    /// 新しい予約リクエストを作成
    /// 宿泊施設の受付方針が自動承認の場合は、作成と同時に予約済み期間を作成する
    ///
    /// # Arguments
    /// * `guest_id` - 予約するゲストのID
    /// * `start_date` - 宿泊開始日
    /// * `nights` - 宿泊数
    /// * `accommodation_id` - 宿泊施設ID
    /// * `guest_number` - 宿泊人数
    ///
    /// # Returns
    /// * `Ok(ReservationRequest)` - 作成された予約リクエスト
    /// * `Err(ApplicationError)` - 検証・空き状況・競合のいずれかで失敗
    #[tracing::instrument(skip(self, guest_id, accommodation_id), fields(guest_id = %guest_id, accommodation_id = %accommodation_id))]
    pub async fn create(
        &self,
        guest_id: UserId,
        start_date: NaiveDate,
        nights: i64,
        accommodation_id: AccommodationId,
        guest_number: u32,
    ) -> Result<ReservationRequest, ApplicationError> {
        let stay = StayPeriod::from_nights(start_date, nights)?;
        stay.ensure_not_in_past(self.clock.today())?;

        let accommodation = self.availability_oracle.fetch(accommodation_id).await?;
        accommodation.ensure_guest_count(guest_number)?;
        accommodation.ensure_available(&stay)?;

        let accepted = self
            .conflict_detector
            .find_accepted_overlaps(accommodation_id)
            .await?;
        ConflictDetector::ensure_no_overlap(&stay, &accepted, None)?;

        let draft = ReservationDraft::submit(stay, guest_id, guest_number, &accommodation);
        let mut request = self.reservation_request_repository.insert(draft).await?;
        tracing::info!(
            reservation_request_id = %request.id(),
            status = %request.status(),
            "予約リクエストを作成しました"
        );

        if request.status() == ReservationStatus::Accepted {
            if let TermAttachment::Attached(reserved_term_id) = self.attach_term(&request).await {
                request.attach_reserved_term(reserved_term_id);
            }
        }

        Ok(request)
    }

    /// 予約リクエストを承認
    /// 期間が重複する他のSUBMITTED状態の予約リクエストは一括で却下する
    ///
    /// # Arguments
    /// * `id` - 予約リクエストID
    /// * `host_id` - 承認するホストのID
    ///
    /// # Returns
    /// * `Ok(ReservationRequest)` - 承認された予約リクエスト
    /// * `Err(ApplicationError)` - 承認失敗
    #[tracing::instrument(skip(self, id, host_id), fields(reservation_request_id = %id, host_id = %host_id))]
    pub async fn accept(
        &self,
        id: ReservationRequestId,
        host_id: UserId,
    ) -> Result<ReservationRequest, ApplicationError> {
        let mut request = self.find_existing(id).await?;
        request.accept(host_id)?;

        let accepted = self
            .conflict_detector
            .find_accepted_overlaps(request.accommodation_id())
            .await?;
        ConflictDetector::ensure_no_overlap(&request.stay(), &accepted, Some(id))?;

        self.reservation_request_repository
            .update_status(id, ReservationStatus::Accepted)
            .await?;
        let declined = self
            .reservation_request_repository
            .decline_overlapping(request.accommodation_id(), &request.stay())
            .await;

        // ACCEPTEDは保存済みなので、一括却下に失敗しても予約済み期間は作成する
        // 残ったSUBMITTEDの予約リクエストは承認時の再検出で競合になる
        let attachment = self.attach_term(&request).await;

        let declined = declined.map_err(|e| {
            tracing::error!(
                reservation_request_id = %id,
                error = %e,
                "重複する予約リクエストの却下に失敗しました"
            );
            e
        })?;
        tracing::info!(declined, "予約リクエストを承認しました");

        if let TermAttachment::Attached(reserved_term_id) = attachment {
            request.attach_reserved_term(reserved_term_id);
        }

        Ok(request)
    }

    /// 予約をキャンセル
    /// ローカルの状態をCANCELLEDにした後、予約済み期間の削除を試みる
    ///
    /// # Arguments
    /// * `id` - 予約リクエストID
    /// * `guest_id` - キャンセルするゲストのID
    ///
    /// # Returns
    /// * `Ok(ReservationRequest)` - キャンセルされた予約リクエスト
    /// * `Err(ApplicationError)` - キャンセル失敗
    #[tracing::instrument(skip(self, id, guest_id), fields(reservation_request_id = %id, guest_id = %guest_id))]
    pub async fn cancel(
        &self,
        id: ReservationRequestId,
        guest_id: UserId,
    ) -> Result<ReservationRequest, ApplicationError> {
        let mut request = self.find_existing(id).await?;
        request.cancel(guest_id, self.clock.today())?;

        self.reservation_request_repository
            .update_status(id, ReservationStatus::Cancelled)
            .await?;
        tracing::info!("予約をキャンセルしました");

        self.term_coordinator.release(&request).await;

        Ok(request)
    }

    /// 承認前の予約リクエストを削除
    ///
    /// # Arguments
    /// * `id` - 予約リクエストID
    /// * `guest_id` - 削除するゲストのID
    #[tracing::instrument(skip(self, id, guest_id), fields(reservation_request_id = %id, guest_id = %guest_id))]
    pub async fn delete(
        &self,
        id: ReservationRequestId,
        guest_id: UserId,
    ) -> Result<(), ApplicationError> {
        let request = self.find_existing(id).await?;
        request.ensure_deletable_by(guest_id)?;

        let deleted = self.reservation_request_repository.delete_by_id(id).await?;
        if !deleted {
            return Err(RepositoryError::OperationFailed(format!(
                "予約リクエストの削除に失敗しました: {}",
                id
            ))
            .into());
        }

        tracing::info!("予約リクエストを削除しました");
        Ok(())
    }

    /// 承認済み予約リクエストに予約済み期間を紐付ける
    /// 作成・承認時に紐付けに失敗した予約リクエストの再調整に使用する。
    /// すでに紐付いている場合は外部サービスを呼び出さずにそのIDを返す
    ///
    /// # Returns
    /// * `Ok(TermAttachment)` - 紐付けの結果（失敗も含む）
    /// * `Err(ApplicationError)` - 予約リクエストが存在しない、または承認済みでない
    #[tracing::instrument(skip(self, id), fields(reservation_request_id = %id))]
    pub async fn attach_external_term(
        &self,
        id: ReservationRequestId,
    ) -> Result<TermAttachment, ApplicationError> {
        let request = self.find_existing(id).await?;

        if request.status() != ReservationStatus::Accepted {
            return Err(DomainError::InvalidState(format!(
                "予約済み期間を紐付けられるのはACCEPTED状態のみです（現在: {}）",
                request.status()
            ))
            .into());
        }

        if let Some(reserved_term_id) = request.reserved_term_id() {
            return Ok(TermAttachment::Attached(reserved_term_id));
        }

        Ok(self.attach_term(&request).await)
    }

    // 外部サービスの失敗はローカルの状態遷移を取り消さない
    async fn attach_term(&self, request: &ReservationRequest) -> TermAttachment {
        let reserved_term_id = match self.term_coordinator.reserve(request).await {
            Ok(reserved_term_id) => reserved_term_id,
            Err(e) => {
                tracing::warn!(
                    reservation_request_id = %request.id(),
                    error = %e,
                    "予約済み期間の作成に失敗しました"
                );
                return TermAttachment::Failed(e.to_string());
            }
        };

        match self
            .reservation_request_repository
            .update_reserved_term(request.id(), reserved_term_id)
            .await
        {
            Ok(()) => TermAttachment::Attached(reserved_term_id),
            Err(e) => {
                tracing::warn!(
                    reservation_request_id = %request.id(),
                    reserved_term_id = %reserved_term_id,
                    error = %e,
                    "予約済み期間IDの保存に失敗しました"
                );
                TermAttachment::Failed(e.to_string())
            }
        }
    }
}
