// ドメインサービス
// 複数の予約リクエストや外部サービスにまたがるビジネスロジックを実装

use crate::domain::error::DomainError;
use crate::domain::model::{
    AccommodationId, ReservationRequest, ReservationRequestId, ReservedTermId, StayPeriod,
};
use crate::domain::port::{
    GatewayError, RepositoryError, ReservationRequestRepository, TermReservationGateway,
};
use std::sync::Arc;

/// 競合検出サービス
/// 承認済みの予約リクエストとの期間重複を検出する
pub struct ConflictDetector {
    reservation_request_repository: Arc<dyn ReservationRequestRepository>,
}

impl ConflictDetector {
    /// 新しい競合検出サービスを作成
    ///
    /// # Arguments
    /// * `reservation_request_repository` - 予約リクエストリポジトリ
    pub fn new(reservation_request_repository: Arc<dyn ReservationRequestRepository>) -> Self {
        Self {
            reservation_request_repository,
        }
    }

    /// 宿泊施設の承認済み予約リクエストをすべて取得する
    ///
    /// # Arguments
    /// * `accommodation_id` - 宿泊施設ID
    ///
    /// # Returns
    /// * `Ok(Vec<ReservationRequest>)` - 承認済み予約リクエストのリスト
    /// * `Err(RepositoryError)` - 取得失敗
    pub async fn find_accepted_overlaps(
        &self,
        accommodation_id: AccommodationId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        self.reservation_request_repository
            .find_accepted_by_accommodation(accommodation_id)
            .await
    }

    /// 宿泊期間が承認済み予約リクエストのいずれとも重複しないことを確認する
    /// `excluding` に指定した予約リクエスト自身は判定から除外する
    ///
    /// # Returns
    /// * `Ok(())` - 重複なし
    /// * `Err(DomainError::Conflict)` - 重複する承認済み予約が存在する
    pub fn ensure_no_overlap(
        stay: &StayPeriod,
        accepted: &[ReservationRequest],
        excluding: Option<ReservationRequestId>,
    ) -> Result<(), DomainError> {
        let conflict = accepted
            .iter()
            .filter(|request| Some(request.id()) != excluding)
            .find(|request| request.stay().overlaps(stay));

        match conflict {
            Some(request) => Err(DomainError::Conflict(format!(
                "{} は承認済みの予約 {} {} と重複しています",
                stay,
                request.id(),
                request.stay()
            ))),
            None => Ok(()),
        }
    }
}

/// 予約済み期間の紐付け結果
#[derive(Debug, Clone, PartialEq)]
pub enum TermAttachment {
    /// 予約済み期間が作成され、予約リクエストに紐付けられた
    Attached(ReservedTermId),
    /// 外部サービスまたはローカルの更新に失敗した（ローカルの状態遷移は維持される）
    Failed(String),
}

impl TermAttachment {
    pub fn reserved_term_id(&self) -> Option<ReservedTermId> {
        match self {
            TermAttachment::Attached(id) => Some(*id),
            TermAttachment::Failed(_) => None,
        }
    }
}

/// 予約済み期間の調整サービス
/// 宿泊施設サービス側の予約済み期間をローカルの予約状態に追従させる
///
/// ローカルの状態遷移が常に優先され、外部呼び出しの失敗でロールバックはしない。
pub struct TermReservationCoordinator {
    gateway: Arc<dyn TermReservationGateway>,
}

impl TermReservationCoordinator {
    pub fn new(gateway: Arc<dyn TermReservationGateway>) -> Self {
        Self { gateway }
    }

    /// 承認済み予約リクエストの予約済み期間を作成する
    pub async fn reserve(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservedTermId, GatewayError> {
        let reserved_term_id = self.gateway.create_reserved_term(request).await?;
        tracing::info!(
            reservation_request_id = %request.id(),
            reserved_term_id = %reserved_term_id,
            "予約済み期間を作成しました"
        );
        Ok(reserved_term_id)
    }

    /// 予約済み期間を削除する
    /// 結果は呼び出し元に返さず、失敗はログに記録するのみ
    pub async fn release(&self, request: &ReservationRequest) {
        let Some(reserved_term_id) = request.reserved_term_id() else {
            tracing::warn!(
                reservation_request_id = %request.id(),
                "予約済み期間が紐付いていないため削除をスキップします"
            );
            return;
        };

        match self.gateway.delete_reserved_term(reserved_term_id).await {
            Ok(()) => tracing::info!(
                reservation_request_id = %request.id(),
                reserved_term_id = %reserved_term_id,
                "予約済み期間を削除しました"
            ),
            Err(e) => tracing::warn!(
                reservation_request_id = %request.id(),
                reserved_term_id = %reserved_term_id,
                error = %e,
                "予約済み期間の削除に失敗しました"
            ),
        }
    }
}
