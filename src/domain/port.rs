// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    AccommodationId, AccommodationInfo, ReservationDraft, ReservationRequest,
    ReservationRequestId, ReservationStatus, ReservedTermId, StayPeriod, UserId, UserRole,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
    /// 問い合わせが制限時間内に完了しなかった
    Timeout(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
            RepositoryError::Timeout(msg) => write!(f, "Query timed out: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 予約リクエストリポジトリトレイト
/// 予約リクエスト集約の永続化を抽象化する
///
/// 状態更新系の操作は更新件数を確認しない。
/// MySQLは値が変化しない更新を0件として報告するため、存在確認は呼び出し側で行う。
#[async_trait]
pub trait ReservationRequestRepository: Send + Sync {
    /// 新しい予約リクエストを保存し、IDを割り当てる
    ///
    /// # Arguments
    /// * `draft` - 保存する予約リクエスト
    ///
    /// # Returns
    /// * `Ok(ReservationRequest)` - IDが割り当てられた予約リクエスト
    /// * `Err(RepositoryError)` - 保存失敗
    async fn insert(&self, draft: ReservationDraft) -> Result<ReservationRequest, RepositoryError>;

    /// IDで予約リクエストを検索する
    ///
    /// # Returns
    /// * `Ok(Some(ReservationRequest))` - 見つかった
    /// * `Ok(None)` - 見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(
        &self,
        id: ReservationRequestId,
    ) -> Result<Option<ReservationRequest>, RepositoryError>;

    /// IDで予約リクエストを削除する
    ///
    /// # Returns
    /// * `Ok(true)` - 削除した
    /// * `Ok(false)` - 対象が存在しなかった
    /// * `Err(RepositoryError)` - 削除失敗
    async fn delete_by_id(&self, id: ReservationRequestId) -> Result<bool, RepositoryError>;

    /// 宿泊施設の承認済み予約リクエストをすべて取得する
    async fn find_accepted_by_accommodation(
        &self,
        accommodation_id: AccommodationId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError>;

    /// ゲストの承認済みかつ終了日が今日以降の予約リクエストを取得する
    async fn find_active_by_guest(
        &self,
        guest_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReservationRequest>, RepositoryError>;

    /// オーナーの承認済みかつ終了日が今日以降の予約リクエストを取得する
    async fn find_active_by_owner(
        &self,
        owner_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReservationRequest>, RepositoryError>;

    /// ゲストのすべての予約リクエストを取得する
    async fn find_all_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError>;

    /// オーナーの予約リクエストのうち、指定ステータスのものを取得する
    async fn find_by_owner_and_statuses(
        &self,
        owner_id: UserId,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationRequest>, RepositoryError>;

    /// 期間が重複するSUBMITTED状態の予約リクエストを一括でDECLINEDにする
    ///
    /// # Arguments
    /// * `accommodation_id` - 宿泊施設ID
    /// * `stay` - 承認された予約の宿泊期間
    ///
    /// # Returns
    /// * `Ok(u64)` - 却下した件数
    /// * `Err(RepositoryError)` - 更新失敗
    async fn decline_overlapping(
        &self,
        accommodation_id: AccommodationId,
        stay: &StayPeriod,
    ) -> Result<u64, RepositoryError>;

    /// 予約リクエストのステータスを更新する
    async fn update_status(
        &self,
        id: ReservationRequestId,
        status: ReservationStatus,
    ) -> Result<(), RepositoryError>;

    /// 予約リクエストに予約済み期間IDを設定する
    async fn update_reserved_term(
        &self,
        id: ReservationRequestId,
        reserved_term_id: ReservedTermId,
    ) -> Result<(), RepositoryError>;

    /// ゲストの指定ステータスの予約リクエスト数を数える
    async fn count_by_guest_and_status(
        &self,
        guest_id: UserId,
        status: ReservationStatus,
    ) -> Result<u64, RepositoryError>;
}

/// 外部サービス呼び出しのエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("Remote resource not found: {0}")]
    NotFound(String),
    #[error("Remote service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Remote service unreachable: {0}")]
    Transport(String),
    #[error("Remote service timed out: {0}")]
    Timeout(String),
    #[error("Invalid response from remote service: {0}")]
    InvalidResponse(String),
}

/// 宿泊施設情報の取得ポート
/// 空き期間・宿泊人数・受付方針は宿泊施設サービスが所有する
#[async_trait]
pub trait AvailabilityOracle: Send + Sync {
    /// 宿泊施設情報を取得する
    ///
    /// # Returns
    /// * `Ok(AccommodationInfo)` - 取得成功
    /// * `Err(GatewayError::NotFound)` - 宿泊施設が存在しない
    /// * `Err(GatewayError)` - 通信失敗
    async fn fetch(
        &self,
        accommodation_id: AccommodationId,
    ) -> Result<AccommodationInfo, GatewayError>;
}

/// 宿泊施設サービス側の予約済み期間を管理するポート
#[async_trait]
pub trait TermReservationGateway: Send + Sync {
    /// 承認済み予約リクエストに対応する予約済み期間を作成する
    async fn create_reserved_term(
        &self,
        request: &ReservationRequest,
    ) -> Result<ReservedTermId, GatewayError>;

    /// 予約済み期間を削除する
    async fn delete_reserved_term(&self, reserved_term_id: ReservedTermId)
        -> Result<(), GatewayError>;
}

/// 認可された呼び出し元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: UserRole,
}

/// ユーザー認可ポート
/// トークンの検証はユーザーサービスが担当する
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// トークンを検証し、要求したロールの呼び出し元を解決する
    async fn resolve(&self, token: &str, role: UserRole) -> Result<Caller, GatewayError>;
}

/// 現在日付の取得ポート
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
