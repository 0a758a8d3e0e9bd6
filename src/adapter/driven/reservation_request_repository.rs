use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    AccommodationId, ReservationDraft, ReservationRequest, ReservationRequestId,
    ReservationStatus, ReservedTermId, StayPeriod, UserId,
};
use crate::domain::port::{RepositoryError, ReservationRequestRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row};
use std::future::Future;
use std::time::Duration;

const SELECT_COLUMNS: &str = "SELECT id, start_date, end_date, accommodation_id, guest_id, owner_id, \
     guest_number, status, reserved_term_id, accommodation_name FROM reservation_requests";

/// MySQL予約リクエストリポジトリ
/// MySQLデータベースを使用して予約リクエストを永続化する
/// すべての問い合わせは設定されたタイムアウトで打ち切る
pub struct MySqlReservationRequestRepository {
    pool: Pool<MySql>,
    query_timeout: Duration,
}

impl MySqlReservationRequestRepository {
    /// 新しいMySQL予約リクエストリポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    /// * `query_timeout` - 1回の問い合わせに許容する時間
    pub fn new(pool: Pool<MySql>, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        query: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, RepositoryError> {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = DatabaseError::from(e);
                tracing::error!(operation, error = %err, "データベース操作に失敗しました");
                Err(err.into())
            }
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "データベース操作がタイムアウトしました"
                );
                Err(DatabaseError::QueryTimeout(format!(
                    "{} が {}ms 以内に完了しませんでした",
                    operation,
                    self.query_timeout.as_millis()
                ))
                .into())
            }
        }
    }

    /// データベースの行から予約リクエストを再構築する
    fn request_from_row(row: &MySqlRow) -> Result<ReservationRequest, RepositoryError> {
        let decode = |e: sqlx::Error| RepositoryError::from(DatabaseError::from(e));

        let id = ReservationRequestId::from_string(&row.try_get::<String, _>("id").map_err(decode)?)
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("予約リクエストIDの解析に失敗しました: {}", e))
            })?;

        let stay = StayPeriod::reconstruct(
            row.try_get::<NaiveDate, _>("start_date").map_err(decode)?,
            row.try_get::<NaiveDate, _>("end_date").map_err(decode)?,
        )
        .map_err(|e| RepositoryError::FetchFailed(format!("宿泊期間の構築に失敗しました: {}", e)))?;

        let status = ReservationStatus::from_string(&row.try_get::<String, _>("status").map_err(decode)?)
            .map_err(|e| {
                RepositoryError::FetchFailed(format!("予約ステータスの解析に失敗しました: {}", e))
            })?;

        Ok(ReservationRequest::reconstruct(
            id,
            stay,
            AccommodationId::new(row.try_get::<u64, _>("accommodation_id").map_err(decode)?),
            UserId::new(row.try_get::<u64, _>("guest_id").map_err(decode)?),
            UserId::new(row.try_get::<u64, _>("owner_id").map_err(decode)?),
            row.try_get::<u32, _>("guest_number").map_err(decode)?,
            status,
            row.try_get::<Option<u64>, _>("reserved_term_id")
                .map_err(decode)?
                .map(ReservedTermId::new),
            row.try_get::<String, _>("accommodation_name").map_err(decode)?,
        ))
    }

    fn requests_from_rows(rows: &[MySqlRow]) -> Result<Vec<ReservationRequest>, RepositoryError> {
        rows.iter().map(Self::request_from_row).collect()
    }
}

#[async_trait]
impl ReservationRequestRepository for MySqlReservationRequestRepository {
    async fn insert(&self, draft: ReservationDraft) -> Result<ReservationRequest, RepositoryError> {
        let request = draft.into_request(ReservationRequestId::generate());

        self.bounded(
            "insert",
            sqlx::query(
                r#"
                INSERT INTO reservation_requests
                    (id, start_date, end_date, accommodation_id, guest_id, owner_id,
                     guest_number, status, reserved_term_id, accommodation_name)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(request.id().to_string())
            .bind(request.stay().start())
            .bind(request.stay().end())
            .bind(request.accommodation_id().value())
            .bind(request.guest_id().value())
            .bind(request.owner_id().value())
            .bind(request.guest_number())
            .bind(request.status().as_str())
            .bind(request.reserved_term_id().map(|id| id.value()))
            .bind(request.accommodation_name())
            .execute(&self.pool),
        )
        .await?;

        Ok(request)
    }

    async fn find_by_id(
        &self,
        id: ReservationRequestId,
    ) -> Result<Option<ReservationRequest>, RepositoryError> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = self
            .bounded(
                "find_by_id",
                sqlx::query(&sql)
                    .bind(id.to_string())
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.as_ref().map(Self::request_from_row).transpose()
    }

    async fn delete_by_id(&self, id: ReservationRequestId) -> Result<bool, RepositoryError> {
        let result = self
            .bounded(
                "delete_by_id",
                sqlx::query("DELETE FROM reservation_requests WHERE id = ?")
                    .bind(id.to_string())
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_accepted_by_accommodation(
        &self,
        accommodation_id: AccommodationId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let sql = format!(
            "{} WHERE accommodation_id = ? AND status = ? ORDER BY start_date",
            SELECT_COLUMNS
        );
        let rows = self
            .bounded(
                "find_accepted_by_accommodation",
                sqlx::query(&sql)
                    .bind(accommodation_id.value())
                    .bind(ReservationStatus::Accepted.as_str())
                    .fetch_all(&self.pool),
            )
            .await?;

        Self::requests_from_rows(&rows)
    }

    async fn find_active_by_guest(
        &self,
        guest_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let sql = format!(
            "{} WHERE guest_id = ? AND status = ? AND end_date >= ? ORDER BY start_date",
            SELECT_COLUMNS
        );
        let rows = self
            .bounded(
                "find_active_by_guest",
                sqlx::query(&sql)
                    .bind(guest_id.value())
                    .bind(ReservationStatus::Accepted.as_str())
                    .bind(today)
                    .fetch_all(&self.pool),
            )
            .await?;

        Self::requests_from_rows(&rows)
    }

    async fn find_active_by_owner(
        &self,
        owner_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let sql = format!(
            "{} WHERE owner_id = ? AND status = ? AND end_date >= ? ORDER BY start_date",
            SELECT_COLUMNS
        );
        let rows = self
            .bounded(
                "find_active_by_owner",
                sqlx::query(&sql)
                    .bind(owner_id.value())
                    .bind(ReservationStatus::Accepted.as_str())
                    .bind(today)
                    .fetch_all(&self.pool),
            )
            .await?;

        Self::requests_from_rows(&rows)
    }

    async fn find_all_by_guest(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        let sql = format!(
            "{} WHERE guest_id = ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows = self
            .bounded(
                "find_all_by_guest",
                sqlx::query(&sql)
                    .bind(guest_id.value())
                    .fetch_all(&self.pool),
            )
            .await?;

        Self::requests_from_rows(&rows)
    }

    async fn find_by_owner_and_statuses(
        &self,
        owner_id: UserId,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<ReservationRequest>, RepositoryError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "{} WHERE owner_id = ? AND status IN ({}) ORDER BY created_at DESC",
            SELECT_COLUMNS, placeholders
        );

        let mut query = sqlx::query(&sql).bind(owner_id.value());
        for status in statuses {
            query = query.bind(status.as_str());
        }

        let rows = self
            .bounded("find_by_owner_and_statuses", query.fetch_all(&self.pool))
            .await?;

        Self::requests_from_rows(&rows)
    }

    // 半開区間の重複条件 s1 < e2 AND s2 < e1 をSQLで表現する
    async fn decline_overlapping(
        &self,
        accommodation_id: AccommodationId,
        stay: &StayPeriod,
    ) -> Result<u64, RepositoryError> {
        let result = self
            .bounded(
                "decline_overlapping",
                sqlx::query(
                    r#"
                    UPDATE reservation_requests
                    SET status = ?
                    WHERE accommodation_id = ?
                      AND status = ?
                      AND start_date < ?
                      AND ? < end_date
                    "#,
                )
                .bind(ReservationStatus::Declined.as_str())
                .bind(accommodation_id.value())
                .bind(ReservationStatus::Submitted.as_str())
                .bind(stay.end())
                .bind(stay.start())
                .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn update_status(
        &self,
        id: ReservationRequestId,
        status: ReservationStatus,
    ) -> Result<(), RepositoryError> {
        self.bounded(
            "update_status",
            sqlx::query("UPDATE reservation_requests SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id.to_string())
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn update_reserved_term(
        &self,
        id: ReservationRequestId,
        reserved_term_id: ReservedTermId,
    ) -> Result<(), RepositoryError> {
        self.bounded(
            "update_reserved_term",
            sqlx::query("UPDATE reservation_requests SET reserved_term_id = ? WHERE id = ?")
                .bind(reserved_term_id.value())
                .bind(id.to_string())
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn count_by_guest_and_status(
        &self,
        guest_id: UserId,
        status: ReservationStatus,
    ) -> Result<u64, RepositoryError> {
        let row = self
            .bounded(
                "count_by_guest_and_status",
                sqlx::query(
                    "SELECT COUNT(*) AS count FROM reservation_requests WHERE guest_id = ? AND status = ?",
                )
                .bind(guest_id.value())
                .bind(status.as_str())
                .fetch_one(&self.pool),
            )
            .await?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| RepositoryError::from(DatabaseError::from(e)))?;
        Ok(count.max(0) as u64)
    }
}
