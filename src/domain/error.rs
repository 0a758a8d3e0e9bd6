/// ドメイン層のエラー型
/// 予約リクエストのビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 入力値の検証失敗（例: 過去の開始日、0泊以下の宿泊数）
    Validation(String),
    /// 宿泊施設の空き期間に含まれない日がある
    Unavailable(String),
    /// 承認済みの予約と期間が重複している
    Conflict(String),
    /// 呼び出し元がリソースの所有者ではない
    AccessDenied(String),
    /// 無効な予約状態（例: 承認済みの予約を再度承認しようとした）
    InvalidState(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            DomainError::Unavailable(msg) => write!(f, "Accommodation is not available: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Accommodation is reserved already: {}", msg),
            DomainError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            DomainError::InvalidState(msg) => write!(f, "Invalid reservation state: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
