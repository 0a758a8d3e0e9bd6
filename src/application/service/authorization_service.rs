use crate::application::ApplicationError;
use crate::domain::model::UserRole;
use crate::domain::port::{Authorizer, Caller, GatewayError};
use std::sync::Arc;

/// 認可サービス
/// リクエストのトークンから呼び出し元のIDとロールを解決する
pub struct AuthorizationService {
    authorizer: Arc<dyn Authorizer>,
}

impl AuthorizationService {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    /// 呼び出し元が指定したロールを持つことを確認する
    ///
    /// # Arguments
    /// * `token` - Authorizationヘッダーの値（そのままユーザーサービスに転送する）
    /// * `role` - 操作に必要なロール
    ///
    /// # Returns
    /// * `Ok(Caller)` - 認可された呼び出し元
    /// * `Err(ApplicationError::Unauthorized)` - トークンがない、拒否された、またはロールが一致しない
    /// * `Err(ApplicationError::GatewayError)` - ユーザーサービスとの通信に失敗
    pub async fn authorize(
        &self,
        token: Option<&str>,
        role: UserRole,
    ) -> Result<Caller, ApplicationError> {
        let token = token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            ApplicationError::Unauthorized("Authorizationヘッダーがありません".to_string())
        })?;

        let caller = match self.authorizer.resolve(token, role).await {
            Ok(caller) => caller,
            Err(GatewayError::Rejected { status, .. }) => {
                return Err(ApplicationError::Unauthorized(format!(
                    "ユーザーサービスが認可を拒否しました（{}）",
                    status
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if caller.role != role {
            tracing::debug!(user_id = %caller.id, role = %caller.role, required = %role, "ロールが一致しません");
            return Err(ApplicationError::Unauthorized(format!(
                "ユーザーは{}ではありません",
                role
            )));
        }

        Ok(caller)
    }
}
