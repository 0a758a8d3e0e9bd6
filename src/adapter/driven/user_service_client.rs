use crate::adapter::driven::endpoint_pool::{ensure_success, transport_error, EndpointPool};
use crate::domain::model::{UserId, UserRole};
use crate::domain::port::{Authorizer, Caller, GatewayError};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// ユーザーサービスのクライアント
/// Authorizationヘッダーをそのまま転送し、呼び出し元を解決する
pub struct UserServiceClient {
    http_client: Client,
    endpoints: EndpointPool,
}

impl UserServiceClient {
    pub fn new(endpoints: EndpointPool, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            http_client,
            endpoints,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserResponseDto {
    id: u64,
    #[serde(default)]
    role: String,
}

impl UserResponseDto {
    fn into_caller(self) -> Result<Caller, GatewayError> {
        let role = UserRole::from_string(&self.role).ok_or_else(|| {
            GatewayError::InvalidResponse(format!("unknown user role: {}", self.role))
        })?;
        Ok(Caller {
            id: UserId::new(self.id),
            role,
        })
    }
}

fn authorize_path(role: UserRole) -> &'static str {
    match role {
        UserRole::Host => "/api/users/authorize/host",
        UserRole::Guest => "/api/users/authorize/guest",
    }
}

#[async_trait]
impl Authorizer for UserServiceClient {
    async fn resolve(&self, token: &str, role: UserRole) -> Result<Caller, GatewayError> {
        let url = self.endpoints.url(authorize_path(role));

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response, "user").await?;

        let dto: UserResponseDto = response.json().await.map_err(transport_error)?;
        dto.into_caller()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_is_mapped_to_caller() {
        let json = r#"{"id": 5, "email": "a@b.c", "name": "A", "surname": "B",
                       "address": "x", "username": "ab", "role": "HOST"}"#;
        let caller = serde_json::from_str::<UserResponseDto>(json)
            .unwrap()
            .into_caller()
            .unwrap();
        assert_eq!(caller.id, UserId::new(5));
        assert_eq!(caller.role, UserRole::Host);
    }

    #[test]
    fn test_unknown_role_is_invalid_response() {
        let json = r#"{"id": 5, "role": "ADMIN"}"#;
        let result = serde_json::from_str::<UserResponseDto>(json)
            .unwrap()
            .into_caller();
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_authorize_path_per_role() {
        assert_eq!(authorize_path(UserRole::Host), "/api/users/authorize/host");
        assert_eq!(authorize_path(UserRole::Guest), "/api/users/authorize/guest");
    }
}
