//! Authentication service API.

use serde_json::json;
use warehouse_types::GroupId;

use crate::client::ServiceClient;
use crate::error::Result;
use crate::types::IssuedJwt;

/// Client for the authentication service.
#[derive(Clone)]
pub struct AuthClient {
    client: ServiceClient,
}

impl AuthClient {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Issue a token for `user_id` that additionally carries `extra_gids`.
    ///
    /// `GET /jwt/:user_id?claim={"gids":[...]}`, authorized with the
    /// warehouse's service token.
    pub async fn issue_jwt(
        &self,
        user_id: &str,
        extra_gids: &[GroupId],
        service_token: &str,
    ) -> Result<String> {
        let claim = json!({ "gids": extra_gids }).to_string();
        let issued: IssuedJwt = self
            .client
            .get(
                &format!("jwt/{}", user_id),
                &[("claim", claim)],
                Some(service_token),
            )
            .await?;
        Ok(issued.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_issue_jwt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwt/17"))
            .and(query_param("claim", r#"{"gids":[99]}"#))
            .and(header("authorization", "Bearer svc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "escalated"})))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthClient::new(
            ServiceClient::builder()
                .base_url(server.uri())
                .build()
                .unwrap(),
        );
        let jwt = auth.issue_jwt("17", &[99], "svc").await.unwrap();
        assert_eq!(jwt, "escalated");
    }

    #[tokio::test]
    async fn test_issue_jwt_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("jwt expired"))
            .mount(&server)
            .await;

        let auth = AuthClient::new(
            ServiceClient::builder()
                .base_url(server.uri())
                .build()
                .unwrap(),
        );
        let err = auth.issue_jwt("17", &[99], "svc").await.unwrap_err();
        assert!(err.is_auth_error());
    }
}
