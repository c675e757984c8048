//! Sign-in endpoints

use reqwest::Method;
use stockroom_core::Session;

use super::{ClientError, Gateway, RequestOptions};
use crate::types::LoginRequest;

impl Gateway {
    /// Sign in; the API answers with the user and sets the session cookies
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Session, ClientError> {
        let options = RequestOptions::new()
            .json(serde_json::to_value(credentials)?)
            .without_refresh();
        self.execute(Method::POST, "/auth/login", options).await
    }

    /// Sign out and drop the session cookies server side
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.execute_empty(
            Method::POST,
            "/auth/logout",
            RequestOptions::new().without_refresh(),
        )
        .await
    }

    /// Current user
    pub async fn me(&self) -> Result<Session, ClientError> {
        self.execute(Method::GET, "/auth/me", RequestOptions::new())
            .await
    }
}
