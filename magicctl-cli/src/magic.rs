//! HTTP client for the Magic backend
//!
//! Implements the Remote Gateway for users and exposes the few extra calls
//! the commands need (role removal, socket diagnostics).

use anyhow::Context;
use async_trait::async_trait;
use magicctl_core::{
    Affected, BackendConfig, Count, Filter, ListError, RemoteGateway, SocketUser, User, UserRole,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

const USERS: &str = "magic/system/auth/users";
const USERS_COUNT: &str = "magic/system/auth/users-count";
const USER_ROLES: &str = "magic/system/auth/user-roles";
const SOCKET_USERS: &str = "magic/system/sockets/users";

#[derive(Deserialize, Debug)]
struct ErrorResponse {
    message: String,
}

/// Thin reqwest wrapper carrying the endpoint and bearer token
#[derive(Debug, Clone)]
pub struct MagicClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl MagicClient {
    pub fn new(backend: &BackendConfig) -> anyhow::Result<Self> {
        let builder = Client::builder();
        let client = if backend.insecure {
            builder
                .danger_accept_invalid_certs(true)
                .build()
                .context("Failed to build HTTP client with insecure mode")?
        } else {
            builder.build().context("Failed to build HTTP client")?
        };

        Ok(Self {
            client,
            endpoint: backend.endpoint.trim_end_matches('/').to_string(),
            token: backend.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path);
        debug!(%method, %url, "magic request");
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ListError> {
        let response = req
            .send()
            .await
            .map_err(|e| ListError::transport(format!("Failed to connect to backend: {}", e)))?;
        handle_response(response).await
    }

    /// Every user currently connected over web sockets
    pub async fn socket_users(&self) -> Result<Vec<SocketUser>, ListError> {
        let users: Option<Vec<SocketUser>> =
            self.send(self.request(Method::GET, SOCKET_USERS)).await?;
        Ok(users.unwrap_or_default())
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ListError> {
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            ListError::status(status.as_u16(), format!("Failed to parse response: {}", e))
        });
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
        Ok(error_resp) => error_resp.message,
        Err(_) if error_text.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => error_text,
    };
    Err(ListError::status(status.as_u16(), message))
}

/// Users list with roles as the per-row detail
#[derive(Debug, Clone)]
pub struct UsersGateway {
    client: MagicClient,
}

impl UsersGateway {
    pub fn new(client: MagicClient) -> Self {
        Self { client }
    }

    pub async fn remove_role(&self, username: &str, role: &str) -> Result<(), ListError> {
        let req = self
            .client
            .request(Method::DELETE, USER_ROLES)
            .query(&[("username", username), ("role", role)]);
        let affected: Affected = self.client.send(req).await?;
        if affected.affected == 0 {
            return Err(ListError::status(
                404,
                format!("'{}' does not have the '{}' role", username, role),
            ));
        }
        Ok(())
    }
}

fn filter_query(text: &str) -> Vec<(&'static str, String)> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![("filter", text.to_string())]
    }
}

#[async_trait]
impl RemoteGateway for UsersGateway {
    type Row = User;
    type Detail = Vec<String>;

    async fn list(&self, filter: &Filter) -> Result<Vec<User>, ListError> {
        let mut query = vec![
            ("limit", filter.limit.to_string()),
            ("offset", filter.offset.to_string()),
        ];
        query.extend(filter_query(&filter.text));

        let req = self.client.request(Method::GET, USERS).query(&query);
        let users: Option<Vec<User>> = self.client.send(req).await?;
        Ok(users.unwrap_or_default())
    }

    async fn count(&self, text: &str) -> Result<u64, ListError> {
        let req = self
            .client
            .request(Method::GET, USERS_COUNT)
            .query(&filter_query(text));
        let count: Count = self.client.send(req).await?;
        Ok(count.count)
    }

    async fn detail(&self, id: &str) -> Result<Vec<String>, ListError> {
        let req = self
            .client
            .request(Method::GET, USER_ROLES)
            .query(&[("username", id)]);
        let roles: Option<Vec<UserRole>> = self.client.send(req).await?;
        Ok(roles
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.role)
            .collect())
    }

    async fn remove(&self, id: &str) -> Result<(), ListError> {
        let req = self
            .client
            .request(Method::DELETE, USERS)
            .query(&[("username", id)]);
        let affected: Affected = self.client.send(req).await?;
        if affected.affected == 0 {
            return Err(ListError::status(404, format!("'{}' not found", id)));
        }
        Ok(())
    }
}
