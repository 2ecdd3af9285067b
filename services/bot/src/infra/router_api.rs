use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use embyhub_domain::id::EmbyId;

use crate::domain::repository::RouterPort;
use crate::domain::types::Route;
use crate::error::BotServiceError;

/// The router service sends `index` as either a string or a number.
#[derive(Deserialize)]
struct RouteWire {
    index: Value,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct UserRouteWire {
    index: Value,
}

fn index_to_string(index: Value) -> String {
    match index {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// reqwest-backed client for the line-routing service. Every call is a GET.
#[derive(Clone)]
pub struct RouterClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RouterClient {
    /// An empty `api_key` sends no `Authorization` header.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T, BotServiceError> {
        let mut req = self.http.get(format!("{}{}", self.base_url, path));
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        req.send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| BotServiceError::remote(context, e))?
            .json()
            .await
            .map_err(|e| BotServiceError::remote(context, e))
    }
}

impl RouterPort for RouterClient {
    async fn list_routes(&self) -> Result<Vec<Route>, BotServiceError> {
        let routes: Vec<RouteWire> = self.get("/api/route", "list routes").await?;
        Ok(routes
            .into_iter()
            .map(|r| Route {
                index: index_to_string(r.index),
                name: r.name,
            })
            .collect())
    }

    async fn user_route(&self, id: &EmbyId) -> Result<String, BotServiceError> {
        let route: UserRouteWire = self
            .get(&format!("/api/route/{id}"), "query user route")
            .await?;
        Ok(index_to_string(route.index))
    }

    async fn update_user_route(&self, id: &EmbyId, index: &str) -> Result<bool, BotServiceError> {
        let reply: Value = self
            .get(&format!("/api/route/{id}/{index}"), "update user route")
            .await?;
        Ok(!matches!(reply, Value::Null | Value::Bool(false)))
    }
}
