use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use embyhub_domain::id::EmbyId;

use crate::domain::repository::MediaServerPort;
use crate::domain::types::{EmbyAccountInfo, MediaCounts};
use crate::error::BotServiceError;

/// Emby `UserPolicy` fields this bot manages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UserPolicy {
    is_administrator: bool,
    is_hidden: bool,
    is_hidden_remotely: bool,
    is_disabled: bool,
    enable_remote_control_of_other_users: bool,
    enable_shared_device_control: bool,
    enable_remote_access: bool,
    enable_live_tv_management: bool,
    enable_live_tv_access: bool,
    enable_media_playback: bool,
    enable_audio_playback_transcoding: bool,
    enable_video_playback_transcoding: bool,
    enable_playback_remuxing: bool,
    enable_content_deletion: bool,
    enable_content_downloading: bool,
    enable_subtitle_downloading: bool,
    enable_subtitle_management: bool,
    enable_sync_transcoding: bool,
    enable_media_conversion: bool,
    enable_all_devices: bool,
    allow_camera_upload: bool,
    simultaneous_stream_limit: u32,
}

impl UserPolicy {
    /// Hidden account with remote playback and up to 3 streams.
    fn default_access() -> Self {
        Self {
            is_administrator: false,
            is_hidden: true,
            is_hidden_remotely: true,
            is_disabled: false,
            enable_remote_control_of_other_users: false,
            enable_shared_device_control: false,
            enable_remote_access: true,
            enable_live_tv_management: false,
            enable_live_tv_access: false,
            enable_media_playback: true,
            enable_audio_playback_transcoding: false,
            enable_video_playback_transcoding: false,
            enable_playback_remuxing: false,
            enable_content_deletion: false,
            enable_content_downloading: false,
            enable_subtitle_downloading: false,
            enable_subtitle_management: false,
            enable_sync_transcoding: false,
            enable_media_conversion: false,
            enable_all_devices: true,
            allow_camera_upload: false,
            simultaneous_stream_limit: 3,
        }
    }

    fn banned() -> Self {
        Self {
            is_disabled: true,
            enable_remote_access: false,
            simultaneous_stream_limit: 0,
            ..Self::default_access()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatedUser {
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserView {
    last_activity_date: Option<String>,
    date_created: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemCounts {
    #[serde(default)]
    movie_count: u64,
    #[serde(default)]
    series_count: u64,
    #[serde(default)]
    episode_count: u64,
}

/// reqwest-backed Emby client.
#[derive(Clone)]
pub struct EmbyClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl EmbyClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Emby-Token", &self.api_key)
            .header("X-MediaBrowser-Token", &self.api_key)
    }

    async fn send(&self, req: RequestBuilder, context: &str) -> Result<Response, BotServiceError> {
        let resp = req
            .send()
            .await
            .map_err(|e| BotServiceError::remote(context, e))?;
        resp.error_for_status()
            .map_err(|e| BotServiceError::remote(context, e))
    }

    async fn post_policy(&self, id: &EmbyId, policy: &UserPolicy) -> Result<(), BotServiceError> {
        let req = self
            .request(Method::POST, &format!("/emby/Users/{id}/Policy"))
            .json(policy);
        self.send(req, "update user policy").await?;
        Ok(())
    }

    async fn post_password(
        &self,
        id: &EmbyId,
        body: serde_json::Value,
        context: &str,
    ) -> Result<(), BotServiceError> {
        let req = self
            .request(Method::POST, &format!("/emby/users/{id}/Password"))
            .json(&body);
        self.send(req, context).await?;
        Ok(())
    }

    /// Plain reachability probe against `/emby/System/Info`.
    pub async fn check_site(&self) -> Result<(), BotServiceError> {
        let req = self.request(Method::GET, "/emby/System/Info");
        self.send(req, "check media server").await?;
        Ok(())
    }
}

impl MediaServerPort for EmbyClient {
    async fn create_account(&self, name: &str) -> Result<EmbyId, BotServiceError> {
        let req = self
            .request(Method::POST, "/emby/Users/New")
            .json(&json!({ "Name": name, "HasPassword": false }));
        let created: CreatedUser = self
            .send(req, "create user")
            .await?
            .json()
            .await
            .map_err(|e| BotServiceError::remote("create user", e))?;
        created
            .id
            .filter(|id| !id.is_empty())
            .map(EmbyId)
            .ok_or_else(|| BotServiceError::remote("create user", "response has no Id"))
    }

    async fn set_password(&self, id: &EmbyId, password: &str) -> Result<(), BotServiceError> {
        let body = json!({ "ResetPassword": false, "CurrentPw": "", "NewPw": password });
        self.post_password(id, body, "set password").await
    }

    async fn reset_password(&self, id: &EmbyId) -> Result<(), BotServiceError> {
        self.post_password(id, json!({ "ResetPassword": true }), "reset password")
            .await
    }

    async fn set_default_policy(&self, id: &EmbyId) -> Result<(), BotServiceError> {
        self.post_policy(id, &UserPolicy::default_access()).await
    }

    async fn ban_account(&self, id: &EmbyId) -> Result<(), BotServiceError> {
        self.post_policy(id, &UserPolicy::banned()).await
    }

    async fn get_account(&self, id: &EmbyId) -> Result<EmbyAccountInfo, BotServiceError> {
        let req = self.request(Method::GET, &format!("/emby/Users/{id}"));
        let view: UserView = self
            .send(req, "get user")
            .await?
            .json()
            .await
            .map_err(|e| BotServiceError::remote("get user", e))?;
        Ok(EmbyAccountInfo {
            last_activity_date: view.last_activity_date,
            date_created: view.date_created,
        })
    }

    async fn count_assets(&self) -> Result<MediaCounts, BotServiceError> {
        let req = self.request(Method::GET, "/emby/Items/Counts");
        let counts: ItemCounts = self
            .send(req, "count items")
            .await?
            .json()
            .await
            .map_err(|e| BotServiceError::remote("count items", e))?;
        Ok(MediaCounts {
            movies: counts.movie_count,
            series: counts.series_count,
            episodes: counts.episode_count,
        })
    }
}
