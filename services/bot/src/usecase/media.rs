use crate::domain::repository::MediaServerPort;
use crate::domain::types::MediaCounts;
use crate::error::BotServiceError;

pub struct CountAssetsUseCase<M: MediaServerPort> {
    pub media: M,
}

impl<M: MediaServerPort> CountAssetsUseCase<M> {
    pub async fn execute(&self) -> Result<MediaCounts, BotServiceError> {
        self.media.count_assets().await
    }
}
