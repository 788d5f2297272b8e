//! Photo attachment flow.
//!
//! The actual image processing lives behind the [`ImageEncoder`] trait so
//! the core stays free of codec dependencies. Encoding failures never lose
//! the capture: the original bytes are stored unprocessed instead.

use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::repository::DocumentRepository;
use shared::{AttachPhotoRequest, ItemResponse, Photo, RawImage, RemovePhotoRequest};

/// Longest edge of a stored photo, in pixels
pub const MAX_DIMENSION: u32 = 1280;

/// Lossy encoding quality for stored photos
pub const QUALITY: f32 = 0.7;

/// Downscales and re-encodes a raw capture for storage
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(
        &self,
        image: &RawImage,
        max_dimension: u32,
        quality: f32,
    ) -> anyhow::Result<Photo>;
}

/// Encoder that stores captures byte-for-byte. The default wiring for
/// builds without a codec; real frontends plug in an actual encoder.
pub struct PassthroughEncoder;

#[async_trait]
impl ImageEncoder for PassthroughEncoder {
    async fn encode(
        &self,
        image: &RawImage,
        _max_dimension: u32,
        _quality: f32,
    ) -> anyhow::Result<Photo> {
        Ok(Photo {
            mime: image.mime.clone(),
            data: image.data.clone(),
        })
    }
}

/// Service for attaching photos to items
#[derive(Clone)]
pub struct PhotoService {
    repository: Arc<DocumentRepository>,
    encoder: Arc<dyn ImageEncoder>,
}

impl PhotoService {
    /// Create a new PhotoService
    pub fn new(repository: Arc<DocumentRepository>, encoder: Arc<dyn ImageEncoder>) -> Self {
        Self {
            repository,
            encoder,
        }
    }

    /// Encode a raw capture and attach it to an item, replacing any photo
    /// already there. When the encoder fails the original bytes are stored
    /// as-is rather than dropping the capture.
    pub async fn attach_photo(
        &self,
        request: AttachPhotoRequest,
    ) -> Result<ItemResponse, DomainError> {
        info!(
            "Attaching photo to item {} in list {}",
            request.item_id, request.list_id
        );

        let AttachPhotoRequest {
            list_id,
            item_id,
            image,
        } = request;

        let photo = match self.encoder.encode(&image, MAX_DIMENSION, QUALITY).await {
            Ok(photo) => photo,
            Err(e) => {
                let error = DomainError::Encode(e.to_string());
                warn!("{}; storing the original image unprocessed", error);
                let RawImage { mime, data } = image;
                Photo { mime, data }
            }
        };

        let item = self.repository.mutate(move |document| {
            let list = document
                .lists
                .get_mut(&list_id)
                .ok_or_else(|| DomainError::list_not_found(&list_id))?;
            let item = list
                .items
                .iter_mut()
                .find(|item| item.id == item_id)
                .ok_or_else(|| DomainError::item_not_found(&item_id))?;
            item.photo = Some(photo);
            Ok(item.clone())
        })?;

        Ok(ItemResponse {
            item,
            success_message: "Photo attached successfully".to_string(),
        })
    }

    /// Drop an item's photo. Removing from an item without one is a no-op.
    pub fn remove_photo(&self, request: RemovePhotoRequest) -> Result<ItemResponse, DomainError> {
        info!(
            "Removing photo from item {} in list {}",
            request.item_id, request.list_id
        );

        let item = self.repository.mutate(|document| {
            let list = document
                .lists
                .get_mut(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;
            let item = list
                .items
                .iter_mut()
                .find(|item| item.id == request.item_id)
                .ok_or_else(|| DomainError::item_not_found(&request.item_id))?;
            item.photo = None;
            Ok(item.clone())
        })?;

        Ok(ItemResponse {
            item,
            success_message: "Photo removed successfully".to_string(),
        })
    }
}
