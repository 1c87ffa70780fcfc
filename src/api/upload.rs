//! Post image storage
//!
//! Images arrive as the `image` part of the post form. They are checked
//! against the upload settings and written to `<upload.path>/post_images/`
//! under a random name; the database stores the path relative to the
//! media root.

use anyhow::Context;
use axum::body::Bytes;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Directory under the media root holding post images
pub const POST_IMAGES_DIR: &str = "post_images";

/// An image received with a form, not yet stored
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    /// Check type and size against the upload settings, returning the
    /// message to show next to the field on failure
    pub fn check(&self, config: &UploadConfig) -> Result<(), String> {
        if !config.is_type_allowed(&self.content_type) {
            return Err(format!(
                "Unsupported image type: {}. Allowed types: {}",
                self.content_type,
                config.allowed_types.join(", ")
            ));
        }
        if self.data.len() as u64 > config.max_file_size {
            return Err(format!(
                "File too large. Maximum size: {} MB",
                config.max_file_size / 1024 / 1024
            ));
        }
        Ok(())
    }
}

/// Store an image, returning its path relative to the media root
pub async fn save_post_image(config: &UploadConfig, image: &ImageUpload) -> anyhow::Result<String> {
    let dir = config.path.join(POST_IMAGES_DIR);
    ensure_upload_dir(&dir).await?;

    let filename = format!(
        "{}.{}",
        Uuid::new_v4(),
        config.extension_for(&image.content_type)
    );
    fs::write(dir.join(&filename), &image.data)
        .await
        .with_context(|| format!("Failed to save image {}", filename))?;

    tracing::debug!(file = %filename, size = image.data.len(), "Image stored");
    Ok(format!("{}/{}", POST_IMAGES_DIR, filename))
}

/// Remove a stored media file. Failures are logged and otherwise ignored.
pub async fn remove_media(config: &UploadConfig, relative: &str) {
    if relative.split('/').any(|part| part == "..") {
        tracing::warn!("Refusing to remove media outside the media root: {}", relative);
        return;
    }
    let path = config.path.join(relative);
    if let Err(e) = fs::remove_file(&path).await {
        tracing::warn!("Failed to remove media file {}: {}", path.display(), e);
    }
}

async fn ensure_upload_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create upload dir {}", path.display()))?;
    }
    Ok(())
}
