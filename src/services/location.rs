//! Location service

use crate::db::repositories::LocationRepository;
use crate::models::{CreateLocationInput, Location, UpdateLocationInput};
use crate::services::validation::{check_required, FieldErrors, MAX_TITLE_LENGTH};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum LocationServiceError {
    #[error("Location not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct LocationService {
    repo: Arc<dyn LocationRepository>,
}

impl LocationService {
    pub fn new(repo: Arc<dyn LocationRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateLocationInput) -> Result<Location, LocationServiceError> {
        validate(&input.name)?;

        let mut location = Location::new(input.name.trim().to_string());
        location.is_published = input.is_published;

        let created = self
            .repo
            .create(&location)
            .await
            .context("Failed to create location")?;
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Location, LocationServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get location")?
            .ok_or(LocationServiceError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Location>, LocationServiceError> {
        let locations = self.repo.list().await.context("Failed to list locations")?;
        Ok(locations)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateLocationInput,
    ) -> Result<Location, LocationServiceError> {
        let mut location = self.get(id).await?;
        if let Some(name) = input.name {
            location.name = name.trim().to_string();
        }
        if let Some(is_published) = input.is_published {
            location.is_published = is_published;
        }
        validate(&location.name)?;

        let updated = self
            .repo
            .update(&location)
            .await
            .context("Failed to update location")?;
        Ok(updated)
    }

    /// Delete a location; posts that referenced it lose their location
    pub async fn delete(&self, id: i64) -> Result<(), LocationServiceError> {
        self.get(id).await?;
        self.repo
            .delete(id)
            .await
            .context("Failed to delete location")?;
        Ok(())
    }
}

fn validate(name: &str) -> Result<(), LocationServiceError> {
    let mut errors = FieldErrors::new();
    check_required(&mut errors, "name", name, Some(MAX_TITLE_LENGTH));
    errors.into_result().map_err(LocationServiceError::ValidationError)
}
