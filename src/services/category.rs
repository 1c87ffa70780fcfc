//! Category service
//!
//! Category management: create, read, update, delete, with slug format and
//! uniqueness checks. Slugs are generated from the title when omitted.
//! Deleting a category detaches its posts instead of deleting them.

use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CreateCategoryInput, UpdateCategoryInput};
use crate::services::validation::{
    check_required, generate_slug, is_valid_slug, FieldErrors, MAX_TITLE_LENGTH,
};
use anyhow::Context;
use std::sync::Arc;
use uuid::Uuid;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category slug already exists
    #[error("Category slug already exists: {0}")]
    DuplicateSlug(String),

    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service for managing blog categories
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Create a new category
    ///
    /// # Errors
    /// - `ValidationError` for a blank or long title, or a malformed slug
    /// - `DuplicateSlug` if another category already uses the slug
    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        let slug = match input.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => generate_slug(&input.title).unwrap_or_else(fallback_slug),
        };
        validate(&input.title, &slug)?;
        self.ensure_slug_free(&slug, None).await?;

        let mut category = Category::new(input.title.trim().to_string(), input.description, slug);
        category.is_published = input.is_published;

        let created = self
            .repo
            .create(&category)
            .await
            .context("Failed to create category")?;

        tracing::info!(category_id = created.id, slug = %created.slug, "Category created");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get category by slug")?
            .ok_or_else(|| CategoryServiceError::NotFound(slug.to_string()))
    }

    /// A published category by slug. Unpublished ones are reported as
    /// `NotFound`.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Category, CategoryServiceError> {
        let category = self.get_by_slug(slug).await?;
        if !category.is_published {
            return Err(CategoryServiceError::NotFound(slug.to_string()));
        }
        Ok(category)
    }

    /// All categories ordered by title
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        let categories = self.repo.list().await.context("Failed to list categories")?;
        Ok(categories)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self.get_by_id(id).await?;

        if let Some(title) = input.title {
            category.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            category.description = description;
        }
        if let Some(slug) = input.slug {
            category.slug = slug.trim().to_string();
        }
        if let Some(is_published) = input.is_published {
            category.is_published = is_published;
        }

        validate(&category.title, &category.slug)?;
        self.ensure_slug_free(&category.slug, Some(id)).await?;

        let updated = self
            .repo
            .update(&category)
            .await
            .context("Failed to update category")?;
        Ok(updated)
    }

    /// Delete a category. Its posts remain, without a category.
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        self.get_by_id(id).await?;
        self.repo
            .delete(id)
            .await
            .context("Failed to delete category")?;
        tracing::info!(category_id = id, "Category deleted");
        Ok(())
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        current: Option<i64>,
    ) -> Result<(), CategoryServiceError> {
        let existing = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to check slug uniqueness")?;
        match existing {
            Some(other) if Some(other.id) != current => {
                Err(CategoryServiceError::DuplicateSlug(slug.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn validate(title: &str, slug: &str) -> Result<(), CategoryServiceError> {
    let mut errors = FieldErrors::new();
    check_required(&mut errors, "title", title, Some(MAX_TITLE_LENGTH));
    if !is_valid_slug(slug) {
        errors.add(
            "slug",
            "Enter a valid slug consisting of Latin letters, numbers, underscores or hyphens.",
        );
    }
    errors.into_result().map_err(CategoryServiceError::ValidationError)
}

fn fallback_slug() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("category-{}", &id[..8])
}
