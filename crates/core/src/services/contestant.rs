//! Contestant service.

use chrono::{DateTime, Utc};
use evote_common::{AppError, AppResult};
use evote_db::entities::contestant;
use evote_db::repositories::{ContestantRepository, EventRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::auth::Organizer;

/// Input for creating a contestant.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContestantInput {
    pub event_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub bio: Option<String>,
    #[validate(length(max = 2048))]
    pub photo_url: Option<String>,
}

/// Input for updating a contestant. The tally is not part of it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateContestantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub bio: Option<Option<String>>,
    #[validate(length(max = 2048))]
    pub photo_url: Option<Option<String>>,
}

/// Contestant as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ContestantResponse {
    pub id: i64,
    pub event: i64,
    pub name: String,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<contestant::Model> for ContestantResponse {
    fn from(c: contestant::Model) -> Self {
        Self {
            id: c.id,
            event: c.event_id,
            name: c.name,
            bio: c.bio,
            photo_url: c.photo_url,
            vote_count: c.vote_count,
            created_at: c.created_at.with_timezone(&Utc),
        }
    }
}

/// Service for managing contestants.
#[derive(Clone)]
pub struct ContestantService {
    contestant_repo: ContestantRepository,
    event_repo: EventRepository,
}

impl ContestantService {
    /// Create a new contestant service.
    #[must_use]
    pub const fn new(contestant_repo: ContestantRepository, event_repo: EventRepository) -> Self {
        Self {
            contestant_repo,
            event_repo,
        }
    }

    /// Add a contestant to an event the organizer owns.
    pub async fn create(
        &self,
        organizer: &Organizer,
        input: CreateContestantInput,
    ) -> AppResult<contestant::Model> {
        input.validate()?;
        if let Some(ref photo_url) = input.photo_url {
            check_url("photo_url", photo_url)?;
        }

        let event = self.event_repo.get_by_id(input.event_id).await?;
        if !organizer.owns(&event.organizer_id) {
            return Err(AppError::Forbidden("Not the event owner".to_string()));
        }

        let model = contestant::ActiveModel {
            event_id: Set(event.id),
            name: Set(input.name),
            bio: Set(input.bio),
            photo_url: Set(input.photo_url),
            vote_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            ..Default::default()
        };

        let contestant = self.contestant_repo.create(model).await?;
        info!(contestant_id = contestant.id, event_id = event.id, "Contestant created");
        Ok(contestant)
    }

    /// List an event's contestants.
    pub async fn list_by_event(&self, event_id: i64) -> AppResult<Vec<contestant::Model>> {
        let event = self.event_repo.get_by_id(event_id).await?;
        self.contestant_repo.find_by_event(event.id).await
    }

    /// Get a contestant by ID.
    pub async fn get(&self, id: i64) -> AppResult<contestant::Model> {
        self.contestant_repo.get_by_id(id).await
    }

    /// Update a contestant's profile.
    pub async fn update(
        &self,
        organizer: &Organizer,
        id: i64,
        input: UpdateContestantInput,
    ) -> AppResult<contestant::Model> {
        input.validate()?;
        if let Some(Some(ref photo_url)) = input.photo_url {
            check_url("photo_url", photo_url)?;
        }

        let contestant = self.get_for_owner(organizer, id).await?;

        let mut active: contestant::ActiveModel = contestant.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(bio);
        }
        if let Some(photo_url) = input.photo_url {
            active.photo_url = Set(photo_url);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.contestant_repo.update(active).await
    }

    /// Delete a contestant together with its votes and their payments.
    pub async fn delete(&self, organizer: &Organizer, id: i64) -> AppResult<()> {
        let contestant = self.get_for_owner(organizer, id).await?;
        self.contestant_repo.delete(contestant.id).await?;
        info!(contestant_id = id, organizer = %organizer.id, "Contestant deleted");
        Ok(())
    }

    async fn get_for_owner(
        &self,
        organizer: &Organizer,
        id: i64,
    ) -> AppResult<contestant::Model> {
        let contestant = self.contestant_repo.get_by_id(id).await?;
        let event = self.event_repo.get_by_id(contestant.event_id).await?;
        if !organizer.owns(&event.organizer_id) {
            return Err(AppError::Forbidden("Not the event owner".to_string()));
        }
        Ok(contestant)
    }
}

/// Reject anything that is not an absolute http(s) URL.
pub(crate) fn check_url(field: &str, value: &str) -> AppResult<()> {
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        _ => Err(AppError::Validation(format!("{field} must be an http(s) URL"))),
    }
}
