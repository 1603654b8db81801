//! Event service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use evote_common::{AppError, AppResult, IdGenerator, to_minor_units};
use evote_db::entities::{event, event::VoteType};
use evote_db::repositories::{ContestantRepository, EventRepository};
use rust_decimal::Decimal;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::auth::Organizer;
use super::contestant::{ContestantResponse, check_url};

const fn default_max_votes() -> i32 {
    1
}

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2048))]
    pub logo_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub vote_type: VoteType,
    #[serde(default = "default_max_votes")]
    #[validate(range(min = 1))]
    pub max_votes_per_user: i32,
    /// Major units, e.g. `"2.00"`.
    pub price_per_vote: Option<Decimal>,
}

/// Input for updating an event. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2048))]
    pub logo_url: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub vote_type: Option<VoteType>,
    #[validate(range(min = 1))]
    pub max_votes_per_user: Option<i32>,
    pub price_per_vote: Option<Option<Decimal>>,
}

/// Event as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub public_id: String,
    pub organizer: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub vote_type: VoteType,
    pub max_votes_per_user: i32,
    pub price_per_vote: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<event::Model> for EventResponse {
    fn from(e: event::Model) -> Self {
        let price_per_vote = e.price_per_vote();
        Self {
            id: e.id,
            public_id: e.public_id,
            organizer: e.organizer_id,
            name: e.name,
            logo_url: e.logo_url,
            start_date: e.start_date.with_timezone(&Utc),
            end_date: e.end_date.with_timezone(&Utc),
            vote_type: e.vote_type,
            max_votes_per_user: e.max_votes_per_user,
            price_per_vote,
            created_at: e.created_at.with_timezone(&Utc),
            updated_at: e.updated_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// An event together with its contestants.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub contestants: Vec<ContestantResponse>,
}

/// Service for managing events.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    contestant_repo: ContestantRepository,
    id_gen: IdGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(event_repo: EventRepository, contestant_repo: ContestantRepository) -> Self {
        Self {
            event_repo,
            contestant_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an event owned by `organizer`.
    pub async fn create(
        &self,
        organizer: &Organizer,
        input: CreateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;
        if let Some(ref logo_url) = input.logo_url {
            check_url("logo_url", logo_url)?;
        }

        let price_minor = check_schedule(
            input.start_date,
            input.end_date,
            input.vote_type,
            input.price_per_vote,
        )?;

        let now = Utc::now();
        let model = event::ActiveModel {
            public_id: Set(self.id_gen.generate()),
            organizer_id: Set(organizer.id.clone()),
            name: Set(input.name),
            logo_url: Set(input.logo_url),
            start_date: Set(input.start_date.into()),
            end_date: Set(input.end_date.into()),
            vote_type: Set(input.vote_type),
            max_votes_per_user: Set(input.max_votes_per_user),
            price_per_vote_minor: Set(price_minor),
            created_at: Set(now.into()),
            updated_at: Set(None),
            ..Default::default()
        };

        let event = self.event_repo.create(model).await?;
        info!(event_id = event.id, organizer = %organizer.id, "Event created");
        Ok(event)
    }

    /// List the organizer's events, newest first, each with its contestants.
    pub async fn list(&self, organizer: &Organizer) -> AppResult<Vec<EventDetailResponse>> {
        let events = self.event_repo.find_by_organizer(&organizer.id).await?;
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();

        let mut by_event: HashMap<i64, Vec<ContestantResponse>> = HashMap::new();
        for contestant in self.contestant_repo.find_by_events(&ids).await? {
            by_event
                .entry(contestant.event_id)
                .or_default()
                .push(contestant.into());
        }

        Ok(events
            .into_iter()
            .map(|event| EventDetailResponse {
                contestants: by_event.remove(&event.id).unwrap_or_default(),
                event: event.into(),
            })
            .collect())
    }

    /// Get an event with its contestants.
    pub async fn get(&self, id: i64) -> AppResult<EventDetailResponse> {
        let event = self.event_repo.get_by_id(id).await?;
        let contestants = self.contestant_repo.find_by_event(event.id).await?;

        Ok(EventDetailResponse {
            event: event.into(),
            contestants: contestants.into_iter().map(Into::into).collect(),
        })
    }

    /// Update an event. Only the owner may do this.
    pub async fn update(
        &self,
        organizer: &Organizer,
        id: i64,
        input: UpdateEventInput,
    ) -> AppResult<event::Model> {
        input.validate()?;
        if let Some(Some(ref logo_url)) = input.logo_url {
            check_url("logo_url", logo_url)?;
        }

        let event = self.get_for_owner(organizer, id).await?;

        let start_date = input
            .start_date
            .unwrap_or_else(|| event.start_date.with_timezone(&Utc));
        let end_date = input
            .end_date
            .unwrap_or_else(|| event.end_date.with_timezone(&Utc));
        let vote_type = input.vote_type.unwrap_or(event.vote_type);
        let price_per_vote = match input.price_per_vote {
            Some(price) => price,
            // Switching to free drops a stored price instead of rejecting it.
            None if vote_type == VoteType::Free => None,
            None => event.price_per_vote(),
        };
        let price_minor = check_schedule(start_date, end_date, vote_type, price_per_vote)?;

        let mut active: event::ActiveModel = event.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(logo_url) = input.logo_url {
            active.logo_url = Set(logo_url);
        }
        if let Some(max_votes) = input.max_votes_per_user {
            active.max_votes_per_user = Set(max_votes);
        }
        active.start_date = Set(start_date.into());
        active.end_date = Set(end_date.into());
        active.vote_type = Set(vote_type);
        active.price_per_vote_minor = Set(price_minor);
        active.updated_at = Set(Some(Utc::now().into()));

        self.event_repo.update(active).await
    }

    /// Delete an event with its contestants, votes and payments.
    pub async fn delete(&self, organizer: &Organizer, id: i64) -> AppResult<()> {
        let event = self.get_for_owner(organizer, id).await?;
        self.event_repo.delete(event.id).await?;
        info!(event_id = id, organizer = %organizer.id, "Event deleted");
        Ok(())
    }

    /// Fetch an event and check it belongs to `organizer`.
    pub async fn get_for_owner(&self, organizer: &Organizer, id: i64) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_id(id).await?;
        if !organizer.owns(&event.organizer_id) {
            return Err(AppError::Forbidden("Not the event owner".to_string()));
        }
        Ok(event)
    }
}

/// Check the voting window and pricing; returns the price in minor units.
fn check_schedule(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    vote_type: VoteType,
    price_per_vote: Option<Decimal>,
) -> AppResult<Option<i64>> {
    if start_date >= end_date {
        return Err(AppError::Validation(
            "start_date must be before end_date".to_string(),
        ));
    }

    match (vote_type, price_per_vote) {
        (VoteType::Free, None) => Ok(None),
        (VoteType::Free, Some(_)) => Err(AppError::Validation(
            "Free events cannot have a price_per_vote".to_string(),
        )),
        (VoteType::Paid, None) => Err(AppError::Validation(
            "Paid events require a price_per_vote".to_string(),
        )),
        (VoteType::Paid, Some(price)) => {
            let minor = to_minor_units(price)?;
            if minor <= 0 {
                return Err(AppError::Validation(
                    "price_per_vote must be greater than zero".to_string(),
                ));
            }
            Ok(Some(minor))
        }
    }
}
