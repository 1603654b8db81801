//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod contestant;
pub mod event;
pub mod gateway;
pub mod payment;
pub mod vote;

pub use auth::{AuthService, Organizer};
pub use contestant::{
    ContestantResponse, ContestantService, CreateContestantInput, UpdateContestantInput,
};
pub use event::{
    CreateEventInput, EventDetailResponse, EventResponse, EventService, UpdateEventInput,
};
pub use gateway::{
    ChargeAuthorization, ChargeMetadata, ChargeRequest, PaymentGateway, PaystackGateway,
    VerifiedTransaction,
};
pub use payment::{
    InitiatePaymentInput, PaymentInitiation, PaymentResponse, PaymentService, VerifiedVote,
    VerifiedVoteResponse,
};
pub use vote::{VoteKind, VoteRecorder, VoteResponse};
