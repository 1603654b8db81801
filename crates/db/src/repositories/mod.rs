//! Repositories for database access.

mod contestant;
mod event;
mod payment;
mod vote;

pub use contestant::ContestantRepository;
pub use event::EventRepository;
pub use payment::PaymentRepository;
pub use vote::VoteRepository;
