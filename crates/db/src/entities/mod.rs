//! Database entities.

pub mod contestant;
pub mod event;
pub mod payment;
pub mod vote;

pub use contestant::Entity as Contestant;
pub use event::Entity as Event;
pub use payment::Entity as Payment;
pub use vote::Entity as Vote;
