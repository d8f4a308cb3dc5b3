pub mod event;
pub mod participation;
pub mod payment;
pub mod ticket;

pub use event::{Event, EventCategory, EventStatus};
pub use participation::{Participation, ParticipationStatus};
pub use payment::{Payment, PaymentStatus};
