pub mod booking;
pub mod lifecycle;

pub use booking::{BookingService, NewBooking};
pub use lifecycle::BookingLifecycleService;
