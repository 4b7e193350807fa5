pub mod availability;
pub mod doctor;

pub use availability::{generate_slots, interval_from_minutes, AvailabilityService};
pub use doctor::DoctorService;
