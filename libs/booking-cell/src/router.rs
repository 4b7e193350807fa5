// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/available-slots", get(handlers::get_available_slots));

    let protected_routes = Router::new()
        .route("/", get(handlers::list_bookings).post(handlers::create_booking))
        .route(
            "/{booking_id}",
            get(handlers::get_booking)
                .put(handlers::update_booking)
                .delete(handlers::delete_booking),
        )
        .route("/{booking_id}/cancel", put(handlers::cancel_booking))
        .route("/{booking_id}/complete", put(handlers::complete_booking))

        // Patient and doctor views
        .route("/patients/{patient_id}", get(handlers::get_patient_bookings))
        .route("/patients/{patient_id}/complete-latest", put(handlers::complete_latest_for_patient))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_bookings))
        .route("/doctors/{doctor_id}/active", get(handlers::get_active_doctor_bookings))
        .route("/doctors/{doctor_id}/today/count", get(handlers::get_todays_booked_count))
        .route("/doctors/{doctor_id}/today/completed-count", get(handlers::get_todays_completed_count))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
