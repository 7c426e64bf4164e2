/// Application routes configuration
use crate::handlers::{
    get_atmosphere, get_enhanced_sun_times, get_equipment_recommendation, get_events, get_moon,
    get_planet, get_shadow, get_sun_path, get_sun_times, get_timezone, get_visible_planets, health,
    put_equipment_inventory, AppState,
};
use axum::{
    routing::{get, put},
    Router,
};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        .route("/timezone", get(get_timezone))
        // Sun endpoints
        .route("/sun/times", get(get_sun_times))
        .route("/sun/times/enhanced", get(get_enhanced_sun_times))
        .route("/sun/path", get(get_sun_path))
        .route("/sun/shadow", get(get_shadow))
        // Moon and planets
        .route("/moon", get(get_moon))
        .route("/planets", get(get_visible_planets))
        .route("/planets/:planet", get(get_planet))
        .route("/events", get(get_events))
        .route("/atmosphere", get(get_atmosphere))
        // Equipment
        .route("/equipment/recommendation/:target", get(get_equipment_recommendation))
        .route("/equipment/inventory", put(put_equipment_inventory))
        .with_state(state)
}
