//! Cookie session layer.

use time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_memory_store::MemoryStore;

use backoffice_core::config::SessionConfig;

/// Builds the session layer backed by an in-process store.
pub fn build_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    let expiry = if config.lifetime_minutes <= 0 {
        Expiry::OnSessionEnd
    } else {
        Expiry::OnInactivity(Duration::minutes(config.lifetime_minutes))
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(config.cookie_name.clone())
        .with_expiry(expiry)
        .with_secure(config.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
}
