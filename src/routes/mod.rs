pub mod api;

pub use api::create_api_routes;

use std::sync::Arc;
use url::Url;

use crate::session::SessionController;

/// Shared state of the HTTP shell.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionController>,
    /// Page address that `?doc=` links are opened against.
    pub public_url: Url,
}
