//! Shared application state.

use std::sync::Arc;

use tienda_db::Database;

use crate::auth::{JwtDecoder, PermissionGate};
use crate::config::ApiConfig;
use crate::notify::{MailError, NotificationDispatcher};
use crate::pdf::{DocumentRenderer, PdfRenderer};

/// State handed to every handler as `State<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub gate: PermissionGate,
    pub notifier: NotificationDispatcher,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// Wires the production collaborators from configuration.
    pub fn from_config(db: Database, config: &ApiConfig) -> Result<Self, MailError> {
        Ok(AppState {
            db,
            gate: PermissionGate::new(Arc::new(JwtDecoder::new(&config.auth.jwt_secret))),
            notifier: NotificationDispatcher::from_config(&config.mail)?,
            renderer: Arc::new(PdfRenderer),
        })
    }
}
