//! One-shot flash messages stored in the session.
//!
//! Write handlers push a message and redirect; the next page render takes
//! the messages out of the session and exposes them as `flash` props.

use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use backoffice_core::error::{AppError, ErrorKind};
use backoffice_core::result::AppResult;

const FLASH_SESSION_KEY: &str = "_flash";

/// Flash message severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    /// The operation completed.
    Success,
    /// Nothing went wrong but nothing changed either.
    Info,
    /// The operation completed partially.
    Warning,
    /// The operation failed.
    Error,
}

/// A single flash message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    /// Severity.
    pub kind: FlashKind,
    /// Text shown to the user.
    pub message: String,
}

impl FlashMessage {
    /// Create a flash message.
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a success message.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Success, message)
    }

    /// Create an info message.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Info, message)
    }

    /// Create a warning message.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Warning, message)
    }

    /// Create an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Error, message)
    }
}

/// Flash messages as page props: one slot per severity, last message wins.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FlashProps {
    /// Success message.
    pub success: Option<String>,
    /// Error message.
    pub error: Option<String>,
    /// Warning message.
    pub warning: Option<String>,
    /// Info message.
    pub info: Option<String>,
}

impl FromIterator<FlashMessage> for FlashProps {
    fn from_iter<I: IntoIterator<Item = FlashMessage>>(iter: I) -> Self {
        let mut props = Self::default();
        for msg in iter {
            let slot = match msg.kind {
                FlashKind::Success => &mut props.success,
                FlashKind::Error => &mut props.error,
                FlashKind::Warning => &mut props.warning,
                FlashKind::Info => &mut props.info,
            };
            *slot = Some(msg.message);
        }
        props
    }
}

fn session_error(action: &str, err: tower_sessions::session::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Internal,
        format!("Failed to {action} flash messages"),
        err,
    )
}

/// Append a message to the session.
pub async fn push(session: &Session, message: FlashMessage) -> AppResult<()> {
    let mut messages: Vec<FlashMessage> = session
        .get(FLASH_SESSION_KEY)
        .await
        .map_err(|e| session_error("read", e))?
        .unwrap_or_default();
    messages.push(message);
    session
        .insert(FLASH_SESSION_KEY, &messages)
        .await
        .map_err(|e| session_error("write", e))
}

/// Remove and return the pending messages.
pub async fn take(session: &Session) -> AppResult<Vec<FlashMessage>> {
    Ok(session
        .remove::<Vec<FlashMessage>>(FLASH_SESSION_KEY)
        .await
        .map_err(|e| session_error("read", e))?
        .unwrap_or_default())
}

/// Flash `message` and redirect to `to` with `303 See Other`.
pub async fn redirect_with(session: &Session, to: &str, message: FlashMessage) -> AppResult<Redirect> {
    push(session, message).await?;
    Ok(Redirect::to(to))
}
