//! Session/profile state container.
//!
//! Single authority for who is logged in and the only component that calls
//! the backend. State is published over a `watch` channel so the UI and the
//! navigator can observe it; operations are plain async calls the caller
//! awaits. Calls are not serialized against each other: two concurrent
//! writes both reach the store and the last one applied in memory wins.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::{Backend, Document},
    config::SessionConfig,
    error::SessionError,
    user::{
        parse_age, timestamp_value, to_fields, NewUserDocument, ProfilePatch, RegistrationDraft,
        UserRecord,
    },
};

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<UserRecord>,
    pub is_loading: bool,
    pub show_splash: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            user: None,
            is_loading: true,
            show_splash: true,
        }
    }
}

/// Image bytes handed over by the picker.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub body: Bytes,
    pub content_type: String,
    pub source_uri: Option<String>,
}

pub struct Session {
    backend: Backend,
    config: SessionConfig,
    state: Arc<watch::Sender<SessionSnapshot>>,
    splash: JoinHandle<()>,
}

impl Session {
    /// Build the container and arm the one-shot splash timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(backend: Backend, config: SessionConfig) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::initial());
        let state = Arc::new(tx);

        let timer_state = Arc::clone(&state);
        let delay = config.splash_delay;
        let splash = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            timer_state.send_modify(|s| {
                s.show_splash = false;
                s.is_loading = false;
            });
            debug!(delay_ms = delay.as_millis() as u64, "splash finished");
        });

        Self {
            backend,
            config,
            state,
            splash,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.state.borrow().user.clone()
    }

    fn current_user_id(&self) -> Option<String> {
        self.state.borrow().user.as_ref().map(|u| u.id.clone())
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.is_loading != loading;
            s.is_loading = loading;
            changed
        });
    }

    /// Apply `f` to the session user if `user_id` is still the one logged in.
    fn merge_into_session(&self, user_id: &str, f: impl FnOnce(&mut UserRecord)) {
        self.state.send_if_modified(|s| match s.user.as_mut() {
            Some(user) if user.id == user_id => {
                f(user);
                true
            }
            _ => {
                debug!(%user_id, "session changed during write; in-memory merge skipped");
                false
            }
        });
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Document>, SessionError> {
        self.backend
            .documents
            .find_by_field(
                &self.config.users_collection,
                "email",
                &Value::String(email.to_string()),
            )
            .await
            .map_err(SessionError::backend)
    }

    /// Log in by exact email match and plaintext password comparison.
    ///
    /// When several records share the email, the first one the store returns
    /// is used.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord, SessionError> {
        self.set_loading(true);
        let result = self.try_login(email, password).await;
        self.set_loading(false);

        match &result {
            Ok(user) => info!(user_id = %user.id, "login succeeded"),
            Err(e) => warn!(error = %e, "login failed"),
        }
        result
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<UserRecord, SessionError> {
        let docs = self.find_by_email(email).await?;
        if docs.len() > 1 {
            warn!(matches = docs.len(), "several users share this email");
        }
        let doc = docs.into_iter().next().ok_or(SessionError::UserNotFound)?;
        let user = UserRecord::from_document(doc).map_err(SessionError::backend)?;

        // TODO: hash passwords; existing records store them as entered and
        // would need rewriting on first successful login.
        if user.password != password {
            return Err(SessionError::InvalidCredentials);
        }

        self.state.send_modify(|s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// Create a user record. The new user is not logged in.
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn register(&self, draft: RegistrationDraft) -> Result<String, SessionError> {
        self.set_loading(true);
        let result = self.try_register(draft).await;
        self.set_loading(false);

        match &result {
            Ok(id) => info!(user_id = %id, "user registered"),
            Err(e) => warn!(error = %e, "registration failed"),
        }
        result
    }

    async fn try_register(&self, draft: RegistrationDraft) -> Result<String, SessionError> {
        let age = parse_age(&draft.age).ok_or_else(|| SessionError::InvalidAge(draft.age.clone()))?;

        // Not atomic with the insert below: two concurrent registrations with
        // the same email can both pass this check.
        if !self.find_by_email(&draft.email).await?.is_empty() {
            return Err(SessionError::EmailTaken);
        }

        let fields = to_fields(&NewUserDocument {
            name: &draft.name,
            email: &draft.email,
            password: &draft.password,
            age,
            specialty: draft.specialty,
            profile_image: "",
            created_at: OffsetDateTime::now_utc(),
        })
        .map_err(SessionError::backend)?;

        self.backend
            .documents
            .insert(&self.config.users_collection, fields)
            .await
            .map_err(SessionError::backend)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.state.send_if_modified(|s| s.user.take().is_some());
        info!("session closed");
        Ok(())
    }

    /// Merge `patch` into the stored record, then into the session copy once
    /// the store has confirmed the write.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<(), SessionError> {
        let user_id = self.current_user_id().ok_or(SessionError::NoActiveSession)?;
        let now = OffsetDateTime::now_utc();

        let mut fields = patch.to_fields().map_err(SessionError::update_failed)?;
        fields.insert(
            "updated_at".into(),
            timestamp_value(now).map_err(SessionError::update_failed)?,
        );

        if let Err(e) = self
            .backend
            .documents
            .update(&self.config.users_collection, &user_id, fields)
            .await
        {
            warn!(%user_id, error = %e, "profile update failed");
            return Err(SessionError::update_failed(e));
        }

        self.merge_into_session(&user_id, |user| {
            patch.apply_to(user);
            user.updated_at = Some(now);
        });
        info!(%user_id, "profile updated");
        Ok(())
    }

    /// Upload a new profile photo and link its public URL to the profile.
    ///
    /// A blob uploaded before a later step fails is left in place.
    #[instrument(skip(self, image), fields(bytes = image.body.len(), source = ?image.source_uri))]
    pub async fn upload_profile_image(&self, image: ImagePayload) -> Result<String, SessionError> {
        let user_id = self.current_user_id().ok_or(SessionError::NoActiveSession)?;
        if image.body.is_empty() {
            return Err(SessionError::NoImage);
        }

        let result = self.try_upload(&user_id, image).await;
        match &result {
            Ok(url) => info!(%user_id, %url, "profile image updated"),
            Err(e) => warn!(%user_id, error = %e, "profile image upload failed"),
        }
        result
    }

    async fn try_upload(&self, user_id: &str, image: ImagePayload) -> Result<String, SessionError> {
        let now = OffsetDateTime::now_utc();
        let path = image_path(&self.config.image_prefix, user_id, now, &image.content_type);

        let blob = self
            .backend
            .blobs
            .upload(&path, image.body, &image.content_type)
            .await
            .map_err(SessionError::upload_failed)?;
        let url = self
            .backend
            .blobs
            .public_url(&blob)
            .await
            .map_err(SessionError::upload_failed)?;

        let mut fields = serde_json::Map::new();
        fields.insert("profile_image".into(), Value::String(url.clone()));
        fields.insert(
            "updated_at".into(),
            timestamp_value(now).map_err(SessionError::upload_failed)?,
        );
        self.backend
            .documents
            .update(&self.config.users_collection, user_id, fields)
            .await
            .map_err(SessionError::upload_failed)?;

        self.merge_into_session(user_id, |user| {
            user.profile_image = url.clone();
            user.updated_at = Some(now);
        });
        Ok(url)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.splash.abort();
    }
}

/// `{prefix}/{user_id}_{unix_millis}[.ext]`
fn image_path(prefix: &str, user_id: &str, at: OffsetDateTime, content_type: &str) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    let base = format!("{}/{}_{}", prefix.trim_end_matches('/'), user_id, millis);
    match ext_from_mime(content_type) {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
