//! Automatic answers to permission requests.
//!
//! The responder sits between the event feed and the transport. When a
//! `permission.asked` event arrives and the lineage policy accepts it, the
//! responder answers `once` on the user's behalf. Each permission ID is
//! answered at most once while it is remembered by [`RespondedCache`].
//!
//! Enabling auto-accept also sweeps permissions that were already pending.
//! The sweep is split in two ([`AutoResponder::begin_enable`] and
//! [`AutoResponder::finish_enable`]) so hosts that list permissions
//! asynchronously can drop a stale sweep: each enable/disable bumps a
//! per-key version and a sweep only runs if its version is still current.

pub mod responded;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use composer_protocol::{
    DirectoryEvent, PermissionReply, PermissionRequest, PermissionResponse, SyncEventKind,
};

use crate::auto_accept::preferences::PreferenceStore;
use crate::auto_accept::{accept_key, resolve_auto_accept, session_auto_accepts};
use crate::config::ComposerConfig;
use crate::error::Result;
use crate::tree::SessionNode;

pub use responded::RespondedCache;

/// Transport used to answer and list permission requests.
pub trait PermissionClient {
    fn respond(&self, response: &PermissionResponse) -> Result<()>;
    fn list(&self, directory: &str) -> Result<Vec<PermissionRequest>>;
}

/// Proof that an enable was started; see [`AutoResponder::finish_enable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableTicket {
    pub session_id: String,
    pub directory: String,
    key: String,
    version: u64,
}

pub struct AutoResponder<C> {
    client: C,
    store: PreferenceStore,
    responded: RespondedCache,
    enable_versions: HashMap<String, u64>,
}

impl<C: PermissionClient> AutoResponder<C> {
    pub fn new(client: C, store: PreferenceStore) -> Self {
        Self::with_cache(client, store, RespondedCache::default())
    }

    pub fn from_config(client: C, store: PreferenceStore, config: &ComposerConfig) -> Self {
        let cache = RespondedCache::new(config.responded_ttl(), config.responded_capacity());
        Self::with_cache(client, store, cache)
    }

    pub fn with_cache(client: C, store: PreferenceStore, responded: RespondedCache) -> Self {
        Self {
            client,
            store,
            responded,
            enable_versions: HashMap::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn responded(&self) -> &RespondedCache {
        &self.responded
    }

    /// Whether `permission` would be answered automatically.
    pub fn auto_responds<S: SessionNode>(
        &self,
        sessions: &[S],
        permission: &PermissionRequest,
        directory: Option<&str>,
    ) -> bool {
        resolve_auto_accept(self.store.auto_accept(), sessions, permission, directory)
    }

    pub fn is_auto_accepting<S: SessionNode>(
        &self,
        sessions: &[S],
        session_id: &str,
        directory: Option<&str>,
    ) -> bool {
        session_auto_accepts(self.store.auto_accept(), sessions, session_id, directory)
    }

    /// Answers `permission` with `once` unless it was already answered.
    ///
    /// Returns `Ok(true)` when a response was sent. A failed send forgets the
    /// ID so a later event can retry it.
    pub fn respond_once(
        &mut self,
        permission: &PermissionRequest,
        directory: Option<&str>,
    ) -> Result<bool> {
        self.respond_once_at(permission, directory, Utc::now())
    }

    fn respond_once_at(
        &mut self,
        permission: &PermissionRequest,
        directory: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if self.responded.mark(&permission.id, now) {
            debug!(permission_id = %permission.id, "Permission already answered, skipping");
            return Ok(false);
        }

        let response = PermissionResponse {
            session_id: permission.session_id.clone(),
            permission_id: permission.id.clone(),
            response: PermissionReply::Once,
            directory: directory.map(str::to_string),
        };

        if let Err(err) = self.client.respond(&response) {
            self.responded.forget(&permission.id);
            warn!(
                error = %err,
                permission_id = %permission.id,
                session_id = %permission.session_id,
                "Auto-response failed"
            );
            return Err(err);
        }

        debug!(
            permission_id = %permission.id,
            session_id = %permission.session_id,
            directory = ?directory,
            "Permission auto-accepted"
        );
        Ok(true)
    }

    /// Reacts to a feed event.
    ///
    /// `permission.asked` may be answered; `permission.replied` marks the ID
    /// as settled so a replayed ask is skipped. Questions are never answered.
    pub fn handle_event<S: SessionNode>(
        &mut self,
        event: &DirectoryEvent,
        sessions: &[S],
    ) -> Result<bool> {
        self.handle_event_at(event, sessions, Utc::now())
    }

    fn handle_event_at<S: SessionNode>(
        &mut self,
        event: &DirectoryEvent,
        sessions: &[S],
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(details) = event.details.as_ref() else {
            return Ok(false);
        };
        let directory = event.directory.as_deref();

        match details.kind() {
            SyncEventKind::PermissionAsked => {
                let Some(permission) = details.permission_asked() else {
                    warn!(event_type = %details.event_type, "Malformed permission event");
                    return Ok(false);
                };
                if !self.auto_responds(sessions, &permission, directory) {
                    return Ok(false);
                }
                self.respond_once_at(&permission, directory, now)
            }
            SyncEventKind::PermissionReplied => {
                // Answered elsewhere; a replayed ask must not be answered again.
                if let Some(permission_id) = details.replied_permission_id() {
                    self.responded.mark(permission_id, now);
                    debug!(permission_id = %permission_id, "Permission settled");
                }
                Ok(false)
            }
            SyncEventKind::QuestionAsked => {
                if let Some(question) = details.question_asked() {
                    debug!(
                        question_id = %question.id,
                        session_id = %question.session_id,
                        "Question awaits user input"
                    );
                }
                Ok(false)
            }
            SyncEventKind::Other => Ok(false),
        }
    }

    fn bump_version(&mut self, key: &str) -> u64 {
        let version = self.enable_versions.entry(key.to_string()).or_insert(0);
        *version += 1;
        *version
    }

    /// Records auto-accept for `session_id` and returns a ticket for the sweep.
    pub fn begin_enable(&mut self, session_id: &str, directory: &str) -> Result<EnableTicket> {
        let key = accept_key(session_id, Some(directory));
        let version = self.bump_version(&key);

        self.store.enable(session_id, directory);
        self.store.save_if_backed()?;

        Ok(EnableTicket {
            session_id: session_id.to_string(),
            directory: directory.to_string(),
            key,
            version,
        })
    }

    /// Answers the `pending` permissions that the new policy accepts.
    ///
    /// Does nothing if another enable or disable for the same key happened
    /// after `ticket` was issued, or if the session no longer auto-accepts.
    /// Returns how many permissions were answered.
    pub fn finish_enable<S: SessionNode>(
        &mut self,
        ticket: &EnableTicket,
        sessions: &[S],
        pending: &[PermissionRequest],
    ) -> usize {
        self.finish_enable_at(ticket, sessions, pending, Utc::now())
    }

    fn finish_enable_at<S: SessionNode>(
        &mut self,
        ticket: &EnableTicket,
        sessions: &[S],
        pending: &[PermissionRequest],
        now: DateTime<Utc>,
    ) -> usize {
        if self.enable_versions.get(&ticket.key) != Some(&ticket.version) {
            debug!(key = %ticket.key, "Stale auto-accept sweep dropped");
            return 0;
        }

        let directory = Some(ticket.directory.as_str());
        if !self.is_auto_accepting(sessions, &ticket.session_id, directory) {
            return 0;
        }

        let mut answered = 0;
        for permission in pending {
            if permission.id.is_empty() {
                continue;
            }
            if !self.auto_responds(sessions, permission, directory) {
                continue;
            }
            match self.respond_once_at(permission, directory, now) {
                Ok(true) => answered += 1,
                Ok(false) => {}
                // Already logged; keep sweeping the rest.
                Err(_) => {}
            }
        }
        answered
    }

    /// Enables auto-accept and answers permissions already pending in `directory`.
    ///
    /// A failure to list pending permissions is logged, not returned: the
    /// preference is already written.
    pub fn enable<S: SessionNode>(
        &mut self,
        sessions: &[S],
        session_id: &str,
        directory: &str,
    ) -> Result<usize> {
        let ticket = self.begin_enable(session_id, directory)?;
        let pending = match self.client.list(directory) {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, directory, "Failed to list pending permissions");
                return Ok(0);
            }
        };
        Ok(self.finish_enable(&ticket, sessions, &pending))
    }

    /// Enables auto-accept unless the session already auto-accepts.
    pub fn enable_if_needed<S: SessionNode>(
        &mut self,
        sessions: &[S],
        session_id: &str,
        directory: &str,
    ) -> Result<usize> {
        if self.is_auto_accepting(sessions, session_id, Some(directory)) {
            return Ok(0);
        }
        self.enable(sessions, session_id, directory)
    }

    pub fn disable(&mut self, session_id: &str, directory: Option<&str>) -> Result<()> {
        self.bump_version(&accept_key(session_id, directory));
        self.store.disable(session_id, directory);
        self.store.save_if_backed()
    }

    /// Flips auto-accept for `session_id`. Returns the new state.
    pub fn toggle<S: SessionNode>(
        &mut self,
        sessions: &[S],
        session_id: &str,
        directory: &str,
    ) -> Result<bool> {
        if self.is_auto_accepting(sessions, session_id, Some(directory)) {
            self.disable(session_id, Some(directory))?;
            return Ok(false);
        }
        self.enable(sessions, session_id, directory)?;
        Ok(true)
    }
}
