use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{RecordStore, StoreError};
use crate::models::invitation::{
    invitation_window, Invitation, InvitationKind, InvitationStatus, NewInvitation,
    ResponseSummary, RsvpKind,
};

#[derive(Debug, thiserror::Error)]
pub enum JioError {
    /// User-correctable input problem; the caller re-prompts with guidance.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Actor is not allowed to do this. Surfaced as a uniform denial.
    #[error("not allowed: {0}")]
    Authorization(String),

    /// Operation on an invitation that left the active state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates and mutates invitations and their responses. Owns every state
/// transition check so handlers can stay thin.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn RecordStore>,
}

impl InvitationService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create an active invitation expiring after the fixed window.
    /// `title` falls back to the kind's default.
    pub async fn create(
        &self,
        creator_id: Uuid,
        kind: InvitationKind,
        title: Option<String>,
        location_text: Option<String>,
    ) -> Result<Invitation, JioError> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| kind.default_title().to_string());

        let new = NewInvitation {
            creator_id,
            kind,
            title,
            location_text,
            expires_at: Utc::now() + invitation_window(),
        };

        let invitation = self.store.create_invitation(&new).await?;
        tracing::info!(
            invitation_id = %invitation.id,
            creator_id = %creator_id,
            kind = kind.as_str(),
            "created invitation"
        );
        Ok(invitation)
    }

    /// Creator-initiated cancel. Terminal; expired/cancelled jios stay put.
    pub async fn cancel(&self, invitation_id: Uuid, requester_id: Uuid) -> Result<(), JioError> {
        let invitation = self
            .store
            .get_invitation(invitation_id)
            .await?
            .ok_or_else(|| JioError::InvalidState("invitation not found".to_string()))?;

        if invitation.creator_id != requester_id {
            return Err(JioError::Authorization(format!(
                "user {} is not the creator of invitation {}",
                requester_id, invitation_id
            )));
        }
        if invitation.status != InvitationStatus::Active {
            return Err(JioError::InvalidState(format!(
                "invitation {} is not active",
                invitation_id
            )));
        }

        self.store.mark_cancelled(invitation_id).await?;
        tracing::info!(invitation_id = %invitation_id, "invitation cancelled");
        Ok(())
    }

    /// Record (or overwrite) a responder's answer. The store's uniqueness
    /// key on (invitation, responder) makes rapid double-taps collapse to
    /// one row. Returns the invitation so callers can reuse its title.
    pub async fn record_response(
        &self,
        invitation_id: Uuid,
        responder_id: Uuid,
        kind: RsvpKind,
    ) -> Result<Invitation, JioError> {
        let invitation = self
            .store
            .get_invitation(invitation_id)
            .await?
            .ok_or_else(|| JioError::InvalidState("invitation not found".to_string()))?;

        if invitation.status != InvitationStatus::Active {
            return Err(JioError::InvalidState(format!(
                "invitation {} is {:?}",
                invitation_id, invitation.status
            )));
        }

        self.store
            .upsert_rsvp(invitation_id, responder_id, kind, Utc::now())
            .await?;
        tracing::info!(
            invitation_id = %invitation_id,
            responder_id = %responder_id,
            response = kind.as_str(),
            "recorded response"
        );
        Ok(invitation)
    }

    /// Responses grouped for the creator's summary. Display order:
    /// joined, interested, maybe. Declines are only counted.
    pub async fn list_responses(&self, invitation_id: Uuid) -> Result<ResponseSummary, JioError> {
        let rsvps = self.store.list_rsvps(invitation_id).await?;

        let mut summary = ResponseSummary::default();
        for rsvp in rsvps {
            match rsvp.kind {
                RsvpKind::Joined => summary.joined.push(rsvp.display_name),
                RsvpKind::Interested => summary.interested.push(rsvp.display_name),
                RsvpKind::Maybe => summary.maybe.push(rsvp.display_name),
                RsvpKind::Declined => summary.declined_count += 1,
            }
        }
        Ok(summary)
    }
}
