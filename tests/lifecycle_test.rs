use std::sync::Arc;

use chrono::{Duration, Utc};
use lepak_backend::models::invitation::{InvitationKind, InvitationStatus, RsvpKind};
use lepak_backend::services::invitations::{InvitationService, JioError};

mod common;
use common::{init_test_telemetry, InMemoryStore};

fn service(store: &Arc<InMemoryStore>) -> InvitationService {
    init_test_telemetry();
    InvitationService::new(store.clone() as Arc<dyn lepak_backend::db::RecordStore>)
}

#[tokio::test]
async fn create_uses_default_title_and_fixed_window() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let service = service(&store);

    let before = Utc::now();
    let invitation = service
        .create(creator.id, InvitationKind::Coffee, None, None)
        .await
        .expect("create failed");

    assert_eq!(invitation.title, "Kopi anyone?");
    assert_eq!(invitation.status, InvitationStatus::Active);
    assert!(invitation.expires_at >= before + Duration::minutes(119));
    assert!(invitation.expires_at <= Utc::now() + Duration::hours(2));
}

#[tokio::test]
async fn blank_custom_title_falls_back_to_default() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let service = service(&store);

    let invitation = service
        .create(
            creator.id,
            InvitationKind::Custom,
            Some("   ".to_string()),
            None,
        )
        .await
        .expect("create failed");

    assert_eq!(invitation.title, "Hang out?");
}

#[tokio::test]
async fn repeated_responses_collapse_to_one_row() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let responder = store.seed_account(2, "Bob");
    let service = service(&store);

    let invitation = service
        .create(creator.id, InvitationKind::Food, None, None)
        .await
        .unwrap();

    // Rapid double-tap of the same button.
    service
        .record_response(invitation.id, responder.id, RsvpKind::Maybe)
        .await
        .unwrap();
    service
        .record_response(invitation.id, responder.id, RsvpKind::Maybe)
        .await
        .unwrap();

    let rows = store.rsvp_rows(invitation.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], (responder.id, RsvpKind::Maybe));

    // A change of mind overwrites rather than inserting a second row.
    service
        .record_response(invitation.id, responder.id, RsvpKind::Joined)
        .await
        .unwrap();

    let rows = store.rsvp_rows(invitation.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], (responder.id, RsvpKind::Joined));
}

#[tokio::test]
async fn responses_to_terminal_invitations_are_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let responder = store.seed_account(2, "Bob");
    let service = service(&store);

    for status in [InvitationStatus::Cancelled, InvitationStatus::Expired] {
        let invitation = service
            .create(creator.id, InvitationKind::Chill, None, None)
            .await
            .unwrap();
        store.set_invitation_status(invitation.id, status);

        let result = service
            .record_response(invitation.id, responder.id, RsvpKind::Joined)
            .await;

        assert!(matches!(result, Err(JioError::InvalidState(_))));
        assert!(store.rsvp_rows(invitation.id).is_empty());
    }
}

#[tokio::test]
async fn only_the_creator_can_cancel() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let other = store.seed_account(2, "Bob");
    let service = service(&store);

    let invitation = service
        .create(creator.id, InvitationKind::Game, None, None)
        .await
        .unwrap();

    let result = service.cancel(invitation.id, other.id).await;
    assert!(matches!(result, Err(JioError::Authorization(_))));
    assert_eq!(
        store.invitation(invitation.id).unwrap().status,
        InvitationStatus::Active
    );

    service.cancel(invitation.id, creator.id).await.unwrap();
    assert_eq!(
        store.invitation(invitation.id).unwrap().status,
        InvitationStatus::Cancelled
    );
}

#[tokio::test]
async fn cancel_is_terminal() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let service = service(&store);

    let invitation = service
        .create(creator.id, InvitationKind::Movie, None, None)
        .await
        .unwrap();
    service.cancel(invitation.id, creator.id).await.unwrap();

    let again = service.cancel(invitation.id, creator.id).await;
    assert!(matches!(again, Err(JioError::InvalidState(_))));
}

#[tokio::test]
async fn response_summary_groups_and_hides_declines() {
    let store = Arc::new(InMemoryStore::new());
    let creator = store.seed_account(1, "Alice");
    let bob = store.seed_account(2, "Bob");
    let carol = store.seed_account(3, "Carol");
    let dave = store.seed_account(4, "Dave");
    let service = service(&store);

    let invitation = service
        .create(creator.id, InvitationKind::Study, None, None)
        .await
        .unwrap();

    service
        .record_response(invitation.id, bob.id, RsvpKind::Joined)
        .await
        .unwrap();
    service
        .record_response(invitation.id, carol.id, RsvpKind::Maybe)
        .await
        .unwrap();
    service
        .record_response(invitation.id, dave.id, RsvpKind::Declined)
        .await
        .unwrap();

    let summary = service.list_responses(invitation.id).await.unwrap();
    assert_eq!(summary.joined, vec!["Bob".to_string()]);
    assert!(summary.interested.is_empty());
    assert_eq!(summary.maybe, vec!["Carol".to_string()]);
    assert_eq!(summary.declined_count, 1);
}
