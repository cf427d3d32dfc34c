use std::sync::Arc;

use lepak_backend::db::RecordStore;
use lepak_backend::models::invitation::{InvitationKind, RsvpKind};
use lepak_backend::models::presence::PresenceKind;
use lepak_backend::services::channel::MessagingChannel;
use lepak_backend::services::fanout::FanoutNotifier;
use lepak_backend::services::invitations::InvitationService;

mod common;
use common::{init_test_telemetry, InMemoryStore, RecordingChannel};

struct Harness {
    store: Arc<InMemoryStore>,
    channel: Arc<RecordingChannel>,
    invitations: InvitationService,
    fanout: FanoutNotifier,
}

fn harness() -> Harness {
    init_test_telemetry();
    let store = Arc::new(InMemoryStore::new());
    let channel = Arc::new(RecordingChannel::new());
    let store_dyn = store.clone() as Arc<dyn RecordStore>;
    let channel_dyn = channel.clone() as Arc<dyn MessagingChannel>;
    Harness {
        invitations: InvitationService::new(store_dyn.clone()),
        fanout: FanoutNotifier::new(store_dyn, channel_dyn),
        store,
        channel,
    }
}

#[tokio::test]
async fn delivers_only_to_available_friends_and_isolates_failures() {
    let h = harness();
    let creator = h.store.seed_account(1, "Alice");

    // Five friends: two free, one free-later, two busy.
    let free_a = h.store.seed_account(11, "Ben");
    let free_b = h.store.seed_account(12, "Chloe");
    let later = h.store.seed_account(13, "Devi");
    let busy_a = h.store.seed_account(14, "Eng");
    let busy_b = h.store.seed_account(15, "Farah");
    for friend in [&free_a, &free_b, &later, &busy_a, &busy_b] {
        h.store.befriend(creator.id, friend.id);
    }
    h.store.set_presence_kind(free_a.id, PresenceKind::Free);
    h.store.set_presence_kind(free_b.id, PresenceKind::Free);
    h.store.set_presence_kind(later.id, PresenceKind::FreeLater);
    h.store.set_presence_kind(busy_a.id, PresenceKind::Busy);
    h.store.set_presence_kind(busy_b.id, PresenceKind::Busy);

    // One of the three eligible recipients is unreachable.
    h.channel.fail_delivery_to(free_b.chat_id);

    let invitation = h
        .invitations
        .create(creator.id, InvitationKind::Coffee, None, None)
        .await
        .unwrap();

    let delivered = h.fanout.notify_friends(&invitation, &creator).await;
    assert_eq!(delivered, 2);

    // Exactly the three free/free-later friends were attempted.
    let mut attempted = h.channel.attempted_chats();
    attempted.sort();
    assert_eq!(attempted, vec![free_a.chat_id, free_b.chat_id, later.chat_id]);

    // Receipts only for the two successes.
    assert_eq!(h.store.delivery_count(invitation.id), 2);

    // Each delivered message embeds the response controls.
    for message in h.channel.sent() {
        let keyboard = message.keyboard.expect("missing response controls");
        let payloads: Vec<String> = keyboard
            .into_iter()
            .flatten()
            .map(|b| b.callback_data)
            .collect();
        assert!(payloads.contains(&format!("jio:joined:{}", invitation.id)));
        assert!(payloads.contains(&format!("jio:maybe:{}", invitation.id)));
        assert!(payloads.contains(&format!("jio:declined:{}", invitation.id)));
    }
}

#[tokio::test]
async fn empty_eligible_set_returns_zero_without_side_effects() {
    let h = harness();
    let creator = h.store.seed_account(1, "Alice");
    let busy = h.store.seed_account(11, "Ben");
    h.store.befriend(creator.id, busy.id);
    h.store.set_presence_kind(busy.id, PresenceKind::Busy);

    let invitation = h
        .invitations
        .create(creator.id, InvitationKind::Food, None, None)
        .await
        .unwrap();

    let delivered = h.fanout.notify_friends(&invitation, &creator).await;

    assert_eq!(delivered, 0);
    assert!(h.channel.attempted_chats().is_empty());
    assert_eq!(h.store.delivery_count(invitation.id), 0);
}

#[tokio::test]
async fn creator_hears_about_positive_responses_only() {
    let h = harness();
    let creator = h.store.seed_account(1, "Alice");

    let invitation = h
        .invitations
        .create(creator.id, InvitationKind::Chill, None, None)
        .await
        .unwrap();

    h.fanout
        .notify_creator_of_response(&invitation, "Bob", RsvpKind::Declined)
        .await;
    h.fanout
        .notify_creator_of_response(&invitation, "Bob", RsvpKind::Maybe)
        .await;
    assert!(h.channel.sent_to(creator.chat_id).is_empty());

    h.fanout
        .notify_creator_of_response(&invitation, "Bob", RsvpKind::Joined)
        .await;
    let pings = h.channel.sent_to(creator.chat_id);
    assert_eq!(pings.len(), 1);
    assert!(pings[0].text.contains("Bob is in"));
}
