pub mod channel;
pub mod conversation;
pub mod fanout;
pub mod invitations;

pub use channel::{MessagingChannel, TelegramChannel};
pub use conversation::ConversationStateStore;
pub use fanout::FanoutNotifier;
pub use invitations::InvitationService;
