pub mod account;
pub mod common;
pub mod events;
pub mod friendship;
pub mod invitation;
pub mod presence;
