pub mod animation;
pub mod conversation;
pub mod emotion;
