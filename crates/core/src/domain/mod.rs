pub mod filter;
pub mod influencer;
pub mod pending_action;
