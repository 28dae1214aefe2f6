pub mod config;
pub mod domain;
pub mod errors;
pub mod format;

pub use domain::filter::{RawFilter, SearchFilter, Vocabulary, LOCATION_SAMPLE_CAP};
pub use domain::influencer::{Influencer, InfluencerId, PricePoint, Profile, TIER_NAMES};
pub use domain::pending_action::{
    ActionStatus, PendingAction, PendingActionId, ACTION_TYPE_DELETE_INFLUENCER,
};
pub use errors::DomainError;
pub use format::format_results;
