pub mod status;

pub use status::{ApprovalStatus, Decision};

pub type AccountId = u32;
pub type PositionId = u32;
pub type PartylistId = u32;
pub type CandidateId = u32;

/// Partylist name reported for candidates running without one.
pub const INDEPENDENT: &str = "Independent";
