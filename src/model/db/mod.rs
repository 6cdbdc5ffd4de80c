pub mod account;
pub mod candidate;
pub mod partylist;
pub mod position;
pub mod vote;

pub use account::{Account, NewAccount};
pub use candidate::{Candidate, NewCandidate};
pub use partylist::{NewPartylist, Partylist};
pub use position::Position;
pub use vote::{CandidateVotes, Vote};
