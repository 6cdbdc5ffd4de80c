//! Persistence for the election.
//!
//! Everything the services need from storage goes through the [`Store`] trait,
//! which has a MongoDB implementation for production and an in-memory one for
//! tests and local runs. Each method is atomic on its own: invariants that
//! would otherwise need a check-then-write sequence (one ballot per voter, the
//! approved-candidate cap, unique names) are enforced inside the store.

mod memory;
pub mod mongodb;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{
    common::{AccountId, ApprovalStatus, CandidateId, Decision, PartylistId, PositionId},
    db::{
        Account, Candidate, NewAccount, NewCandidate, NewPartylist, Partylist, Position, Vote,
    },
};

pub use self::memory::MemoryStore;
pub use self::mongodb::MongoStore;

/// A store shared between all requests.
pub type DynStore = Arc<dyn Store>;

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Insert an account, failing with `DuplicateStudentNumber` if the student
    /// number is taken.
    async fn insert_account(&self, account: NewAccount) -> Result<Account>;

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>>;

    async fn account_by_student_number(&self, student_number: &str) -> Result<Option<Account>>;

    async fn admin_exists(&self) -> Result<bool>;

    /// All positions, in ballot order.
    async fn positions(&self) -> Result<Vec<Position>>;

    /// Insert a position named `name`, placed after every existing position.
    async fn insert_position(&self, name: &str) -> Result<Position>;

    async fn position_by_id(&self, id: PositionId) -> Result<Option<Position>>;

    /// Take one approved-candidate slot on the position, unless `cap` slots are
    /// already taken. Returns whether a slot was taken.
    async fn reserve_candidate_slot(&self, position: PositionId, cap: u32) -> Result<bool>;

    /// Give back a slot taken by [`Store::reserve_candidate_slot`].
    async fn release_candidate_slot(&self, position: PositionId) -> Result<()>;

    /// Insert a partylist, failing with `DuplicateName` if the name is taken.
    async fn insert_partylist(&self, partylist: NewPartylist) -> Result<Partylist>;

    async fn partylist_by_id(&self, id: PartylistId) -> Result<Option<Partylist>>;

    /// Partylists in the given state, or all of them.
    async fn partylists(&self, status: Option<ApprovalStatus>) -> Result<Vec<Partylist>>;

    /// Apply a decision to a pending partylist. Returns `None` if there is no
    /// pending partylist with this ID.
    async fn decide_partylist(
        &self,
        id: PartylistId,
        decision: Decision,
    ) -> Result<Option<Partylist>>;

    /// Insert a candidacy, failing with `DuplicateApplication` if the student
    /// already applied for this position.
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate>;

    async fn candidate_by_id(&self, id: CandidateId) -> Result<Option<Candidate>>;

    /// Candidates in the given state, or all of them.
    async fn candidates(&self, status: Option<ApprovalStatus>) -> Result<Vec<Candidate>>;

    /// Apply a decision to a pending candidacy. Returns `None` if there is no
    /// pending candidacy with this ID.
    async fn decide_candidate(
        &self,
        id: CandidateId,
        decision: Decision,
    ) -> Result<Option<Candidate>>;

    /// Does the voter have any vote recorded?
    async fn has_voted(&self, voter: AccountId) -> Result<bool>;

    /// Record a whole ballot for the voter: either every vote is stored and
    /// the voter is marked as having voted, or nothing is. Fails with
    /// `AlreadyVoted` if the voter already cast a ballot.
    async fn cast_ballot(&self, voter: AccountId, votes: Vec<Vote>) -> Result<()>;

    /// Number of vote rows per candidate. Candidates without votes are absent.
    async fn vote_counts(&self) -> Result<HashMap<CandidateId, u64>>;
}
