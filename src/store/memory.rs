use std::collections::HashMap;

use chrono::Utc;
use rocket::tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{
    auth::Rights,
    common::{AccountId, ApprovalStatus, CandidateId, Decision, PartylistId, PositionId},
    db::{
        Account, Candidate, NewAccount, NewCandidate, NewPartylist, Partylist, Position, Vote,
    },
};

use super::Store;

/// In-memory store.
///
/// All data lives behind a single lock and is lost when the store is dropped.
/// Holding the lock for the whole of each operation gives the same atomicity
/// the MongoDB store gets from indexes and transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    positions: Vec<Position>,
    partylists: Vec<Partylist>,
    candidates: Vec<Candidate>,
    votes: Vec<Vote>,
    last_id: u32,
}

impl Inner {
    /// Allocate the next ID. IDs are unique across all collections, which is
    /// stricter than needed but keeps the counter simple.
    fn next_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every vote row, in insertion order.
    pub async fn votes(&self) -> Vec<Vote> {
        self.inner.lock().await.votes.clone()
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let mut inner = self.inner.lock().await;
        if inner
            .accounts
            .iter()
            .any(|a| a.student_number == account.student_number)
        {
            return Err(Error::DuplicateStudentNumber);
        }
        let account = Account::new(inner.next_id(), account);
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn account_by_student_number(&self, student_number: &str) -> Result<Option<Account>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.student_number == student_number)
            .cloned())
    }

    async fn admin_exists(&self) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.iter().any(|a| a.role == Rights::Admin))
    }

    async fn positions(&self) -> Result<Vec<Position>> {
        let inner = self.inner.lock().await;
        let mut positions = inner.positions.clone();
        positions.sort_by_key(|p| p.order);
        Ok(positions)
    }

    async fn insert_position(&self, name: &str) -> Result<Position> {
        let mut inner = self.inner.lock().await;
        let order = inner
            .positions
            .iter()
            .map(|p| p.order + 1)
            .max()
            .unwrap_or(0);
        let position = Position::new(inner.next_id(), name, order);
        inner.positions.push(position.clone());
        Ok(position)
    }

    async fn position_by_id(&self, id: PositionId) -> Result<Option<Position>> {
        let inner = self.inner.lock().await;
        Ok(inner.positions.iter().find(|p| p.id == id).cloned())
    }

    async fn reserve_candidate_slot(&self, position: PositionId, cap: u32) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let position = inner
            .positions
            .iter_mut()
            .find(|p| p.id == position)
            .ok_or_else(|| Error::not_found(format!("Position {position}")))?;
        if position.has_open_slot(cap) {
            position.approved_count += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release_candidate_slot(&self, position: PositionId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(position) = inner.positions.iter_mut().find(|p| p.id == position) {
            position.approved_count = position.approved_count.saturating_sub(1);
        }
        Ok(())
    }

    async fn insert_partylist(&self, partylist: NewPartylist) -> Result<Partylist> {
        let mut inner = self.inner.lock().await;
        if inner.partylists.iter().any(|p| p.name == partylist.name) {
            return Err(Error::DuplicateName);
        }
        let partylist = Partylist::new(inner.next_id(), partylist);
        inner.partylists.push(partylist.clone());
        Ok(partylist)
    }

    async fn partylist_by_id(&self, id: PartylistId) -> Result<Option<Partylist>> {
        let inner = self.inner.lock().await;
        Ok(inner.partylists.iter().find(|p| p.id == id).cloned())
    }

    async fn partylists(&self, status: Option<ApprovalStatus>) -> Result<Vec<Partylist>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .partylists
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn decide_partylist(
        &self,
        id: PartylistId,
        decision: Decision,
    ) -> Result<Option<Partylist>> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .partylists
            .iter_mut()
            .find(|p| p.id == id && p.status.is_pending())
            .map(|partylist| {
                partylist.decide(&decision, Utc::now());
                partylist.clone()
            }))
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let mut inner = self.inner.lock().await;
        if inner.candidates.iter().any(|c| {
            c.student_number == candidate.student_number && c.position_id == candidate.position_id
        }) {
            return Err(Error::DuplicateApplication);
        }
        let candidate = Candidate::new(inner.next_id(), candidate);
        inner.candidates.push(candidate.clone());
        Ok(candidate)
    }

    async fn candidate_by_id(&self, id: CandidateId) -> Result<Option<Candidate>> {
        let inner = self.inner.lock().await;
        Ok(inner.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn candidates(&self, status: Option<ApprovalStatus>) -> Result<Vec<Candidate>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .candidates
            .iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }

    async fn decide_candidate(
        &self,
        id: CandidateId,
        decision: Decision,
    ) -> Result<Option<Candidate>> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .candidates
            .iter_mut()
            .find(|c| c.id == id && c.status.is_pending())
            .map(|candidate| {
                candidate.decide(&decision, Utc::now());
                candidate.clone()
            }))
    }

    async fn has_voted(&self, voter: AccountId) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.votes.iter().any(|v| v.voter_id == voter))
    }

    async fn cast_ballot(&self, voter: AccountId, votes: Vec<Vote>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let account = inner
            .accounts
            .iter()
            .position(|a| a.id == voter)
            .ok_or_else(|| Error::not_found(format!("Account {voter}")))?;
        if inner.accounts[account].has_voted || inner.votes.iter().any(|v| v.voter_id == voter) {
            return Err(Error::AlreadyVoted);
        }
        // Validate the whole ballot before touching anything.
        for (i, vote) in votes.iter().enumerate() {
            if vote.voter_id != voter {
                return Err(Error::BadRequest(format!(
                    "Vote for position {} does not belong to account {voter}",
                    vote.position_id
                )));
            }
            if votes[..i].iter().any(|v| v.position_id == vote.position_id) {
                return Err(Error::AlreadyVoted);
            }
        }
        inner.accounts[account].has_voted = true;
        inner.votes.extend(votes);
        Ok(())
    }

    async fn vote_counts(&self) -> Result<HashMap<CandidateId, u64>> {
        let inner = self.inner.lock().await;
        let mut counts = HashMap::new();
        for vote in &inner.votes {
            *counts.entry(vote.candidate_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
