mod collection;
mod counter;
mod errors;

use std::collections::HashMap;

use chrono::Utc;
use log::{info, warn};
use mongodb::{
    bson::{doc, from_document, DateTime as BsonDateTime, Document},
    options::{FindOneAndUpdateOptions, FindOneOptions, FindOptions, ReturnDocument},
    error::Error as DbError,
    Client, ClientSession, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    auth::Rights,
    common::{AccountId, ApprovalStatus, CandidateId, Decision, PartylistId, PositionId},
    db::{
        Account, Candidate, CandidateVotes, NewAccount, NewCandidate, NewPartylist, Partylist,
        Position, Vote,
    },
};

pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::Counter;
pub use errors::{is_duplicate_key_error, is_write_conflict};

use super::Store;

/// MongoDB-backed store.
///
/// Ballot casting uses a multi-document transaction, so the server must be
/// part of a replica set.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    accounts: Coll<Account>,
    positions: Coll<Position>,
    partylists: Coll<Partylist>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    counters: Coll<Counter>,
}

impl MongoStore {
    /// Connect to the database and make sure the indexes exist.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        ensure_indexes_exist(&db).await?;
        info!("Using database {db_name}");
        Ok(Self::new(client, &db))
    }

    pub fn new(client: Client, db: &Database) -> Self {
        Self {
            client,
            accounts: Coll::from_db(db),
            positions: Coll::from_db(db),
            partylists: Coll::from_db(db),
            candidates: Coll::from_db(db),
            votes: Coll::from_db(db),
            counters: Coll::from_db(db),
        }
    }
}

/// The `$set` document recording a decision.
fn decision_update(decision: &Decision) -> Document {
    let mut set = doc! {
        "status": decision.status(),
        "decided_at": BsonDateTime::from_chrono(Utc::now()),
    };
    if let Some(reason) = decision.reason() {
        set.insert("rejection_reason", reason);
    }
    doc! { "$set": set }
}

/// Filter by status if one is given.
fn status_filter(status: Option<ApprovalStatus>) -> Document {
    match status {
        Some(status) => doc! { "status": status },
        None => doc! {},
    }
}

/// Abort a transaction that has already failed, keeping the original error.
async fn abort(session: &mut ClientSession) {
    if let Err(e) = session.abort_transaction().await {
        warn!("Failed to abort transaction: {e}");
    }
}

/// Another ballot by the same voter won the race.
fn ballot_error(err: DbError) -> Error {
    if is_duplicate_key_error(&err) || is_write_conflict(&err) {
        Error::AlreadyVoted
    } else {
        err.into()
    }
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let id = Counter::next_id::<Account>(&self.counters).await?;
        let account = Account::new(id, account);
        match self.accounts.insert_one(&account, None).await {
            Ok(_) => Ok(account),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::DuplicateStudentNumber),
            Err(e) => Err(e.into()),
        }
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.accounts.find_one(doc! { "_id": id }, None).await?)
    }

    async fn account_by_student_number(&self, student_number: &str) -> Result<Option<Account>> {
        let filter = doc! { "student_number": student_number };
        Ok(self.accounts.find_one(filter, None).await?)
    }

    async fn admin_exists(&self) -> Result<bool> {
        let admins = self
            .accounts
            .count_documents(doc! { "role": Rights::Admin }, None)
            .await?;
        Ok(admins > 0)
    }

    async fn positions(&self) -> Result<Vec<Position>> {
        let options = FindOptions::builder().sort(doc! { "order": 1 }).build();
        Ok(self
            .positions
            .find(None, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn insert_position(&self, name: &str) -> Result<Position> {
        let id = Counter::next_id::<Position>(&self.counters).await?;
        let options = FindOneOptions::builder().sort(doc! { "order": -1 }).build();
        let last = self.positions.find_one(None, options).await?;
        let order = last.map_or(0, |p| p.order + 1);
        let position = Position::new(id, name, order);
        self.positions.insert_one(&position, None).await?;
        Ok(position)
    }

    async fn position_by_id(&self, id: PositionId) -> Result<Option<Position>> {
        Ok(self.positions.find_one(doc! { "_id": id }, None).await?)
    }

    async fn reserve_candidate_slot(&self, position: PositionId, cap: u32) -> Result<bool> {
        // Only matches while a slot is free, so concurrent reservations cannot overshoot.
        let filter = doc! {
            "_id": position,
            "approved_count": { "$lt": cap },
        };
        let update = doc! { "$inc": { "approved_count": 1 } };
        let reserved = self
            .positions
            .find_one_and_update(filter, update, None)
            .await?
            .is_some();
        if !reserved && self.position_by_id(position).await?.is_none() {
            return Err(Error::not_found(format!("Position {position}")));
        }
        Ok(reserved)
    }

    async fn release_candidate_slot(&self, position: PositionId) -> Result<()> {
        let filter = doc! {
            "_id": position,
            "approved_count": { "$gt": 0 },
        };
        let update = doc! { "$inc": { "approved_count": -1 } };
        self.positions.update_one(filter, update, None).await?;
        Ok(())
    }

    async fn insert_partylist(&self, partylist: NewPartylist) -> Result<Partylist> {
        let id = Counter::next_id::<Partylist>(&self.counters).await?;
        let partylist = Partylist::new(id, partylist);
        match self.partylists.insert_one(&partylist, None).await {
            Ok(_) => Ok(partylist),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::DuplicateName),
            Err(e) => Err(e.into()),
        }
    }

    async fn partylist_by_id(&self, id: PartylistId) -> Result<Option<Partylist>> {
        Ok(self.partylists.find_one(doc! { "_id": id }, None).await?)
    }

    async fn partylists(&self, status: Option<ApprovalStatus>) -> Result<Vec<Partylist>> {
        Ok(self
            .partylists
            .find(status_filter(status), None)
            .await?
            .try_collect()
            .await?)
    }

    async fn decide_partylist(
        &self,
        id: PartylistId,
        decision: Decision,
    ) -> Result<Option<Partylist>> {
        let filter = doc! {
            "_id": id,
            "status": ApprovalStatus::Pending,
        };
        Ok(self
            .partylists
            .find_one_and_update(filter, decision_update(&decision), return_updated())
            .await?)
    }

    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let id = Counter::next_id::<Candidate>(&self.counters).await?;
        let candidate = Candidate::new(id, candidate);
        match self.candidates.insert_one(&candidate, None).await {
            Ok(_) => Ok(candidate),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::DuplicateApplication),
            Err(e) => Err(e.into()),
        }
    }

    async fn candidate_by_id(&self, id: CandidateId) -> Result<Option<Candidate>> {
        Ok(self.candidates.find_one(doc! { "_id": id }, None).await?)
    }

    async fn candidates(&self, status: Option<ApprovalStatus>) -> Result<Vec<Candidate>> {
        Ok(self
            .candidates
            .find(status_filter(status), None)
            .await?
            .try_collect()
            .await?)
    }

    async fn decide_candidate(
        &self,
        id: CandidateId,
        decision: Decision,
    ) -> Result<Option<Candidate>> {
        let filter = doc! {
            "_id": id,
            "status": ApprovalStatus::Pending,
        };
        Ok(self
            .candidates
            .find_one_and_update(filter, decision_update(&decision), return_updated())
            .await?)
    }

    async fn has_voted(&self, voter: AccountId) -> Result<bool> {
        let votes = self
            .votes
            .count_documents(doc! { "voter_id": voter }, None)
            .await?;
        Ok(votes > 0)
    }

    async fn cast_ballot(&self, voter: AccountId, votes: Vec<Vote>) -> Result<()> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        // Flip the flag first: a concurrent ballot for the same voter conflicts here.
        let filter = doc! {
            "_id": voter,
            "has_voted": false,
        };
        let update = doc! { "$set": { "has_voted": true } };
        let result = self
            .accounts
            .update_one_with_session(filter, update, None, &mut session)
            .await;
        match result {
            Ok(result) if result.modified_count == 1 => {}
            Ok(_) => {
                abort(&mut session).await;
                return Err(Error::AlreadyVoted);
            }
            Err(e) => {
                abort(&mut session).await;
                return Err(ballot_error(e));
            }
        }

        if let Err(e) = self
            .votes
            .insert_many_with_session(&votes, None, &mut session)
            .await
        {
            abort(&mut session).await;
            return Err(ballot_error(e));
        }

        session.commit_transaction().await.map_err(ballot_error)
    }

    async fn vote_counts(&self) -> Result<HashMap<CandidateId, u64>> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": "$candidate_id",
                "votes": { "$sum": 1 },
            }
        }];
        let mut cursor = self.votes.aggregate(pipeline, None).await?;
        let mut counts = HashMap::new();
        while let Some(row) = cursor.try_next().await? {
            let row: CandidateVotes = from_document(row)?;
            counts.insert(row.candidate_id, row.votes);
        }
        Ok(counts)
    }
}
