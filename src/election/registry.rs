use std::collections::HashMap;

use log::{error, info};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        candidacy::{CandidacyApplication, CandidateSummary, PendingCandidate, PositionCandidates},
        partylist::{PartylistDesc, PartylistRegistration, PartylistSummary},
    },
    common::{ApprovalStatus, CandidateId, Decision, PartylistId},
    db::{Account, Candidate, Partylist},
};
use crate::store::Store;

use super::{affiliation_name, partylist_names};

/// Register a new partylist on behalf of `account`. It starts out pending.
pub async fn register_partylist(
    store: &dyn Store,
    account: &Account,
    registration: PartylistRegistration,
) -> Result<Partylist> {
    let partylist = registration.into_partylist(account.id)?;
    let partylist = store.insert_partylist(partylist).await?;
    info!(
        "Account {} registered partylist {} ({})",
        account.id, partylist.name, partylist.id
    );
    Ok(partylist)
}

/// Apply for candidacy on behalf of `account`. The application starts out
/// pending.
///
/// Applications for a position that already has `cap` approved candidates
/// are turned away early; the cap itself is enforced at approval.
pub async fn apply_for_candidacy(
    store: &dyn Store,
    account: &Account,
    application: CandidacyApplication,
    cap: u32,
) -> Result<Candidate> {
    let candidate = application.into_candidate(account)?;

    let position = store
        .position_by_id(candidate.position_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Position {}", candidate.position_id)))?;

    if let Some(partylist_id) = candidate.partylist_id {
        let partylist = store
            .partylist_by_id(partylist_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Partylist {partylist_id}")))?;
        if partylist.status != ApprovalStatus::Approved {
            return Err(Error::BadRequest(format!(
                "Partylist {} is not approved",
                partylist.name
            )));
        }
    }

    if !position.has_open_slot(cap) {
        return Err(Error::PositionFull(cap));
    }

    let candidate = store.insert_candidate(candidate).await?;
    info!(
        "Account {} applied for {} as candidate {}",
        account.id, position.name, candidate.id
    );
    Ok(candidate)
}

/// Approve a pending candidacy, taking one of the position's `cap` slots.
pub async fn approve_candidate(store: &dyn Store, id: CandidateId, cap: u32) -> Result<Candidate> {
    let candidate = pending_candidate(store, id).await?;

    if !store
        .reserve_candidate_slot(candidate.position_id, cap)
        .await?
    {
        return Err(Error::CapExceeded(cap));
    }

    // Give the slot back if somebody else decided first.
    let decided = store.decide_candidate(id, Decision::Approve).await;
    if !matches!(decided, Ok(Some(_))) {
        if let Err(e) = store.release_candidate_slot(candidate.position_id).await {
            error!(
                "Failed to release slot on position {}: {e}",
                candidate.position_id
            );
        }
    }
    let candidate = decided?.ok_or_else(|| Error::NotPending(format!("Candidate {id}")))?;

    info!("Approved candidate {id}");
    Ok(candidate)
}

/// Reject a pending candidacy.
pub async fn reject_candidate(
    store: &dyn Store,
    id: CandidateId,
    reason: String,
) -> Result<Candidate> {
    pending_candidate(store, id).await?;
    let candidate = store
        .decide_candidate(id, Decision::Reject { reason })
        .await?
        .ok_or_else(|| Error::NotPending(format!("Candidate {id}")))?;
    info!("Rejected candidate {id}");
    Ok(candidate)
}

/// Approve a pending partylist.
pub async fn approve_partylist(store: &dyn Store, id: PartylistId) -> Result<Partylist> {
    decide_partylist(store, id, Decision::Approve).await
}

/// Reject a pending partylist.
pub async fn reject_partylist(
    store: &dyn Store,
    id: PartylistId,
    reason: String,
) -> Result<Partylist> {
    decide_partylist(store, id, Decision::Reject { reason }).await
}

async fn decide_partylist(
    store: &dyn Store,
    id: PartylistId,
    decision: Decision,
) -> Result<Partylist> {
    store
        .partylist_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Partylist {id}")))?;
    let status = decision.status();
    let partylist = store
        .decide_partylist(id, decision)
        .await?
        .ok_or_else(|| Error::NotPending(format!("Partylist {id}")))?;
    info!("Partylist {id} is now {status}");
    Ok(partylist)
}

/// Fetch a candidacy, failing unless it exists and is still pending.
async fn pending_candidate(store: &dyn Store, id: CandidateId) -> Result<Candidate> {
    let candidate = store
        .candidate_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate {id}")))?;
    if !candidate.status.is_pending() {
        return Err(Error::NotPending(format!("Candidate {id}")));
    }
    Ok(candidate)
}

/// Approved partylists, by name.
pub async fn approved_partylists(store: &dyn Store) -> Result<Vec<PartylistSummary>> {
    let mut partylists = store.partylists(Some(ApprovalStatus::Approved)).await?;
    partylists.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(partylists.into_iter().map(Into::into).collect())
}

/// Pending partylists, newest first.
pub async fn pending_partylists(store: &dyn Store) -> Result<Vec<PartylistDesc>> {
    let mut partylists = store.partylists(Some(ApprovalStatus::Pending)).await?;
    partylists.sort_by(|a, b| (b.registered_at, b.id).cmp(&(a.registered_at, a.id)));
    Ok(partylists.into_iter().map(Into::into).collect())
}

/// Pending candidacies with everything needed to moderate them, newest first.
pub async fn pending_candidates(store: &dyn Store) -> Result<Vec<PendingCandidate>> {
    let mut candidates = store.candidates(Some(ApprovalStatus::Pending)).await?;
    candidates.sort_by(|a, b| (b.applied_at, b.id).cmp(&(a.applied_at, a.id)));

    let positions: HashMap<_, _> = store
        .positions()
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let partylists = partylist_names(store).await?;

    Ok(candidates
        .into_iter()
        .map(|c| PendingCandidate {
            candidate_id: c.id,
            position_name: positions.get(&c.position_id).cloned().unwrap_or_default(),
            partylist_name: affiliation_name(&partylists, c.partylist_id),
            candidate_name: c.candidate.candidate_name,
            student_id: c.candidate.student_number,
            email: c.candidate.email,
            college: c.candidate.college,
            year_level: c.candidate.year_level,
            platform: c.candidate.platform,
            applied_at: c.candidate.applied_at,
        })
        .collect())
}

/// Approved candidates grouped by position, in ballot order. Positions without
/// approved candidates are left out.
pub async fn approved_candidates(store: &dyn Store) -> Result<Vec<PositionCandidates>> {
    let positions = store.positions().await?;
    let partylists = partylist_names(store).await?;

    let mut by_position: HashMap<_, Vec<Candidate>> = HashMap::new();
    for candidate in store.candidates(Some(ApprovalStatus::Approved)).await? {
        by_position
            .entry(candidate.position_id)
            .or_default()
            .push(candidate);
    }

    Ok(positions
        .into_iter()
        .filter_map(|position| {
            let mut candidates = by_position.remove(&position.id)?;
            candidates.sort_by(|a, b| a.candidate_name.cmp(&b.candidate_name));
            Some(PositionCandidates {
                position_id: position.id,
                position_name: position.name,
                candidates: candidates
                    .into_iter()
                    .map(|c| CandidateSummary {
                        candidate_id: c.id,
                        is_independent: c.is_independent(),
                        partylist_name: affiliation_name(&partylists, c.partylist_id),
                        candidate_name: c.candidate.candidate_name,
                        platform: c.candidate.platform,
                        photo_url: c.candidate.photo_url,
                    })
                    .collect(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::{NewAccount, Position};
    use crate::store::MemoryStore;

    const CAP: u32 = 5;

    async fn student(store: &MemoryStore, n: u32) -> Account {
        store
            .insert_account(NewAccount::example_student(&format!("2021-{n:05}")))
            .await
            .unwrap()
    }

    async fn position(store: &MemoryStore, name: &str) -> Position {
        store.insert_position(name).await.unwrap()
    }

    async fn apply(store: &MemoryStore, account: &Account, position: &Position) -> Candidate {
        apply_for_candidacy(
            store,
            account,
            CandidacyApplication::example(position.id),
            CAP,
        )
        .await
        .unwrap()
    }

    #[rocket::async_test]
    async fn sixth_approval_is_rejected() {
        let store = MemoryStore::new();
        let president = position(&store, "President").await;

        let mut candidates = Vec::new();
        for n in 0..=CAP {
            let account = student(&store, n).await;
            candidates.push(apply(&store, &account, &president).await);
        }

        for candidate in &candidates[..CAP as usize] {
            approve_candidate(&store, candidate.id, CAP).await.unwrap();
        }
        let sixth = candidates[CAP as usize].id;
        let err = approve_candidate(&store, sixth, CAP).await.unwrap_err();
        assert!(matches!(err, Error::CapExceeded(CAP)), "{err:?}");
        assert_eq!(
            err.to_string(),
            "This position already has 5 approved candidates"
        );

        // Still pending, and the slot count did not move.
        let sixth = store.candidate_by_id(sixth).await.unwrap().unwrap();
        assert_eq!(sixth.status, ApprovalStatus::Pending);
        let president = store.position_by_id(president.id).await.unwrap().unwrap();
        assert_eq!(president.approved_count, CAP);
        assert_eq!(
            store
                .candidates(Some(ApprovalStatus::Approved))
                .await
                .unwrap()
                .len(),
            CAP as usize
        );
    }

    #[rocket::async_test]
    async fn full_position_turns_away_applications() {
        let store = MemoryStore::new();
        let auditor = position(&store, "Auditor").await;
        let first = student(&store, 1).await;
        let second = student(&store, 2).await;

        let candidate = apply_for_candidacy(
            &store,
            &first,
            CandidacyApplication::example(auditor.id),
            1,
        )
        .await
        .unwrap();
        approve_candidate(&store, candidate.id, 1).await.unwrap();

        let err = apply_for_candidacy(
            &store,
            &second,
            CandidacyApplication::example(auditor.id),
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::PositionFull(1)), "{err:?}");
    }

    #[rocket::async_test]
    async fn decisions_happen_once() {
        let store = MemoryStore::new();
        let president = position(&store, "President").await;
        let account = student(&store, 1).await;
        let candidate = apply(&store, &account, &president).await;

        let rejected = reject_candidate(&store, candidate.id, "Incomplete".to_string())
            .await
            .unwrap();
        assert_eq!(rejected.status, ApprovalStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Incomplete"));

        assert!(matches!(
            approve_candidate(&store, candidate.id, CAP).await,
            Err(Error::NotPending(_))
        ));
        assert!(matches!(
            reject_candidate(&store, candidate.id, String::new()).await,
            Err(Error::NotPending(_))
        ));
        assert!(matches!(
            approve_candidate(&store, candidate.id + 100, CAP).await,
            Err(Error::NotFound(_))
        ));

        // A rejected candidate never took a slot.
        let president = store.position_by_id(president.id).await.unwrap().unwrap();
        assert_eq!(president.approved_count, 0);

        let partylist = register_partylist(
            &store,
            &account,
            PartylistRegistration::example("Bagong Lakas"),
        )
        .await
        .unwrap();
        approve_partylist(&store, partylist.id).await.unwrap();
        assert!(matches!(
            reject_partylist(&store, partylist.id, String::new()).await,
            Err(Error::NotPending(_))
        ));
        assert!(matches!(
            approve_partylist(&store, partylist.id + 100).await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn duplicates_are_rejected() {
        let store = MemoryStore::new();
        let president = position(&store, "President").await;
        let account = student(&store, 1).await;

        register_partylist(&store, &account, PartylistRegistration::example("Alyansa"))
            .await
            .unwrap();
        let err = register_partylist(&store, &account, PartylistRegistration::example("Alyansa"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Partylist name already exists");

        apply(&store, &account, &president).await;
        let err = apply_for_candidacy(
            &store,
            &account,
            CandidacyApplication::example(president.id),
            CAP,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "You have already applied for this position");
    }

    #[rocket::async_test]
    async fn affiliation_must_be_approved() {
        let store = MemoryStore::new();
        let president = position(&store, "President").await;
        let account = student(&store, 1).await;
        let partylist = register_partylist(
            &store,
            &account,
            PartylistRegistration::example("Alyansa"),
        )
        .await
        .unwrap();

        let application = CandidacyApplication::example_for_partylist(president.id, partylist.id);
        assert!(matches!(
            apply_for_candidacy(&store, &account, application.clone(), CAP).await,
            Err(Error::BadRequest(_))
        ));

        approve_partylist(&store, partylist.id).await.unwrap();
        let candidate = apply_for_candidacy(&store, &account, application, CAP)
            .await
            .unwrap();
        assert_eq!(candidate.partylist_id, Some(partylist.id));

        let missing = CandidacyApplication::example_for_partylist(president.id, 999);
        let other = student(&store, 2).await;
        assert!(matches!(
            apply_for_candidacy(&store, &other, missing, CAP).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            apply_for_candidacy(&store, &other, CandidacyApplication::example(999), CAP).await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn listings() {
        let store = MemoryStore::new();
        let president = position(&store, "President").await;
        let secretary = position(&store, "Secretary").await;
        let treasurer = position(&store, "Treasurer").await;

        let account = student(&store, 1).await;
        let zebra = register_partylist(&store, &account, PartylistRegistration::example("Zebra"))
            .await
            .unwrap();
        let alpha = register_partylist(&store, &account, PartylistRegistration::example("Alpha"))
            .await
            .unwrap();
        register_partylist(&store, &account, PartylistRegistration::example("Pending"))
            .await
            .unwrap();
        approve_partylist(&store, zebra.id).await.unwrap();
        approve_partylist(&store, alpha.id).await.unwrap();

        let names: Vec<_> = approved_partylists(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.partylist_name)
            .collect();
        assert_eq!(names, ["Alpha", "Zebra"]);
        let pending = pending_partylists(&store).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].partylist_name, "Pending");

        // Two approved secretaries, one approved president, one pending treasurer.
        let mut approve = Vec::new();
        for (n, (position, last_name, partylist)) in [
            (&secretary, "Zamora", None),
            (&secretary, "Aquino", Some(alpha.id)),
            (&president, "Bonifacio", Some(zebra.id)),
        ]
        .into_iter()
        .enumerate()
        {
            let account = student(&store, 10 + n as u32).await;
            let mut application = match partylist {
                Some(partylist) => {
                    CandidacyApplication::example_for_partylist(position.id, partylist)
                }
                None => CandidacyApplication::example(position.id),
            };
            application.last_name = last_name.to_string();
            if position.id == president.id {
                application.photo_url = Some("https://example.edu/bonifacio.jpg".to_string());
            }
            approve.push(
                apply_for_candidacy(&store, &account, application, CAP)
                    .await
                    .unwrap(),
            );
        }
        for candidate in &approve {
            approve_candidate(&store, candidate.id, CAP).await.unwrap();
        }
        let waiting = apply(&store, &student(&store, 20).await, &treasurer).await;

        let listing = approved_candidates(&store).await.unwrap();
        let positions: Vec<_> = listing.iter().map(|p| p.position_name.as_str()).collect();
        assert_eq!(positions, ["President", "Secretary"]);
        assert_eq!(
            listing[0].candidates[0].photo_url.as_deref(),
            Some("https://example.edu/bonifacio.jpg")
        );
        assert!(listing[1].candidates.iter().all(|c| c.photo_url.is_none()));
        let secretaries: Vec<_> = listing[1]
            .candidates
            .iter()
            .map(|c| (c.candidate_name.as_str(), c.partylist_name.as_str(), c.is_independent))
            .collect();
        assert_eq!(
            secretaries,
            [
                ("Apolinario Aquino", "Alpha", false),
                ("Apolinario Zamora", "Independent", true),
            ]
        );

        let pending = pending_candidates(&store).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].candidate_id, waiting.id);
        assert_eq!(pending[0].position_name, "Treasurer");
        assert_eq!(pending[0].partylist_name, "Independent");
        assert_eq!(pending[0].student_id, "2021-00020");
    }
}
