use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{ApprovalStatus, CandidateId, PartylistId, PositionId},
    db::{account::Account, candidate::NewCandidate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AffiliationType {
    Partylist,
    Independent,
}

/// A candidacy application as submitted by a student.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CandidacyApplication {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub college: String,
    pub year_level: String,
    pub position_id: PositionId,
    pub affiliation_type: AffiliationType,
    #[serde(default)]
    pub partylist_id: Option<PartylistId>,
    pub platform: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl CandidacyApplication {
    /// The partylist this application runs under, or `None` for independents.
    pub fn partylist(&self) -> Result<Option<PartylistId>> {
        match (self.affiliation_type, self.partylist_id) {
            (AffiliationType::Independent, _) => Ok(None),
            (AffiliationType::Partylist, Some(id)) => Ok(Some(id)),
            (AffiliationType::Partylist, None) => {
                Err(Error::BadRequest("Please select a partylist".to_string()))
            }
        }
    }

    /// Validate the application, producing a pending candidacy for the given account.
    pub fn into_candidate(self, account: &Account) -> Result<NewCandidate> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.college,
            &self.year_level,
            &self.platform,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(Error::BadRequest(
                "Please fill in all required fields".to_string(),
            ));
        }
        let partylist_id = self.partylist()?;

        Ok(NewCandidate {
            account_id: account.id,
            student_number: account.student_number.clone(),
            candidate_name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            email: self.email.trim().to_string(),
            college: self.college,
            year_level: self.year_level,
            position_id: self.position_id,
            partylist_id,
            platform: self.platform.trim().to_string(),
            photo_url: self
                .photo_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            status: ApprovalStatus::Pending,
            applied_at: Utc::now(),
            decided_at: None,
            rejection_reason: None,
        })
    }
}

/// Public listing entry for an approved candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub is_independent: bool,
    pub partylist_name: String,
    pub platform: String,
    pub photo_url: Option<String>,
}

/// Approved candidates for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCandidates {
    pub position_id: PositionId,
    pub position_name: String,
    pub candidates: Vec<CandidateSummary>,
}

/// Full details of a pending application, for moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCandidate {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub student_id: String,
    pub email: String,
    pub college: String,
    pub year_level: String,
    pub position_name: String,
    pub partylist_name: String,
    pub platform: String,
    pub applied_at: DateTime<Utc>,
}

/// Optional body of a rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Rejection {
    #[serde(default)]
    pub reason: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affiliation() {
        assert_eq!(CandidacyApplication::example(1).partylist().unwrap(), None);
        assert_eq!(
            CandidacyApplication::example_for_partylist(1, 4)
                .partylist()
                .unwrap(),
            Some(4)
        );

        let mut missing = CandidacyApplication::example_for_partylist(1, 4);
        missing.partylist_id = None;
        assert!(missing.partylist().is_err());

        // Independents ignore a stray partylist id.
        let mut stray = CandidacyApplication::example(1);
        stray.partylist_id = Some(4);
        assert_eq!(stray.partylist().unwrap(), None);
    }

    #[test]
    fn candidate_takes_identity_from_account() {
        let account = Account::example_student(12);
        let candidate = CandidacyApplication::example(2)
            .into_candidate(&account)
            .unwrap();
        assert_eq!(candidate.account_id, 12);
        assert_eq!(candidate.student_number, account.student_number);
        assert_eq!(candidate.candidate_name, "Apolinario Mabini");
        assert_eq!(candidate.status, ApprovalStatus::Pending);
        assert!(candidate.is_independent());
        assert_eq!(candidate.photo_url, None);
    }

    #[test]
    fn photo_url_is_optional() {
        let account = Account::example_student(12);
        let mut application = CandidacyApplication::example(2);
        application.photo_url = Some(" https://example.edu/mabini.jpg ".to_string());
        let candidate = application.into_candidate(&account).unwrap();
        assert_eq!(
            candidate.photo_url.as_deref(),
            Some("https://example.edu/mabini.jpg")
        );

        let mut blank = CandidacyApplication::example(2);
        blank.photo_url = Some("  ".to_string());
        assert_eq!(blank.into_candidate(&account).unwrap().photo_url, None);
    }

    #[test]
    fn blank_platform_is_rejected() {
        let mut application = CandidacyApplication::example(2);
        application.platform = " ".to_string();
        assert!(application
            .into_candidate(&Account::example_student(12))
            .is_err());
    }
}
