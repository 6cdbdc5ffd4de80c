use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{error, warn};
use mongodb::{bson::de::Error as BsonDeError, error::Error as DbError};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("You have already voted")]
    AlreadyVoted,
    #[error("This position already has {0} approved candidates")]
    CapExceeded(u32),
    #[error("This position already has the maximum number of candidates ({0})")]
    PositionFull(u32),
    #[error("You have already applied for this position")]
    DuplicateApplication,
    #[error("Partylist name already exists")]
    DuplicateName,
    #[error("An account with this student number already exists")]
    DuplicateStudentNumber,
    #[error("{0} has already been decided")]
    NotPending(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("{1}")]
    Status(Status, String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    BsonDe(#[from] BsonDeError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::AlreadyVoted
            | Self::CapExceeded(_)
            | Self::PositionFull(_)
            | Self::DuplicateApplication
            | Self::DuplicateName
            | Self::DuplicateStudentNumber
            | Self::NotPending(_)
            | Self::BadRequest(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Status(status, _) => *status,
            Self::Db(_) | Self::BsonDe(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                JwtErrorKind::InvalidToken
                | JwtErrorKind::InvalidSignature
                | JwtErrorKind::MissingRequiredClaim(_)
                | JwtErrorKind::InvalidIssuer
                | JwtErrorKind::InvalidAudience
                | JwtErrorKind::InvalidSubject
                | JwtErrorKind::InvalidAlgorithm
                | JwtErrorKind::MissingAlgorithm
                | JwtErrorKind::Base64(_)
                | JwtErrorKind::Json(_)
                | JwtErrorKind::Utf8(_) => Status::BadRequest,
                // Key and signing failures are ours, not the client's.
                _ => Status::InternalServerError,
            },
            Self::Argon2(_) => Status::InternalServerError,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{} {}: {self:?}", req.method(), req.uri()),
            _ => warn!("{} {}: {self}", req.method(), req.uri()),
        }
        (status, Json(ErrorBody::new(self.to_string()))).respond_to(req)
    }
}
