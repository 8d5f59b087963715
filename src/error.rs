use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::{model::common::PhaseError, pipeline::PipelineError, store::StoreError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, what.into())
    }

    pub fn bad_request(why: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, why.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Store(err) => store_status(err),
            Self::Pipeline(err) => match err {
                PipelineError::NotFound(_) | PipelineError::UnknownParticipant { .. } => {
                    Status::NotFound
                }
                PipelineError::Persistence(err) => store_status(err),
                PipelineError::Malformed(_) => Status::BadRequest,
                PipelineError::PhaseClosed(_) => Status::Conflict,
            },
            Self::Phase(_) => Status::Conflict,
            Self::Status(status, _) => *status,
        }
    }
}

fn store_status(err: &StoreError) -> Status {
    match err {
        StoreError::NotFound(_) => Status::NotFound,
        StoreError::Conflict { .. } | StoreError::Duplicate(_) => Status::Conflict,
        StoreError::Db(_) => Status::InternalServerError,
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::common::GroupState;

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(Error::not_found("Group x").status(), Status::NotFound);
        assert_eq!(Error::bad_request("no").status(), Status::BadRequest);
        let conflict = StoreError::Conflict {
            group_id: "g".to_string(),
            expected: 3,
        };
        assert_eq!(Error::from(conflict).status(), Status::Conflict);
        let duplicate = StoreError::Duplicate("g".to_string());
        assert_eq!(Error::from(duplicate).status(), Status::Conflict);
        let stranger = PipelineError::UnknownParticipant {
            group_id: "g".to_string(),
            participant_id: "p".to_string(),
        };
        assert_eq!(Error::from(stranger).status(), Status::NotFound);
        let phase = PhaseError {
            from: GroupState::Suggestion,
            to: GroupState::Results,
        };
        assert_eq!(Error::from(phase).status(), Status::Conflict);
        assert_eq!(
            Error::from(PipelineError::Malformed("empty".to_string())).status(),
            Status::BadRequest
        );
    }
}
