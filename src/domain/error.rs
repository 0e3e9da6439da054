use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No open spots left. Tried to book {requested} from available {available}")]
    NoOpenSpots { requested: u32, available: u32 },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
