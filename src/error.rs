use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentError {
    DatabaseError(String),
    StateTransitionError(String),
    WorkflowError(String),
    IngestionError(String),
    ValidationError(String),
    ConfigurationError(String),
    NotFound(String),
}

impl fmt::Display for FulfillmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FulfillmentError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            FulfillmentError::StateTransitionError(msg) => {
                write!(f, "State transition error: {msg}")
            }
            FulfillmentError::WorkflowError(msg) => write!(f, "Workflow error: {msg}"),
            FulfillmentError::IngestionError(msg) => write!(f, "Ingestion error: {msg}"),
            FulfillmentError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            FulfillmentError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            FulfillmentError::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for FulfillmentError {}

impl From<sqlx::Error> for FulfillmentError {
    fn from(err: sqlx::Error) -> Self {
        FulfillmentError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FulfillmentError>;
