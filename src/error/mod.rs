mod ai;
mod learnify;

pub use ai::AiError;
pub use learnify::{ApiErrorBody, ApiErrorObject, LearnifyError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
