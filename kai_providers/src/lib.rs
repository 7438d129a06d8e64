mod openai;
pub mod retry;

pub use openai::OpenAiProvider;
pub use retry::{RetryPolicy, retry_with_backoff};
