pub mod completion;
pub mod provider;
pub mod providers;
pub mod resilient;

pub use completion::{CompletionFailure, CompletionService, FailureKind};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use resilient::{ResilientCompletion, RetryPolicy};
