pub mod context;
pub mod error;
pub mod pii;

pub use context::{CallerContext, Role};
pub use error::{DispatchError, DispatchResult, StorageError};
pub use pii::Masked;
