pub mod error;
pub mod types;

pub use error::XFormError;
pub use types::*;
