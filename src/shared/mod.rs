pub mod error;
pub mod result;

pub use error::{DepTraceError, ExitCode};
pub use result::Result;
