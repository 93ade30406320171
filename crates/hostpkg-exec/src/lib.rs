//! hostpkg-exec: Command execution abstraction
//!
//! Provides the [`Executor`](traits::Executor) seam the package-management
//! client delegates all process I/O to, plus a local reference implementation.

pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::ExecResult;
pub use traits::Executor;
