//! Assembly of execution records for a set of testables

pub mod assembler;
pub mod pool;
pub mod session;

pub use assembler::{ResolutionAssembler, ResolveOptions};
pub use pool::{default_workers, run_ordered};
pub use session::ResolutionSession;
