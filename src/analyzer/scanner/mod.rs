pub mod exclusion;
pub mod walker;

pub use exclusion::{ExclusionFilter, is_virtual_env};
pub use walker::RepositoryWalker;
