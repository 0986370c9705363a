mod commit;
mod state;

pub use commit::Commit;
pub use state::RepositoryState;
