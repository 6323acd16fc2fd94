//! Local Git history access and repository naming.

pub mod history;
pub mod remote_url;

pub use history::HistoryReader;
pub use remote_url::{commit_link, RepositoryName};
