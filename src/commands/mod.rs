pub mod add;
pub mod clean;
pub mod import;
pub mod reindex;
pub mod search;
pub mod show;
pub mod status;
