//! Request handlers.

pub mod generate;
pub mod jobs;
pub mod marks;

pub use generate::generate;
pub use jobs::{get_status, list_jobs};
pub use marks::{is_marked, mark, unmark};
