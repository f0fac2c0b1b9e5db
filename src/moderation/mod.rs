//! User reports, blocks and the moderation audit trail.
//!
//! Filtering itself lives in the `godo-moderation` crate; this module holds
//! the records moderators act on.

mod models;
mod workflows;

pub use models::*;
pub use workflows::{
    block_user, report_content, unblock_user, BlockOutcome, BlockRequest, ReportOutcome,
    ReportRequest,
};
