//! Activities and the participation (application) workflow.
//!
//! Capacity is checked when an application is approved, never when it is
//! submitted: pending applications may outnumber the free seats.

mod model;
mod workflows;

pub use model::*;
pub use workflows::{
    apply_to_activity, create_activity, get_activity, list_applications,
    respond_to_application, ActivityView, ApplyRequest, CreateActivityRequest, ParticipationView,
    ResponseAction, RespondRequest,
};
