pub mod coordinator;
pub mod format;
pub mod identity;
pub mod kind;
pub mod loader;
pub mod permission;
pub mod pipeline;
pub mod record;
pub mod status;

pub use coordinator::{
    ListCoordinator, LoadApplied, LoadOutcome, LoadState, LoadTicket, MutationApplied,
    MutationTicket,
};
pub use kind::ResourceKind;
pub use pipeline::TabFilter;
pub use record::Record;
pub use status::{CanonicalStatus, StatusStyle};
