mod naming;
mod service;

pub use naming::{add_commit_message, add_summary, slugify};
pub use service::{
    AddReport, ModpackService, NewModpack, OperationError, OperationResult, RemoveReport,
    RenderedMod, Stage,
};
