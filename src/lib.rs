// src/lib.rs
pub use config::ConvergeOptions;
pub use converge::{AclConverger, ConvergeReport, TargetOutcome, TargetStatus};
pub use directory::{DirectoryClient, NameLookup};
pub use error::{AclError, TargetFailure};
pub use namespace::{ObjectType, Topology};
pub use resolver::{PathResolver, Resolution};
pub use types::{
    AclDelta, AclDocument, EntryDelta, Operation, Permission, ResolvedTarget, RightsDirective,
    RightsEntry,
};

pub mod audit;
pub mod config;
pub mod directory;
pub mod merge;
pub mod namespace;
pub mod resolver;
pub mod types;

mod converge;
mod error;
mod timers;
