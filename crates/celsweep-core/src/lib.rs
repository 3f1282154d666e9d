pub mod config;
pub mod diagnostics;
pub mod exposure;
pub mod fixtures;
pub mod host;
pub mod inventory;
pub mod memory;
pub mod model;
pub mod persistence;
pub mod share;
pub mod sweep;

pub use config::SweepConfig;
pub use diagnostics::{TelemetryGuard, init_tracing_with_options};
pub use exposure::{
    DeletionPlan, ReduceError, ReduceOutcome, apply_plan, exposed_cels, plan_deletions, reduce,
};
pub use host::{Confirmation, HostError, SceneHost, SceneNode};
pub use inventory::{InventoryReport, generate_inventory_report};
pub use memory::MemoryScene;
pub use model::{
    ColumnAddressing, DrawingColumn, DrawingNode, Element, ElementId, GroupNode, Node, Scene,
};
pub use share::{
    AssetGroup, DuplicateColumnPolicy, ResolutionFailure, ShareResolution, TrackBinding, resolve,
};
pub use sweep::{
    GroupFailure, SweepError, SweepOptions, SweepOutcome, SweepReport, expand_selection,
    plan_sweep, remove_unexposed_cels,
};
