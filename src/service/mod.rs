pub mod aggregator;
pub mod aligner;
pub mod detector;
pub mod grouper;
pub mod identity;
pub mod normalizer;
pub mod reconciler;
pub mod severity;

pub use reconciler::{reconcile, reconcile_workspaces, ReconcileService};
