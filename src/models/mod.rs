pub mod discrepancy;
pub mod document;
pub mod result;

pub use discrepancy::{Discrepancy, DiscrepancyType, Severity, ValueSnapshot};
pub use document::{DocumentType, ExtractedDocument, LineItem, WorkspaceDocuments};
pub use result::{
    MatchConfidence, MatchedBy, MatchingResult, ReconcileOutcome, UnmatchedDocument,
    UnmatchedReason,
};
