//! Field edits and fix proposals.
//!
//! Every change to a workbook goes through [`set_field`]. Fix providers
//! only propose edits; proposals are shape-checked and applied one by one
//! with [`apply_proposals`].

mod edit;
mod fixer;
mod proposal;
mod provider;

pub use edit::{FieldEdit, set_field};
pub use fixer::RuleBasedFixer;
pub use proposal::{
    ApplyReport, SkippedProposal, apply_proposals, check_proposal, extract_proposals,
};
pub use provider::{FixProvider, FixRequest, parse_fix_response};
