//! The engine's one recoverable error type.
//!
//! Most contract violations (a call graph node with no [`crate::func_decl::FuncDecl`],
//! a duplicate summary insertion) are [`assert!`]/[`panic!`] -- they indicate
//! a caller bug, not a condition to propagate. `AnalysisError` exists only
//! for the handful of conditions that genuinely cross an API boundary as
//! data: a caller-supplied liveness map that doesn't line up with the call
//! graph it is paired with.

use derive_more::Display;

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct AnalysisError(pub String);

impl std::error::Error for AnalysisError {}
