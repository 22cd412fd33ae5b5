//! A two-phase, context-insensitive inter-procedural forward abstract
//! interpreter over a call graph of control-flow graphs.
//!
//! The crate computes, for every basic block of every analyzed function, a
//! sound over-approximation of the set of reachable program states in a
//! caller-supplied abstract domain, plus a per-function summary projected
//! onto formals and return value. Program verifiers and static checkers
//! query these through [`driver::InterFwdAnalyzer`].
//!
//! # Collaborators this crate does not implement
//!
//! CFG construction, the variable factory's naming scheme, concrete abstract
//! domains, liveness analysis, and non-call statement semantics are all
//! external collaborators: the engine consumes only the interface each one
//! needs (see [`cfg`], [`domain`], [`liveness`], [`transformer`]).
//! Command-line wiring is out of scope entirely.
//!
//! # The two phases
//!
//! [`driver::InterFwdAnalyzer::run`] orders the call graph into strongly
//! connected components ([`scc`]), runs a bottom-up summary synthesis pass
//! over them in reverse topological order ([`transformer::BottomUpTransformer`]
//! driving [`fixpoint::run`] to populate [`summary::SummaryTable`]), then a
//! top-down context propagation pass in forward order
//! ([`transformer::TopDownTransformer`] driving the same iterator, reading
//! summaries and populating [`context::CallCtxTable`]). Recursive SCCs get a
//! `top` entry context by construction -- this is a deliberate soundness
//! fallback, not a precision choice, and the rest of the crate preserves it
//! exactly.
//!
//! # Non-goals
//!
//! Context-sensitivity (call-string or functional), relational summaries
//! across multiple call sites, parallel analysis of independent SCCs,
//! incremental reanalysis, and any source-program frontend.

pub mod cfg;
pub mod config;
pub mod context;
pub mod domain;
pub mod driver;
pub mod error;
pub mod fixpoint;
pub mod func_decl;
pub mod liveness;
pub mod scc;
pub mod summary;
pub mod transformer;
pub mod wto;

// Not test-gated: the `tests/` integration suite links against this crate as
// an ordinary dependency and needs this fixture too (see its module docs).
pub mod testutil;

pub use config::AnalysisConfig;
pub use driver::InterFwdAnalyzer;
pub use error::AnalysisError;
