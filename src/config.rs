//! Tunables for the intra- and inter-procedural phases.
//!
//! A plain struct passed by value into [`crate::driver::InterFwdAnalyzer::new`]
//! -- no CLI parsing lives here, that is out of scope per the crate's own
//! purpose-and-scope section, and this crate does not read global mutable
//! state for its tunables the way some analyses do.

/// Intra- and inter-procedural tunables.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Number of plain-join visits at each widening point before widening
    /// itself kicks in.
    pub widening_delay: u32,

    /// Max narrowing passes during the descending phase. `None` means run
    /// narrowing to a natural fixpoint.
    pub descending_iters: Option<u32>,

    /// `0` disables the jump-set heuristic; `>0` bounds how many previously
    /// seen post-states are remembered per widening point.
    pub jump_set_size: usize,

    /// Whether shadow variables (per [`crate::liveness::VarFactory`]) survive
    /// into recorded invariants.
    pub keep_shadows: bool,

    /// Whether the intra-procedural iterator applies the supplied
    /// [`crate::liveness::Liveness`] to prune dead variables after each
    /// block. A CFG absent from the caller's liveness map is never an error
    /// either way -- it is simply treated as having nothing dead to prune.
    pub run_liveness: bool,

    /// Toggle for the call-less short-circuit (see the driver's module
    /// docs): when `true`, a non-`main` function with no call graph edges at
    /// all still receives a top-seeded top-down analysis instead of being
    /// left unanalyzed. Default `false` preserves the original behavior of
    /// analyzing only `main` in that case.
    pub analyze_callless_functions: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            widening_delay: 1,
            descending_iters: None,
            jump_set_size: 0,
            keep_shadows: false,
            run_liveness: true,
            analyze_callless_functions: false,
        }
    }
}
