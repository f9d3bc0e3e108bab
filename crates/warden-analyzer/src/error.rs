// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Errors surfaced to analyzer code through the console (§7).
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A player/NPC caller tried to emit a fact or hypothesis with no
    /// parentage (§6.1). Back-story callers are exempt.
    #[error("fact/hyp must have at least one parent object/fact/hyp")]
    ParentageRequired,
    /// A tainted (hypothesis-handling) clone tried to emit a fact without
    /// `yesreally = true` (§6.1).
    #[error("tainted clone must pass yesreally=true to addFact")]
    YesReallyRequired,
    /// Exactly one parent selector must be supplied to a child-stream call.
    #[error("exactly one of object_id/fact_id/hyp_id must be supplied")]
    AmbiguousParentSelector,
    /// `waitTillFact` exceeded its timeout (§4.3, §5).
    #[error("wait for fact timed out")]
    WaitTimeout,
    /// A stream consumer's per-iteration timeout elapsed (§5).
    #[error("stream receive timed out")]
    StreamTimeout,
    /// The coordinator replied with an error status; `reason` is its
    /// display-formatted error.
    #[error("console call failed: {0}")]
    Remote(String),
    /// A lookup by id found nothing.
    #[error("not found")]
    NotFound,
}

/// Errors surfaced by analyzer construction or handler execution (§7).
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Constructing the analyzer instance failed; the delivery is skipped
    /// but the tracker continues (`PlayerCreationError`).
    #[error("analyzer instance could not be created: {0}")]
    Creation(String),
    /// A console call failed.
    #[error(transparent)]
    Console(#[from] ConsoleError),
    /// Any other analyzer-reported failure.
    #[error("{0}")]
    Other(String),
}
