//! Planner stage: prompt and context to an [`Outline`].

use std::num::NonZeroU32;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::core::checkers::OutlineChecker;
use crate::core::retry::{RetryLoop, RetryOutcome};
use crate::core::synth;
use crate::core::types::{CodebaseSummary, Headline, Outline};
use crate::io::backend::{GenerativeBackend, OutlineRequest};
use crate::io::config::PlannerConfig;

/// Planner wrapper that owns the retry budget and outline minimums.
#[derive(Debug, Clone, Copy)]
pub struct Planner {
    max_retries: NonZeroU32,
    min_sections: usize,
}

impl Planner {
    pub fn new(max_retries: NonZeroU32, min_sections: usize) -> Self {
        Self {
            max_retries,
            min_sections,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Ok(Self::new(config.retries()?, config.min_sections))
    }

    /// Produce an outline, retrying while the outline checker rejects it.
    ///
    /// Backend failures are absorbed: the attempt uses the rule-based outline.
    #[instrument(skip_all, fields(backend = backend.name(), max_retries = self.max_retries.get()))]
    pub fn plan<B: GenerativeBackend + ?Sized>(
        &self,
        backend: &B,
        prompt: &str,
        codebase: Option<&CodebaseSummary>,
        headlines: &[Headline],
    ) -> RetryOutcome<Outline> {
        let request = OutlineRequest {
            prompt,
            codebase,
            headlines,
            min_sections: self.min_sections,
        };
        let retry = RetryLoop::<Value>::new("outline", self.max_retries)
            .with_checker(OutlineChecker::new(self.min_sections));

        let outcome = retry
            .run(|| match backend.generate_outline(&request) {
                Ok(value) => value,
                Err(err) => {
                    warn!(err = ?err, "outline backend failed, using deterministic outline");
                    synth::outline(prompt, codebase).to_artifact()
                }
            })
            .map(|value| Outline::from_artifact(&value));

        info!(
            attempts = outcome.attempts,
            accepted = outcome.accepted,
            sections = outcome.artifact.sections.len(),
            "outline planned"
        );
        outcome
    }
}
