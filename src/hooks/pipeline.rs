// SPDX-License-Identifier: Apache-2.0

//! Hook Pipeline
//!
//! A snapshot of the hooks registered for one (operation, phase) pair,
//! applied as a left fold: `hn(...h2(h1(x)))`.

use std::sync::Arc;

use mongodb::bson::Bson;
use tracing::{debug, warn};

use super::hook::Hook;
use super::types::{Operation, Phase};
use crate::engine::error::OdmResult;

/// Ordered sequence of hooks for one (operation, phase) pair
#[derive(Clone)]
pub struct HookPipeline {
    operation: Operation,
    phase: Phase,
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookPipeline {
    pub(crate) fn new(operation: Operation, phase: Phase, hooks: Vec<Arc<dyn Hook>>) -> Self {
        Self {
            operation,
            phase,
            hooks,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in registration order, feeding each output into the
    /// next. The first failure is returned as-is and later hooks are skipped.
    pub async fn run(&self, value: Bson) -> OdmResult<Bson> {
        let mut current = value;

        for (index, hook) in self.hooks.iter().enumerate() {
            debug!(
                operation = %self.operation,
                phase = %self.phase,
                hook = hook.name(),
                index,
                "Running hook"
            );

            current = match hook.apply(current).await {
                Ok(next) => next,
                Err(err) => {
                    warn!(
                        operation = %self.operation,
                        phase = %self.phase,
                        hook = hook.name(),
                        "Hook failed: {}",
                        err
                    );
                    return Err(err);
                }
            };
        }

        Ok(current)
    }
}

impl std::fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookPipeline")
            .field("operation", &self.operation)
            .field("phase", &self.phase)
            .field(
                "hooks",
                &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
