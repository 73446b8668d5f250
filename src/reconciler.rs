//! Reconciliation entry points.
//!
//! A [`Reconciler`] renders every intent, normalizes the captured running
//! configuration, diffs the two and applies the check-mode and save policy.
//! Rendering is all-or-nothing: no diff is attempted when any intent fails.

use log::debug;

use crate::config::{ReconcileOptions, SAVE_COMMAND};
use crate::diff::{DiffEngine, DiffResult};
use crate::error::ReconcileError;
use crate::intent::Intent;
use crate::normalize::{ConfigLine, normalize, normalize_text};
use crate::render::{CommandPair, RENDERER, Renderer};

#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'r> {
    renderer: &'r Renderer,
}

impl Reconciler<'static> {
    /// Reconciler over the built-in renderer.
    pub fn builtin() -> Self {
        Self::new(&RENDERER)
    }
}

impl<'r> Reconciler<'r> {
    pub fn new(renderer: &'r Renderer) -> Self {
        Self { renderer }
    }

    /// Reconciles against captured running-config lines.
    pub fn reconcile<S: AsRef<str>>(
        &self,
        intents: &[Intent],
        current_raw: &[S],
        options: &ReconcileOptions,
    ) -> Result<DiffResult, ReconcileError> {
        let desired = self.renderer.render_all(intents)?;
        let current = normalize(current_raw.iter().map(Some))?;
        self.finish(&current, &desired, options)
    }

    /// Reconciles against a whole captured output blob.
    pub fn reconcile_text(
        &self,
        intents: &[Intent],
        current_raw: &str,
        options: &ReconcileOptions,
    ) -> Result<DiffResult, ReconcileError> {
        let desired = self.renderer.render_all(intents)?;
        self.finish(&normalize_text(current_raw), &desired, options)
    }

    /// Reconciles against lines the caller already normalized.
    pub fn reconcile_normalized(
        &self,
        intents: &[Intent],
        current: &[ConfigLine],
        options: &ReconcileOptions,
    ) -> Result<DiffResult, ReconcileError> {
        let desired = self.renderer.render_all(intents)?;
        self.finish(current, &desired, options)
    }

    fn finish(
        &self,
        current: &[ConfigLine],
        desired: &[CommandPair],
        options: &ReconcileOptions,
    ) -> Result<DiffResult, ReconcileError> {
        let mut result = DiffEngine::new(self.renderer.undo_rules()).diff(current, desired)?;
        result.dry_run = options.check_mode;
        if options.save_when.should_save(result.changed) {
            result.commands.push(SAVE_COMMAND.to_string());
            result.saved = true;
        }
        debug!(
            "Reconciled {} intents: changed={} commands={} dry_run={} saved={}",
            desired.len(),
            result.changed,
            result.commands.len(),
            result.dry_run,
            result.saved
        );
        if result.dry_run {
            debug!("Check mode, commands will not be pushed");
        }
        Ok(result)
    }
}

/// Reconciles with the built-in renderer.
pub fn reconcile<S: AsRef<str>>(
    intents: &[Intent],
    current_raw: &[S],
    options: &ReconcileOptions,
) -> Result<DiffResult, ReconcileError> {
    Reconciler::builtin().reconcile(intents, current_raw, options)
}
