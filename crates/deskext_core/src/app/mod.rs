//! Browser-process lifecycle broadcast.
//!
//! # Responsibility
//! - Own the lifecycle delegates created at startup.
//! - Forward each engine lifecycle event to every delegate.
//!
//! # Invariants
//! - The delegate list is fixed at construction and iterated in order.
//! - A panicking delegate is logged and skipped; later delegates still run.

mod command_line;

pub use command_line::CommandLine;

use log::{error, info};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Lifecycle capability set implemented by browser-process delegates.
pub trait BrowserDelegate: Send + Sync {
    /// Stable label used in logs.
    fn name(&self) -> &str;

    fn on_before_command_line_processing(&self, _app: &BrowserApp, _command_line: &mut CommandLine) {
    }

    fn on_context_initialized(&self, _app: &BrowserApp) {}

    fn on_before_child_process_launch(&self, _app: &BrowserApp, _command_line: &mut CommandLine) {}

    fn on_render_process_thread_created(&self, _app: &BrowserApp, _extra_info: &mut Vec<Value>) {}
}

/// Built-in delegate recording lifecycle progress in the log.
#[derive(Debug, Default)]
pub struct LoggingDelegate;

impl BrowserDelegate for LoggingDelegate {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_before_command_line_processing(&self, _app: &BrowserApp, command_line: &mut CommandLine) {
        info!(
            "event=command_line_processing module=app status=ok switches={}",
            command_line.len()
        );
    }

    fn on_context_initialized(&self, app: &BrowserApp) {
        info!(
            "event=context_initialized module=app status=ok delegates={}",
            app.delegate_count()
        );
    }

    fn on_before_child_process_launch(&self, _app: &BrowserApp, command_line: &mut CommandLine) {
        info!(
            "event=child_process_launch module=app status=ok switches={}",
            command_line.len()
        );
    }
}

/// Delegates installed by `BrowserApp::with_default_delegates`.
pub fn default_delegates() -> Vec<Box<dyn BrowserDelegate>> {
    vec![Box::new(LoggingDelegate)]
}

/// Browser-process application broadcasting lifecycle events.
pub struct BrowserApp {
    delegates: Vec<Box<dyn BrowserDelegate>>,
}

impl BrowserApp {
    pub fn new(delegates: Vec<Box<dyn BrowserDelegate>>) -> Self {
        Self { delegates }
    }

    pub fn with_default_delegates() -> Self {
        Self::new(default_delegates())
    }

    pub fn delegate_count(&self) -> usize {
        self.delegates.len()
    }

    /// Broadcasts only for the browser process (empty `process_type`).
    pub fn on_before_command_line_processing(
        &self,
        process_type: &str,
        command_line: &mut CommandLine,
    ) {
        if !process_type.is_empty() {
            return;
        }
        self.broadcast("command_line_processing", |delegate| {
            delegate.on_before_command_line_processing(self, command_line)
        });
    }

    pub fn on_context_initialized(&self) {
        self.broadcast("context_initialized", |delegate| {
            delegate.on_context_initialized(self)
        });
    }

    pub fn on_before_child_process_launch(&self, command_line: &mut CommandLine) {
        self.broadcast("child_process_launch", |delegate| {
            delegate.on_before_child_process_launch(self, command_line)
        });
    }

    pub fn on_render_process_thread_created(&self, extra_info: &mut Vec<Value>) {
        self.broadcast("render_process_thread_created", |delegate| {
            delegate.on_render_process_thread_created(self, extra_info)
        });
    }

    fn broadcast(&self, event: &str, mut notify: impl FnMut(&dyn BrowserDelegate)) {
        for delegate in &self.delegates {
            let outcome = catch_unwind(AssertUnwindSafe(|| notify(delegate.as_ref())));
            if outcome.is_err() {
                error!(
                    "event={} module=app status=error delegate={} error=delegate_panicked",
                    event,
                    delegate.name()
                );
            }
        }
    }
}
