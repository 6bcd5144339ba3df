//! Process-wide fallback reporting for uncaught faults.
//!
//! At most one subsystem in a process owns top-level fault reporting. The
//! hook is claimed explicitly, through [`install`] (built-in renderer) or
//! [`set_report_hook`] (host-supplied reporter), never as an import side
//! effect. [`report`] dispatches an uncaught fault to whatever hook holds
//! the claim, falling back to the built-in renderer when nothing does.

use std::sync::{Once, OnceLock};

use crate::fault::FaultRef;
use crate::render::write_report;

/// A claimed top-level fault reporter.
pub type ReportHook = Box<dyn Fn(&FaultRef) + Send + Sync>;

static HOOK: OnceLock<ReportHook> = OnceLock::new();
static DECLINED: Once = Once::new();

/// Claim the process-wide hook with the built-in stderr renderer.
///
/// Returns `true` when the claim succeeds. When the hook is already claimed
/// the call declines, warns once, and returns `false`; the existing reporter
/// stays in place so a host environment's own reporting keeps working.
pub fn install() -> bool {
    let installed = HOOK.set(Box::new(report_to_stderr)).is_ok();
    if !installed {
        DECLINED.call_once(|| {
            tracing::warn!(
                "a top-level fault reporter is already installed; \
                 composite faults will be rendered by the existing one"
            );
        });
    }
    installed
}

/// Claim the process-wide hook with a host-supplied reporter.
///
/// Returns `false` and leaves the existing claim untouched when the hook is
/// already claimed.
pub fn set_report_hook(hook: ReportHook) -> bool {
    HOOK.set(hook).is_ok()
}

/// Report an uncaught top-level fault through the claimed hook, or the
/// built-in stderr renderer when nothing claimed the hook.
pub fn report(fault: &FaultRef) {
    match HOOK.get() {
        Some(hook) => hook(fault),
        None => report_to_stderr(fault),
    }
}

fn report_to_stderr(fault: &FaultRef) {
    let mut stderr = std::io::stderr().lock();
    // Nothing useful left to do if stderr itself is gone.
    let _ = write_report(fault, &mut stderr);
}
