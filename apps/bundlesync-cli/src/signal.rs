//! Ctrl-C handling: the first signal cancels the running sequence at its next
//! checkpoint, a second one exits immediately.

use bundlesync::CancelFlag;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::Arc;

/// Exit code used when a second signal forces the process down.
const FORCED_EXIT: i32 = 130;

pub fn cancel_on_signals(cancel: &CancelFlag) -> std::io::Result<()> {
    let raised = cancel.as_atomic();
    for sig in TERM_SIGNALS {
        // Only fires once `raised` is already set, i.e. on the second signal.
        flag::register_conditional_shutdown(*sig, FORCED_EXIT, Arc::clone(&raised))?;
        flag::register(*sig, Arc::clone(&raised))?;
    }
    Ok(())
}
