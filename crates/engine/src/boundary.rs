//! Panic containment around method invocations.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, converting a panic into its message.
///
/// Scopes touched by `f` must be treated as poisoned when this returns `Err`;
/// callers drop them without committing.
pub fn contain<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
