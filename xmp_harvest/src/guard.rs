//! Keeps panics inside the library.
//!
//! Media files come from anywhere, so a bug tripped by a strange file must
//! not take the host process with it. [`contain`] turns a panic into an
//! [`ErrorKind::InternalFault`] naming the file, with a backtrace.
//!
//! This only works when panics unwind. Under `panic = "abort"`, nothing can
//! be caught.

use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::Once,
};

use crate::error::{ErrorKind, HarvestError};

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    /// How many `contain` calls this thread is inside.
    static DEPTH: Cell<usize> = const { Cell::new(0) };

    /// The message and backtrace of the last panic seen inside `contain`.
    static CAPTURED: RefCell<Option<(String, String)>> = const { RefCell::new(None) };
}

/// Runs `f`, turning any panic inside it into an error for `file`.
///
/// Errors returned by `f` pass through untouched. Calls may nest, in which
/// case the innermost one catches the panic.
pub fn contain<T>(
    file: &str,
    f: impl FnOnce() -> Result<T, HarvestError>,
) -> Result<T, HarvestError> {
    install_hook();

    let result = {
        let _entered = Entered::new();
        panic::catch_unwind(AssertUnwindSafe(f))
    };

    let payload = match result {
        Ok(r) => return r,
        Err(payload) => payload,
    };

    let (message, trace) = CAPTURED
        .try_with(|c| c.borrow_mut().take())
        .ok()
        .flatten()
        .unwrap_or_else(|| {
            (
                payload_message(payload.as_ref()),
                String::from("<no backtrace captured>"),
            )
        });

    let err = HarvestError::new(file, ErrorKind::InternalFault { message, trace });
    log::error!("Caught a panic while reading `{}`! err: {err}", err.file());
    Err(err)
}

/// Marks this thread as inside [`contain`] until dropped.
struct Entered;

impl Entered {
    fn new() -> Self {
        DEPTH.with(|d| d.set(d.get() + 1));
        Self
    }
}

impl Drop for Entered {
    fn drop(&mut self) {
        _ = DEPTH.try_with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Installs our panic hook, once per process.
///
/// Inside `contain`, the hook stashes the panic for `contain` to report and
/// prints nothing. Everywhere else, the previous hook runs as usual.
fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let guarded: bool = DEPTH.try_with(|d| d.get() > 0).unwrap_or(false);
            if !guarded {
                previous(info);
                return;
            }

            let mut message: String = payload_message(info.payload());
            if let Some(location) = info.location() {
                message = format!("{message} (at {location})");
            }
            let trace: String = Backtrace::force_capture().to_string();

            _ = CAPTURED.try_with(|c| {
                if let Ok(mut slot) = c.try_borrow_mut() {
                    *slot = Some((message, trace));
                }
            });
        }));
    });
}

/// Grabs the text from a panic payload.
fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_owned();
    }

    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }

    String::from("<panic without a message>")
}

#[cfg(test)]
mod tests {
    use super::contain;
    use crate::{
        error::{ErrorKind, HarvestError},
        util::logger,
    };

    #[test]
    fn results_pass_through() {
        logger();

        assert_eq!(contain("a.jpg", || Ok(7)).unwrap(), 7);

        let err = contain::<()>("a.jpg", || {
            Err(HarvestError::new("a.jpg", ErrorKind::NotFound))
        })
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn panics_become_internal_faults() {
        logger();

        let n = 3;
        let err = contain::<()>("/some/dir/broken.jpg", || panic!("segment {n} exploded"))
            .unwrap_err();

        assert_eq!(err.file(), "broken.jpg");
        match err.kind() {
            ErrorKind::InternalFault { message, trace } => {
                assert!(message.contains("segment 3 exploded"), "got: {message}");
                assert!(!trace.is_empty());
            }
            other => panic!("expected an internal fault, got {other:?}"),
        }
    }

    #[test]
    fn innermost_guard_catches() {
        logger();

        let outer = contain("outer.jpg", || {
            let inner = contain::<()>("inner.jpg", || panic!("inner"));
            Ok(inner.unwrap_err().file().to_owned())
        });

        assert_eq!(outer.unwrap(), "inner.jpg");
    }

    #[test]
    fn guard_is_reusable_after_a_panic() {
        logger();

        assert!(contain::<()>("x.jpg", || panic!("first")).is_err());
        assert_eq!(contain("x.jpg", || Ok("fine")).unwrap(), "fine");
    }
}
