
mod print;
mod serial;

/// Panics if invoked a second time. Used to guard the one-shot init paths
/// (`kernel::init`, `vfs::init`, ...) against accidental re-entry.
#[macro_export]
macro_rules! assert_called_once {
    // with args
    ( $fmt:expr, $($arg:tt)* ) => {{
        use core::sync::atomic::{AtomicBool, Ordering};
        static CALLED: AtomicBool = AtomicBool::new(false);

        if CALLED.swap(true, Ordering::SeqCst) {
            panic!($fmt, $($arg)*);
        }
    }};

    // without args
    ( $fmt:expr ) => {{
        assert_called_once!(concat!($fmt, "{}"), "");
    }};
}
