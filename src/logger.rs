//! Boot-time status line printer: `[ OK / WARN / FAILED ] message`, color
//! tagging each line with a status marker, against the VGA text console.

use crate::drivers::vga::{Color, WRITER};
use crate::lock_intr::without_interrupts;
use core::fmt;

pub struct LOGGER;

impl LOGGER {
    pub fn failed(args: fmt::Arguments) {
        Self::tag("FAILED", Color::LightRed, args);
    }

    pub fn warn(args: fmt::Arguments) {
        Self::tag(" WARN ", Color::Yellow, args);
    }

    pub fn ok(args: fmt::Arguments) {
        Self::tag("  OK  ", Color::LightGreen, args);
    }

    fn tag(label: &str, color: Color, args: fmt::Arguments) {
        use core::fmt::Write;
        without_interrupts(|| {
            let mut w = WRITER.lock();
            w.fresh_line();
            w.set_color(Color::White, Color::Black);
            let _ = write!(w, "[");
            w.set_color(color, Color::Black);
            let _ = write!(w, "{label}");
            w.set_color(Color::White, Color::Black);
            let _ = writeln!(w, "] {args}");
        });
    }
}

#[macro_export]
macro_rules! log {
    ( $method:ident, $($arg:tt)* ) => {{
        use $crate::logger::LOGGER;
        LOGGER::$method(format_args!($($arg)*));
    }};
}
