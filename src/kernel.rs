//! The init-sequence driver and main loop. Brings up every
//! lower layer in dependency order, then busy-loops polling a `process`
//! flag that a 30-tick heartbeat timer sets -- there are no suspension
//! points, so this *is* the kernel's only thread of control.

use crate::config::{HEARTBEAT_TICKS, SHELL_LINE_BUF_MAX};
use crate::drivers::keyboard;
use crate::lock_intr::without_interrupts;
use crate::{interrupts, log, memory, shell, timer, vfs};
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

static PROCESS: AtomicBool = AtomicBool::new(false);

struct LineBuf {
    buf: [u8; SHELL_LINE_BUF_MAX],
    len: usize,
}

static LINE_BUF: Mutex<LineBuf> = Mutex::new(LineBuf { buf: [0; SHELL_LINE_BUF_MAX], len: 0 });

fn heartbeat(_data: u32) {
    PROCESS.store(true, Ordering::Release);
    timer::add_dyn_timer(HEARTBEAT_TICKS, heartbeat, 0);
}

/// Brings up interrupts, memory, drivers and the VFS, in the only order
/// that works, then arms the heartbeat and enables CPU interrupts.
pub fn init() {
    crate::assert_called_once!("kernel::init() must only run once");

    interrupts::init();
    memory::init();
    log!(ok, "paging and heap online");

    drivers_init();
    vfs::init();
    log!(ok, "vfs mounted, preset dirs created");

    #[cfg(feature = "selftest")]
    crate::selftest::run();

    timer::add_dyn_timer(HEARTBEAT_TICKS, heartbeat, 0);
    unsafe { core::arch::asm!("sti") };
    log!(ok, "interrupts enabled");
}

fn drivers_init() {
    crate::drivers::pit::init();
    crate::drivers::keyboard::init();
    log!(ok, "pit and keyboard drivers registered");
}

/// The main loop: polls `PROCESS`, and on
/// each heartbeat drains whatever the keyboard ISR queued, assembling a
/// line and dispatching it to the shell on `\n`.
pub fn run() -> ! {
    loop {
        if PROCESS.swap(false, Ordering::AcqRel) {
            drain_and_dispatch();
        }
    }
}

fn drain_and_dispatch() {
    let mut finished_line: Option<[u8; SHELL_LINE_BUF_MAX]> = None;
    let mut finished_len = 0;

    without_interrupts(|| {
        let mut line = LINE_BUF.lock();
        while let Some(b) = keyboard::pop_byte() {
            match b {
                b'\n' => {
                    finished_line = Some(line.buf);
                    finished_len = line.len;
                    line.len = 0;
                }
                0x08 => {
                    if line.len > 0 {
                        line.len -= 1;
                    }
                }
                _ => {
                    if line.len < SHELL_LINE_BUF_MAX {
                        line.buf[line.len] = b;
                        line.len += 1;
                    }
                }
            }
        }
    });

    if let Some(buf) = finished_line {
        if let Ok(text) = core::str::from_utf8(&buf[..finished_len]) {
            shell::dispatch(text);
        }
    }
}
