//! The only synchronisation primitive in this kernel: disable/enable the CPU
//! interrupt flag. Every `spin::Mutex` guarding global kernel state is only
//! ever locked from within one of these critical sections, so there is never
//! a handler re-entering a lock its own interrupted context already holds.

use core::arch::asm;

/// Saves `eflags` and clears the interrupt flag. Returns the saved flags so
/// the caller can restore them with [`unlock_intr`].
#[inline]
pub fn lock_intr() -> u32 {
    let flags: u32;
    unsafe {
        asm!(
            "pushfd",
            "cli",
            "pop {0}",
            out(reg) flags,
            options(nostack, preserves_flags),
        );
    }
    flags
}

/// Restores a previously saved `eflags` value (and therefore whatever the
/// interrupt flag was before the matching [`lock_intr`]).
#[inline]
pub fn unlock_intr(flags: u32) {
    unsafe {
        asm!(
            "push {0}",
            "popfd",
            in(reg) flags,
            options(nostack),
        );
    }
}

/// Runs `f` with interrupts disabled, restoring the prior interrupt state
/// afterwards even if `f` unwinds (there is no unwinding in this kernel, but
/// the drop guard keeps the pattern honest).
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    struct Guard(u32);
    impl Drop for Guard {
        fn drop(&mut self) {
            unlock_intr(self.0);
        }
    }

    let _guard = Guard(lock_intr());
    f()
}
