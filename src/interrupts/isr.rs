//! The 48 hand-written assembly trampolines and the common dispatch path
//! they funnel into. This is one of the few spots in the kernel
//! where hand-rolled asm is unavoidable: `in`/`out`, `cli`/`sti`, `lidt`,
//! `cr0`/`cr2`/`cr3` and these ISR entry stubs are all CPU-primitive duties
//! no safe Rust construct stands in for.
//!
//! Vectors that don't push a CPU error code (everything except 8, 10-14,
//! 17) get a synthetic zero pushed first, so every vector's stub leaves the
//! stack in the same shape before falling into `isr_common_stub`.

use crate::drivers::pic;
use crate::interrupts::regs::RegisterSnapshot;
use crate::interrupts::{fault_name, HANDLERS};
use core::arch::{asm, global_asm};

macro_rules! isr_no_err {
    ($name:ident, $vec:expr) => {
        concat!(
            ".global ", stringify!($name), "\n",
            stringify!($name), ":\n",
            "push 0\n",
            "push ", stringify!($vec), "\n",
            "jmp isr_common_stub\n",
        )
    };
}

macro_rules! isr_err {
    ($name:ident, $vec:expr) => {
        concat!(
            ".global ", stringify!($name), "\n",
            stringify!($name), ":\n",
            // CPU already pushed the error code
            "push ", stringify!($vec), "\n",
            "jmp isr_common_stub\n",
        )
    };
}

global_asm!(
    ".text",
    ".code32",

    // common tail shared by every stub: save the rest of the register file,
    // load kernel segments, call the Rust dispatcher with a pointer to the
    // snapshot, then unwind back to `iret`.
    "isr_common_stub:",
    "pusha",
    "mov ax, ds",
    "push eax",
    "mov ax, 0x10", // KERNEL_DATA_SELECTOR
    "mov ds, ax",
    "mov es, ax",
    "mov fs, ax",
    "mov gs, ax",
    "push esp",
    "call isr_dispatch",
    "add esp, 4",
    "pop eax",
    "mov ds, ax",
    "mov es, ax",
    "mov fs, ax",
    "mov gs, ax",
    "popa",
    "add esp, 8", // pop error code and vector
    "iretd",

    isr_no_err!(isr_stub_0, 0),
    isr_no_err!(isr_stub_1, 1),
    isr_no_err!(isr_stub_2, 2),
    isr_no_err!(isr_stub_3, 3),
    isr_no_err!(isr_stub_4, 4),
    isr_no_err!(isr_stub_5, 5),
    isr_no_err!(isr_stub_6, 6),
    isr_no_err!(isr_stub_7, 7),
    isr_err!(isr_stub_8, 8),
    isr_no_err!(isr_stub_9, 9),
    isr_err!(isr_stub_10, 10),
    isr_err!(isr_stub_11, 11),
    isr_err!(isr_stub_12, 12),
    isr_err!(isr_stub_13, 13),
    isr_err!(isr_stub_14, 14),
    isr_no_err!(isr_stub_15, 15),
    isr_no_err!(isr_stub_16, 16),
    isr_err!(isr_stub_17, 17),
    isr_no_err!(isr_stub_18, 18),
    isr_no_err!(isr_stub_19, 19),
    isr_no_err!(isr_stub_20, 20),
    isr_no_err!(isr_stub_21, 21),
    isr_no_err!(isr_stub_22, 22),
    isr_no_err!(isr_stub_23, 23),
    isr_no_err!(isr_stub_24, 24),
    isr_no_err!(isr_stub_25, 25),
    isr_no_err!(isr_stub_26, 26),
    isr_no_err!(isr_stub_27, 27),
    isr_no_err!(isr_stub_28, 28),
    isr_no_err!(isr_stub_29, 29),
    isr_no_err!(isr_stub_30, 30),
    isr_no_err!(isr_stub_31, 31),

    isr_no_err!(irq_stub_32, 32),
    isr_no_err!(irq_stub_33, 33),
    isr_no_err!(irq_stub_34, 34),
    isr_no_err!(irq_stub_35, 35),
    isr_no_err!(irq_stub_36, 36),
    isr_no_err!(irq_stub_37, 37),
    isr_no_err!(irq_stub_38, 38),
    isr_no_err!(irq_stub_39, 39),
    isr_no_err!(irq_stub_40, 40),
    isr_no_err!(irq_stub_41, 41),
    isr_no_err!(irq_stub_42, 42),
    isr_no_err!(irq_stub_43, 43),
    isr_no_err!(irq_stub_44, 44),
    isr_no_err!(irq_stub_45, 45),
    isr_no_err!(irq_stub_46, 46),
    isr_no_err!(irq_stub_47, 47),
);

macro_rules! extern_stub {
    ($name:ident) => {
        unsafe extern "C" {
            fn $name();
        }
    };
}

extern_stub!(isr_stub_0);
extern_stub!(isr_stub_1);
extern_stub!(isr_stub_2);
extern_stub!(isr_stub_3);
extern_stub!(isr_stub_4);
extern_stub!(isr_stub_5);
extern_stub!(isr_stub_6);
extern_stub!(isr_stub_7);
extern_stub!(isr_stub_8);
extern_stub!(isr_stub_9);
extern_stub!(isr_stub_10);
extern_stub!(isr_stub_11);
extern_stub!(isr_stub_12);
extern_stub!(isr_stub_13);
extern_stub!(isr_stub_14);
extern_stub!(isr_stub_15);
extern_stub!(isr_stub_16);
extern_stub!(isr_stub_17);
extern_stub!(isr_stub_18);
extern_stub!(isr_stub_19);
extern_stub!(isr_stub_20);
extern_stub!(isr_stub_21);
extern_stub!(isr_stub_22);
extern_stub!(isr_stub_23);
extern_stub!(isr_stub_24);
extern_stub!(isr_stub_25);
extern_stub!(isr_stub_26);
extern_stub!(isr_stub_27);
extern_stub!(isr_stub_28);
extern_stub!(isr_stub_29);
extern_stub!(isr_stub_30);
extern_stub!(isr_stub_31);
extern_stub!(irq_stub_32);
extern_stub!(irq_stub_33);
extern_stub!(irq_stub_34);
extern_stub!(irq_stub_35);
extern_stub!(irq_stub_36);
extern_stub!(irq_stub_37);
extern_stub!(irq_stub_38);
extern_stub!(irq_stub_39);
extern_stub!(irq_stub_40);
extern_stub!(irq_stub_41);
extern_stub!(irq_stub_42);
extern_stub!(irq_stub_43);
extern_stub!(irq_stub_44);
extern_stub!(irq_stub_45);
extern_stub!(irq_stub_46);
extern_stub!(irq_stub_47);

/// Addresses of the 48 stubs above, in vector order, for [`super::init`]
/// to wire into the IDT.
pub const STUB_ADDRESSES: [usize; 48] = [
    isr_stub_0 as usize, isr_stub_1 as usize, isr_stub_2 as usize, isr_stub_3 as usize,
    isr_stub_4 as usize, isr_stub_5 as usize, isr_stub_6 as usize, isr_stub_7 as usize,
    isr_stub_8 as usize, isr_stub_9 as usize, isr_stub_10 as usize, isr_stub_11 as usize,
    isr_stub_12 as usize, isr_stub_13 as usize, isr_stub_14 as usize, isr_stub_15 as usize,
    isr_stub_16 as usize, isr_stub_17 as usize, isr_stub_18 as usize, isr_stub_19 as usize,
    isr_stub_20 as usize, isr_stub_21 as usize, isr_stub_22 as usize, isr_stub_23 as usize,
    isr_stub_24 as usize, isr_stub_25 as usize, isr_stub_26 as usize, isr_stub_27 as usize,
    isr_stub_28 as usize, isr_stub_29 as usize, isr_stub_30 as usize, isr_stub_31 as usize,
    irq_stub_32 as usize, irq_stub_33 as usize, irq_stub_34 as usize, irq_stub_35 as usize,
    irq_stub_36 as usize, irq_stub_37 as usize, irq_stub_38 as usize, irq_stub_39 as usize,
    irq_stub_40 as usize, irq_stub_41 as usize, irq_stub_42 as usize, irq_stub_43 as usize,
    irq_stub_44 as usize, irq_stub_45 as usize, irq_stub_46 as usize, irq_stub_47 as usize,
];

/// Common dispatch policy: CPU faults panic unless a handler was
/// explicitly registered; IRQs get EOI'd *before* their handler runs (so a
/// nested re-delivery of the same vector is legal, even though no current
/// driver relies on that), then dispatched by vector.
#[unsafe(no_mangle)]
extern "C" fn isr_dispatch(regs: *mut RegisterSnapshot) {
    let regs = unsafe { &*regs };
    let vector = regs.vector as u8;

    if !regs.is_fault() {
        pic::send_eoi(vector);
    }

    let handler = HANDLERS.lock()[vector as usize];
    match handler {
        Some(f) => f(*regs),
        None if regs.is_fault() => {
            crate::log!(failed, "Unhandled CPU fault: {} (vector {})", fault_name(vector), vector);
            crate::println!("error_code={:#x} eip={:#x} cs={:#x} eflags={:#x}", regs.error_code, regs.eip, regs.cs, regs.eflags);
            panic!("unhandled CPU fault");
        }
        None => {
            // unregistered IRQ: already EOI'd, nothing else to do.
        }
    }
}

/// Describes the assembled `idtr` operand and executes `lidt`.
#[repr(C, packed)]
pub struct IdtDescriptor {
    pub limit: u16,
    pub base: u32,
}

/// # Safety
/// `descriptor` must point at a valid, stable `IdtDescriptor` whose `base`
/// addresses a fully-populated 256-entry IDT.
pub unsafe fn load_idt(descriptor: &IdtDescriptor) {
    unsafe {
        asm!("lidt [{0}]", in(reg) descriptor, options(nostack, preserves_flags));
    }
}
