//! IDT construction, PIC remap and the vector -> handler table.
//!
//! The dispatch policy itself (fault-vs-IRQ split, EOI-before-handler) lives
//! in [`isr`] next to the assembly it's glued to; this module owns the
//! static tables and the one-time install sequence.

pub mod isr;
pub mod regs;

use crate::config::KERNEL_CODE_SELECTOR;
use crate::drivers::pic;
use regs::RegisterSnapshot;
use spin::Mutex;

pub type HandlerFn = fn(RegisterSnapshot);

const IDT_ENTRIES: usize = 256;
const STUB_COUNT: usize = 48;

/// Present, ring 0, 32-bit interrupt gate.
const GATE_FLAGS_PRESENT_INTERRUPT32: u8 = 0x8E;

#[repr(C, packed)]
#[derive(Clone, Copy)]
struct IdtEntry {
    offset_low: u16,
    selector: u16,
    zero: u8,
    flags: u8,
    offset_high: u16,
}

impl IdtEntry {
    const fn missing() -> Self {
        IdtEntry { offset_low: 0, selector: 0, zero: 0, flags: 0, offset_high: 0 }
    }

    fn new(handler: usize, selector: u16, flags: u8) -> Self {
        IdtEntry {
            offset_low: (handler & 0xffff) as u16,
            selector,
            zero: 0,
            flags,
            offset_high: ((handler >> 16) & 0xffff) as u16,
        }
    }
}

static mut IDT: [IdtEntry; IDT_ENTRIES] = [IdtEntry::missing(); IDT_ENTRIES];

/// The vector -> handler table. `register_handler` simply overwrites a
/// slot; there is no refcounting.
pub static HANDLERS: Mutex<[Option<HandlerFn>; IDT_ENTRIES]> = Mutex::new([None; IDT_ENTRIES]);

/// Overwrites the handler for `vector`. Callers may clobber a previous
/// registration; that's a deliberate simplification, not an oversight.
pub fn register_handler(vector: u8, handler: HandlerFn) {
    HANDLERS.lock()[vector as usize] = Some(handler);
}

/// Builds the 48 live gate descriptors, remaps the PICs and executes
/// `lidt`. Must run exactly once, before `sti`.
pub fn init() {
    pic::remap();

    unsafe {
        #[allow(static_mut_refs)]
        for (vector, &stub_addr) in isr::STUB_ADDRESSES.iter().enumerate().take(STUB_COUNT) {
            IDT[vector] = IdtEntry::new(stub_addr, KERNEL_CODE_SELECTOR, GATE_FLAGS_PRESENT_INTERRUPT32);
        }

        let descriptor = isr::IdtDescriptor {
            limit: (core::mem::size_of::<[IdtEntry; IDT_ENTRIES]>() - 1) as u16,
            base: core::ptr::addr_of!(IDT) as u32,
        };
        isr::load_idt(&descriptor);
    }
}

/// Fixed 32-entry CPU fault name table, used for the unhandled-fault
/// panic message.
pub fn fault_name(vector: u8) -> &'static str {
    const NAMES: [&str; 32] = [
        "Divide-by-zero",
        "Debug",
        "Non-maskable Interrupt",
        "Breakpoint",
        "Overflow",
        "Bound Range Exceeded",
        "Invalid Opcode",
        "Device Not Available",
        "Double Fault",
        "Coprocessor Segment Overrun",
        "Invalid TSS",
        "Segment Not Present",
        "Stack-Segment Fault",
        "General Protection Fault",
        "Page Fault",
        "Reserved",
        "x87 Floating-Point Exception",
        "Alignment Check",
        "Machine Check",
        "SIMD Floating-Point Exception",
        "Virtualization Exception",
        "Control Protection Exception",
        "Reserved", "Reserved", "Reserved", "Reserved", "Reserved", "Reserved", "Reserved",
        "Hypervisor Injection Exception",
        "VMM Communication Exception",
        "Security Exception",
    ];
    NAMES.get(vector as usize).copied().unwrap_or("Unknown")
}
