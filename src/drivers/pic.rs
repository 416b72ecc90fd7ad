//! 8259 PIC remap. IRQ0-7 -> vectors 32-39, IRQ8-15 -> vectors 40-47, so
//! that IRQs never collide with the CPU-fault range 0-31.

use crate::config::{PIC1_COMMAND, PIC1_DATA, PIC2_COMMAND, PIC2_DATA};
use crate::drivers::port::Port;

const ICW1_INIT: u8 = 0x11; // initialise, expect ICW4, cascade mode
const ICW4_8086: u8 = 0x01;
const PIC_EOI: u8 = 0x20;

pub const PIC1_OFFSET: u8 = 32;
pub const PIC2_OFFSET: u8 = 40;

/// Reprograms both PICs so IRQ vectors don't alias CPU exceptions. Masks are
/// left clear (all IRQs enabled); callers that don't want a given line can
/// mask it later through the data ports directly.
pub fn remap() {
    // ICW1: start init sequence, cascade mode
    Port::write_u8(PIC1_COMMAND, ICW1_INIT);
    io_wait();
    Port::write_u8(PIC2_COMMAND, ICW1_INIT);
    io_wait();

    // ICW2: vector offsets
    Port::write_u8(PIC1_DATA, PIC1_OFFSET);
    io_wait();
    Port::write_u8(PIC2_DATA, PIC2_OFFSET);
    io_wait();

    // ICW3: cascade wiring (master has slave on IRQ2, slave's cascade id is 2)
    Port::write_u8(PIC1_DATA, 0x04);
    io_wait();
    Port::write_u8(PIC2_DATA, 0x02);
    io_wait();

    // ICW4: 8086 mode
    Port::write_u8(PIC1_DATA, ICW4_8086);
    io_wait();
    Port::write_u8(PIC2_DATA, ICW4_8086);
    io_wait();

    // unmask everything
    Port::write_u8(PIC1_DATA, 0x00);
    Port::write_u8(PIC2_DATA, 0x00);
}

/// Sends End-Of-Interrupt. Always to the master; additionally to the slave
/// when the vector came from an IRQ >= 8 (vector >= 40).
pub fn send_eoi(vector: u8) {
    if vector >= PIC2_OFFSET {
        Port::write_u8(PIC2_COMMAND, PIC_EOI);
    }
    Port::write_u8(PIC1_COMMAND, PIC_EOI);
}

/// A write to an unused port, used as a cheap ~1-4us delay so the PIC has
/// time to process the previous command on real (slow) hardware.
fn io_wait() {
    Port::write_u8(0x80, 0);
}
