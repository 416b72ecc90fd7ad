//! PS/2 keyboard ISR: reads the data port, drops break codes (high
//! bit set) and unmapped keys, echoes printable characters straight to VGA,
//! and pushes the translated byte into the ring buffer the shell drains
//! from task context.

use crate::common::ring_buffer::RingBuffer;
use crate::config::KEYBOARD_RING_BUF_MAX;
use crate::drivers::port::Port;
use crate::drivers::vga::WRITER;
use crate::interrupts::register_handler;
use crate::interrupts::regs::RegisterSnapshot;
use crate::config::KEYBOARD_DATA_PORT;
use spin::Mutex;

const SC_BACKSPACE: u8 = 0x0e;
const SC_ARROW_UP: u8 = 0x48;
const SC_ARROW_DOWN: u8 = 0x50;
const SC_ARROW_LEFT: u8 = 0x4b;
const SC_ARROW_RIGHT: u8 = 0x4d;

/// 128-entry scancode -> string table. `None` for unmapped keys (shift,
/// ctrl, alt, caps lock, function keys, ...), which are silently dropped
///.
const SCANCODE_TABLE: [Option<&'static str>; 128] = build_scancode_table();

const fn build_scancode_table() -> [Option<&'static str>; 128] {
    let mut table: [Option<&'static str>; 128] = [None; 128];
    table[0x02] = Some("1"); table[0x03] = Some("2"); table[0x04] = Some("3");
    table[0x05] = Some("4"); table[0x06] = Some("5"); table[0x07] = Some("6");
    table[0x08] = Some("7"); table[0x09] = Some("8"); table[0x0a] = Some("9");
    table[0x0b] = Some("0"); table[0x0c] = Some("-"); table[0x0d] = Some("=");
    table[0x0f] = Some("\t");
    table[0x10] = Some("q"); table[0x11] = Some("w"); table[0x12] = Some("e");
    table[0x13] = Some("r"); table[0x14] = Some("t"); table[0x15] = Some("y");
    table[0x16] = Some("u"); table[0x17] = Some("i"); table[0x18] = Some("o");
    table[0x19] = Some("p"); table[0x1a] = Some("["); table[0x1b] = Some("]");
    table[0x1c] = Some("\n");
    table[0x1e] = Some("a"); table[0x1f] = Some("s"); table[0x20] = Some("d");
    table[0x21] = Some("f"); table[0x22] = Some("g"); table[0x23] = Some("h");
    table[0x24] = Some("j"); table[0x25] = Some("k"); table[0x26] = Some("l");
    table[0x27] = Some(";"); table[0x28] = Some("'"); table[0x29] = Some("`");
    table[0x2b] = Some("\\");
    table[0x2c] = Some("z"); table[0x2d] = Some("x"); table[0x2e] = Some("c");
    table[0x2f] = Some("v"); table[0x30] = Some("b"); table[0x31] = Some("n");
    table[0x32] = Some("m"); table[0x33] = Some(","); table[0x34] = Some(".");
    table[0x35] = Some("/");
    table[0x39] = Some(" ");
    table
}

static KEYBOARD_RING: Mutex<RingBuffer<u8, KEYBOARD_RING_BUF_MAX>> = Mutex::new(RingBuffer::new());

pub fn init() {
    register_handler(33, on_irq1);
}

fn on_irq1(_regs: RegisterSnapshot) {
    let scancode = Port::read_u8(KEYBOARD_DATA_PORT);

    // break code: key released, nothing to do
    if scancode & 0x80 != 0 {
        return;
    }

    match scancode {
        SC_ARROW_UP => WRITER.lock().move_up(),
        SC_ARROW_DOWN => WRITER.lock().move_down(),
        SC_ARROW_LEFT => WRITER.lock().move_left(),
        SC_ARROW_RIGHT => WRITER.lock().move_right(),
        SC_BACKSPACE => {
            use core::fmt::Write;
            let _ = write!(WRITER.lock(), "{}", 0x08 as char);
            push_byte(0x08);
        }
        _ => {
            if let Some(s) = SCANCODE_TABLE[scancode as usize & 0x7f] {
                use core::fmt::Write;
                let _ = write!(WRITER.lock(), "{s}");
                for b in s.bytes() {
                    push_byte(b);
                }
            }
        }
    }
}

fn push_byte(b: u8) {
    KEYBOARD_RING.lock().push(b);
}

/// Pops the next translated byte pushed by the ISR, or `None` if the
/// buffer is currently empty. Callers must only call this while CPU
/// interrupts are masked.
pub fn pop_byte() -> Option<u8> {
    KEYBOARD_RING.lock().pop()
}
