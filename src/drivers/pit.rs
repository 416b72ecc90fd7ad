//! PIT channel 0, programmed as a free-running 50 Hz rate generator. Its IRQ0 handler just advances the timer wheel and
//! nothing else -- all the interesting bucket-walking logic lives in
//! [`crate::timer`].

use crate::config::{PIT_BASE_FREQUENCY, PIT_CHANNEL0, PIT_COMMAND, PIT_HZ};
use crate::interrupts::register_handler;
use crate::interrupts::regs::RegisterSnapshot;
use crate::drivers::port::Port;
use crate::timer;

const PIT_CMD_CHANNEL0_RATE_GEN: u8 = 0x36;

pub fn init() {
    let divisor = (PIT_BASE_FREQUENCY / PIT_HZ) as u16;

    Port::write_u8(PIT_COMMAND, PIT_CMD_CHANNEL0_RATE_GEN);
    Port::write_u8(PIT_CHANNEL0, (divisor & 0xff) as u8);
    Port::write_u8(PIT_CHANNEL0, ((divisor >> 8) & 0xff) as u8);

    register_handler(32, on_irq0);
}

fn on_irq0(_regs: RegisterSnapshot) {
    timer::on_tick();
}
