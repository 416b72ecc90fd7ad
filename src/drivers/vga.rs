//! Text-mode framebuffer driver: a `Writer`/`Color` split extended with
//! the hardware cursor (ports `0x3D4`/`0x3D5`), scrolling and a "fresh
//! line" rule for system messages.

use crate::config::{VGA_BUFFER_ADDR, VGA_CRTC_DATA, VGA_CRTC_INDEX, VGA_HEIGHT, VGA_WIDTH};
use crate::drivers::port::Port;
use crate::lock_intr::without_interrupts;
use core::fmt;
use lazy_static::lazy_static;
use spin::Mutex;

#[repr(u8)]
#[allow(dead_code)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black = 0x0,
    Blue = 0x1,
    Green = 0x2,
    Cyan = 0x3,
    Red = 0x4,
    Magenta = 0x5,
    Brown = 0x6,
    LightGray = 0x7,
    Gray = 0x8,
    LightBlue = 0x9,
    LightGreen = 0xa,
    LightCyan = 0xb,
    LightRed = 0xc,
    Pink = 0xd,
    Yellow = 0xe,
    White = 0xf,
}

#[repr(transparent)]
#[derive(Clone, Copy)]
struct ColorCode(u8);

impl ColorCode {
    const fn new(foreground: Color, background: Color) -> ColorCode {
        ColorCode((background as u8) << 4 | (foreground as u8))
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
struct ScreenChar {
    ascii_char: u8,
    color_code: ColorCode,
}

#[repr(transparent)]
struct ScreenBuf {
    chars: [[ScreenChar; VGA_WIDTH]; VGA_HEIGHT],
}

pub struct Writer {
    column: usize,
    row: usize,
    color_code: ColorCode,
    buffer: &'static mut ScreenBuf,
}

const BLANK: ScreenChar = ScreenChar { ascii_char: b' ', color_code: ColorCode(0x0f) };

/// Fixed prompt character laid down at column 0 of every fresh row.
const PROMPT_CHAR: u8 = b'$';

impl Writer {
    fn newline(&mut self) {
        self.row += 1;
        if self.row >= VGA_HEIGHT {
            self.scroll();
            self.row = VGA_HEIGHT - 1;
        }
        self.print_prompt();
    }

    /// Stamps [`PROMPT_CHAR`] at column 0 of the current row and parks the
    /// cursor right after it.
    fn print_prompt(&mut self) {
        self.buffer.chars[self.row][0] = ScreenChar { ascii_char: PROMPT_CHAR, color_code: self.color_code };
        self.column = 1;
    }

    fn scroll(&mut self) {
        for row in 1..VGA_HEIGHT {
            self.buffer.chars[row - 1] = self.buffer.chars[row];
        }
        self.buffer.chars[VGA_HEIGHT - 1] = [BLANK; VGA_WIDTH];
    }

    fn write_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => self.newline(),
            0x08 => self.backspace(),
            0x20..=0x7e => {
                if self.column >= VGA_WIDTH {
                    self.newline();
                }
                self.buffer.chars[self.row][self.column] =
                    ScreenChar { ascii_char: byte, color_code: self.color_code };
                self.column += 1;
            }
            _ => {}
        }
    }

    /// Refuses to cross the prompt: never backs up past column 1, since
    /// column 0 of the row holds [`PROMPT_CHAR`].
    fn backspace(&mut self) {
        if self.column > 1 {
            self.column -= 1;
            self.buffer.chars[self.row][self.column] = BLANK;
        }
    }

    fn write_str(&mut self, s: &str) {
        for b in s.bytes() {
            self.write_byte(b);
        }
    }

    /// Ensures the next write starts right after a fresh prompt, so "system
    /// messages" (panics, boot diagnostics) never share a line with partial
    /// shell output. Column 1 (just past [`PROMPT_CHAR`]) already counts as
    /// fresh.
    pub fn fresh_line(&mut self) {
        if self.column > 1 {
            self.newline();
        }
    }

    pub fn set_color(&mut self, fg: Color, bg: Color) {
        self.color_code = ColorCode::new(fg, bg);
    }

    pub fn clear(&mut self) {
        for row in self.buffer.chars.iter_mut() {
            *row = [BLANK; VGA_WIDTH];
        }
        self.row = 0;
        self.print_prompt();
        self.sync_cursor();
    }

    fn sync_cursor(&self) {
        move_cursor(self.row, self.column);
    }

    /// Clamped cursor motion for arrow keys, within the 25x80 grid.
    pub fn move_left(&mut self) {
        if self.column > 0 {
            self.column -= 1;
        }
        self.sync_cursor();
    }

    pub fn move_right(&mut self) {
        if self.column + 1 < VGA_WIDTH {
            self.column += 1;
        }
        self.sync_cursor();
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
        }
        self.sync_cursor();
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < VGA_HEIGHT {
            self.row += 1;
        }
        self.sync_cursor();
    }
}

impl fmt::Write for Writer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Writer::write_str(self, s);
        self.sync_cursor();
        Ok(())
    }
}

fn move_cursor(row: usize, col: usize) {
    let pos = (row * VGA_WIDTH + col) as u16;
    Port::write_u8(VGA_CRTC_INDEX, 0x0f);
    Port::write_u8(VGA_CRTC_DATA, (pos & 0xff) as u8);
    Port::write_u8(VGA_CRTC_INDEX, 0x0e);
    Port::write_u8(VGA_CRTC_DATA, ((pos >> 8) & 0xff) as u8);
}

// spin locks are not the best but they work and we have no concept of
// blocking or even threads in this os to use a better alternative.
lazy_static! {
    pub static ref WRITER: Mutex<Writer> = Mutex::new(Writer {
        column: 0,
        row: 0,
        color_code: ColorCode::new(Color::White, Color::Black),
        buffer: unsafe { &mut *(VGA_BUFFER_ADDR as *mut ScreenBuf) },
    });
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    without_interrupts(|| {
        WRITER.lock().write_fmt(args).unwrap();
    });
}

#[doc(hidden)]
pub fn _print_colored(fg: Color, bg: Color, args: fmt::Arguments) {
    use fmt::Write;
    without_interrupts(|| {
        let mut writer = WRITER.lock();
        let saved = (Color::White, Color::Black);
        writer.set_color(fg, bg);
        writer.write_fmt(args).unwrap();
        writer.set_color(saved.0, saved.1);
    });
}
