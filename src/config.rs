//! Every tunable constant named in the design lives here so the rest of the
//! crate never hand-codes a magic number twice.

/// Username reported by `whoami` and embedded in `pwd` output.
pub const USERNAME: &str = "pbagur";

/// Start of the bump arena / identity-mapped kernel window.
pub const FREE_MEM_START: usize = 0x100000;

/// Size of the bump arena / identity-mapped kernel window (16 MiB).
pub const MEM_SIZE: usize = 0x1000000;

/// Size of one physical page / page table / page directory.
pub const PAGE_SIZE: usize = 4096;

/// Kernel code segment selector, set up by the bootloader's GDT.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

/// Kernel data segment selector, set up by the bootloader's GDT.
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;

// --- heap (slab allocator) --------------------------------------------------

/// Ascending size classes a "tub" can serve. Requests strictly greater than
/// the last class are rejected.
pub const SIZE_CLASSES: [usize; 6] = [32, 128, 256, 512, 1024, 4096];

/// Maximum number of bundles (4 KiB frames) the heap will ever hold.
pub const MAX_BUNDLES: usize = 100;

/// Number of bundles pre-allocated into the free pool at heap init.
pub const INIT_BUNDLES: usize = 20;

/// Number of bundles created at once when the free pool runs dry.
pub const GROW_BUNDLES_LIMIT: usize = 10;

// --- timer wheel -------------------------------------------------------------

/// Minimum-delay threshold (in ticks) for each of the five buckets.
pub const TIMER_BUCKET_DELAYS: [u32; 5] = [0, 50, 100, 500, 1000];

/// Bucket `i` is walked every `TIMER_BUCKET_PROCESS[i]` ticks.
pub const TIMER_BUCKET_PROCESS: [u32; 5] = [1, 3, 8, 15, 50];

/// Maximum number of live timer records (arena capacity).
pub const MAX_TIMERS: usize = 256;

/// Heartbeat interval, in ticks, that drives the shell's `process` flag.
pub const HEARTBEAT_TICKS: u32 = 30;

// --- PIT ----------------------------------------------------------------------

/// PIT input clock frequency in Hz.
pub const PIT_BASE_FREQUENCY: u32 = 1_193_180;

/// Desired tick rate. `PIT_BASE_FREQUENCY / PIT_HZ` is written to the PIT
/// divisor register.
pub const PIT_HZ: u32 = 50;

// --- hardware ports -------------------------------------------------------------

pub const PIC1_COMMAND: u16 = 0x20;
pub const PIC1_DATA: u16 = 0x21;
pub const PIC2_COMMAND: u16 = 0xA0;
pub const PIC2_DATA: u16 = 0xA1;
pub const PIT_CHANNEL0: u16 = 0x40;
pub const PIT_COMMAND: u16 = 0x43;
pub const KEYBOARD_DATA_PORT: u16 = 0x60;
pub const VGA_CRTC_INDEX: u16 = 0x3D4;
pub const VGA_CRTC_DATA: u16 = 0x3D5;
pub const SERIAL_COM1: u16 = 0x3F8;

// --- VGA text console -----------------------------------------------------------

pub const VGA_BUFFER_ADDR: usize = 0xB8000;
pub const VGA_WIDTH: usize = 80;
pub const VGA_HEIGHT: usize = 25;

// --- keyboard --------------------------------------------------------------------

pub const KEYBOARD_RING_BUF_MAX: usize = 2048;

// --- VFS ----------------------------------------------------------------------

pub const VFS_NODE_MAGIC: u32 = 0x9124;
pub const VFS_NAME_LEN: usize = 32;
pub const VFS_DEFAULT_BUF_SIZE: usize = 64;
pub const VFS_PRESET_DIRS: [&str; 5] = ["scratch", "var", "bin", "log", "home"];
pub const VFS_MAX_NODES: usize = 256;
pub const VFS_MAX_CHILDREN_PER_NODE: usize = 32;

// --- shell --------------------------------------------------------------------

pub const SHELL_MAX_ARGS: usize = 8;
pub const SHELL_LINE_BUF_MAX: usize = KEYBOARD_RING_BUF_MAX;

// --- heap chunk header -----------------------------------------------------------

/// Magic value stamped into every chunk header; validated on free.
pub const CHUNK_MAGIC: u32 = 0x71291;
