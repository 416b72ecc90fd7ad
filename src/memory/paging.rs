//! Two-level paging. A page directory holds, per slot, both the
//! software (virtual pointer) view of its page table -- needed so
//! `add_page_table_entry` can write into one it just allocated -- and the
//! hardware (`phys | flags`) view that gets installed into `cr3`.
//!
//! There is no demand paging and no copy-on-write: every mapping this
//! kernel ever makes is installed eagerly, once, by `add_page_table_entry`.

use crate::common::memset;
use crate::config::PAGE_SIZE;
use crate::interrupts::regs::RegisterSnapshot;
use crate::interrupts::register_handler;
use crate::memory::bump::{current_frontier, kmalloc_mem};
use core::arch::asm;

const ENTRIES: usize = 1024;
const PRESENT: u32 = 1 << 0;
const RW: u32 = 1 << 1;

#[repr(C, align(4096))]
pub struct PageTable {
    entries: [u32; ENTRIES],
}

impl PageTable {
    fn zeroed_at(addr: usize) -> &'static mut PageTable {
        unsafe {
            memset(addr as *mut u8, 0, core::mem::size_of::<PageTable>());
            &mut *(addr as *mut PageTable)
        }
    }
}

/// The page directory. `tables[i]` is the virtual pointer to page table `i`
/// (for software traversal / further installs); `hw[i]` is what actually
/// gets loaded into `cr3`-reachable memory (`phys | PDE flags`, or 0 if
/// unmapped).
#[repr(C, align(4096))]
pub struct PageDirectory {
    hw: [u32; ENTRIES],
    tables: [Option<&'static mut PageTable>; ENTRIES],
}

fn split_virt(virt: usize) -> (usize, usize) {
    let dir_index = (virt >> 22) & 0x3ff;
    let table_index = (virt >> 12) & 0x3ff;
    (dir_index, table_index)
}

static mut PAGE_DIRECTORY: *mut PageDirectory = core::ptr::null_mut();

fn page_directory() -> &'static mut PageDirectory {
    #[allow(static_mut_refs)]
    unsafe {
        PAGE_DIRECTORY.as_mut().expect("paging not initialized")
    }
}

/// Splits `virt` into directory/table indices, lazily allocates the page
/// table for that directory slot if needed (bump-allocated, page-aligned,
/// zeroed), and writes the leaf PTE as `phys | present | rw`.
///
/// # Panics
/// If the leaf was already mapped: double-mapping is treated as a bug, not
/// a recoverable condition.
pub fn add_page_table_entry(virt: usize, phys: usize, dir: &mut PageDirectory) {
    let (dir_index, table_index) = split_virt(virt);

    if dir.tables[dir_index].is_none() {
        let table_phys = kmalloc_mem(core::mem::size_of::<PageTable>(), true);
        let table = PageTable::zeroed_at(table_phys);
        dir.hw[dir_index] = (table_phys as u32) | PRESENT | RW;
        dir.tables[dir_index] = Some(table);
    }

    let table = dir.tables[dir_index].as_mut().unwrap();
    assert!(table.entries[table_index] & PRESENT == 0, "double mapping of a page is a bug");
    table.entries[table_index] = (phys as u32) | 0x3; // present + rw
}

/// Identity-maps every page from address 0 up to the bump frontier *at the
/// time each page is walked* -- including pages consumed by page tables
/// that `add_page_table_entry` itself allocates mid-walk. Do not hoist the
/// frontier read out of the loop: a page table allocated mid-walk advances
/// the frontier, and the walk must see that advance to map it too.
pub fn init() {
    let dir_addr = kmalloc_mem(core::mem::size_of::<PageDirectory>(), true);
    unsafe {
        memset(dir_addr as *mut u8, 0, core::mem::size_of::<PageDirectory>());
        let dir = &mut *(dir_addr as *mut PageDirectory);

        let mut addr = 0usize;
        while addr < current_frontier() {
            add_page_table_entry(addr, addr, dir);
            addr += PAGE_SIZE;
        }

        register_handler(14, page_fault_handler);

        PAGE_DIRECTORY = dir_addr as *mut PageDirectory;
        install_cr3(dir_addr as u32);
        enable_paging_bit();
    }
}

unsafe fn install_cr3(dir_phys: u32) {
    unsafe {
        asm!("mov cr3, {0}", in(reg) dir_phys, options(nostack, preserves_flags));
    }
}

unsafe fn enable_paging_bit() {
    unsafe {
        asm!(
            "mov {tmp}, cr0",
            "or {tmp}, 0x80000000",
            "mov cr0, {tmp}",
            tmp = out(reg) _,
            options(nostack, preserves_flags),
        );
    }
}

fn read_cr2() -> u32 {
    let value: u32;
    unsafe {
        asm!("mov {0}, cr2", out(reg) value, options(nostack, preserves_flags));
    }
    value
}

bitflags::bitflags! {
    struct PageFaultErrorCode: u32 {
        const PRESENT = 1 << 0;
        const WRITE   = 1 << 1;
        const USER    = 1 << 2;
        const RESERVED_WRITE = 1 << 3;
    }
}

/// There is no demand paging: every page fault is a fatal diagnostic.
fn page_fault_handler(regs: RegisterSnapshot) {
    let faulting_addr = read_cr2();
    let code = PageFaultErrorCode::from_bits_truncate(regs.error_code);

    crate::log!(failed, "Page fault at {:#x}", faulting_addr);
    crate::println!(
        "present={} write={} user={} reserved={}",
        code.contains(PageFaultErrorCode::PRESENT),
        code.contains(PageFaultErrorCode::WRITE),
        code.contains(PageFaultErrorCode::USER),
        code.contains(PageFaultErrorCode::RESERVED_WRITE),
    );
    panic!("page fault");
}

/// Exposed for [`super::frame::kmalloc`], which needs to install PTEs for
/// freshly bump-allocated identity-mapped pages after boot.
pub fn map_identity(phys_page: usize) {
    add_page_table_entry(phys_page, phys_page, page_directory());
}

/// Whether `virt`'s page-table entry is present and writable. `false` if the covering directory slot has no table at all.
pub fn is_mapped_rw(virt: usize) -> bool {
    let (dir_index, table_index) = split_virt(virt);
    let dir = page_directory();
    match &dir.tables[dir_index] {
        Some(table) => table.entries[table_index] & (PRESENT | RW) == (PRESENT | RW),
        None => false,
    }
}
