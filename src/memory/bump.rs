//! The bump allocator. A single monotonic frontier into the static
//! window `[FREE_MEM_START, FREE_MEM_START + MEM_SIZE)`, used both directly
//! (page tables, the page directory, VFS/timer/heap backing arrays live
//! above this window as `static`s — only page-aligned frames and raw bytes
//! come from here) and as the substrate [`super::frame`] builds the
//! identity-mapped frame allocator on top of.

use crate::config::{FREE_MEM_START, MEM_SIZE, PAGE_SIZE};
use spin::Mutex;

static FREE_MEM_PTR: Mutex<usize> = Mutex::new(FREE_MEM_START);

fn align_up(addr: usize, align: usize) -> usize {
    (addr + align - 1) & !(align - 1)
}

/// Reserves `size` bytes from the bump arena. If `align`, the returned
/// address is first rounded up to the next `PAGE_SIZE` boundary. Panics
/// if the frontier would cross the end of the arena.
pub fn kmalloc_mem(size: usize, align: bool) -> usize {
    let mut ptr = FREE_MEM_PTR.lock();
    let mut addr = *ptr;
    if align {
        addr = align_up(addr, PAGE_SIZE);
    }

    let new_ptr = addr + size;
    if new_ptr >= FREE_MEM_START + MEM_SIZE {
        panic!("No memory");
    }

    *ptr = new_ptr;
    addr
}

/// Current bump frontier. Paging init uses this to know how much of the
/// arena needs identity-mapping at boot.
pub fn current_frontier() -> usize {
    *FREE_MEM_PTR.lock()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_monotonically() {
        let start = current_frontier();
        let a = kmalloc_mem(16, false);
        let b = kmalloc_mem(16, false);
        assert_eq!(a, start);
        assert_eq!(b, start + 16);
    }

    #[test]
    fn aligns_when_requested() {
        let a = kmalloc_mem(1, true);
        assert_eq!(a % PAGE_SIZE, 0);
    }
}
