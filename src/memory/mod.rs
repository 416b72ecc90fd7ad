//! Memory subsystem: bump allocator -> paging -> frame allocator -> slab
//! heap. Each layer owns its own global state; `init()` wires them up in
//! the only order that works (paging before `kmalloc`, `kmalloc` before
//! the heap can grow its first bundle).

pub mod bump;
pub mod frame;
pub mod heap;
pub mod paging;

pub use bump::kmalloc_mem;
pub use frame::kmalloc;
pub use heap::{kfree_heap, kmalloc_heap};

pub fn init() {
    paging::init();
    heap::init();
}
