//! The slab heap. Three nested entities:
//!
//! - [`ChunkHeader`]: written into real memory immediately before the
//!   payload it describes. This is the one place in the heap that can't use
//!   the arena/handle style the rest of the kernel prefers -- the
//!   header *is* the memory being managed, so `kfree_heap` has to recover it
//!   by subtracting its size from the payload pointer, the way a C
//!   allocator would.
//! - [`Bundle`]: one 4 KiB-ish frame, carved into same-size chunks. Bundle
//!   bookkeeping (which pool it's in) goes through [`crate::common::list`]
//!   with [`BundleId`] handles, not intrusive pointers.
//! - [`Tub`]: a size class. Its free-chunk list spans every bundle
//!   currently assigned to it, addressed by a single global chunk id
//!   (`bundle_id * MAX_CHUNKS_PER_BUNDLE + slot`) rather than a pointer --
//!   the chunk's address is always derivable from that id plus the owning
//!   bundle's frame address and chunk size, so no separate chunk table is
//!   needed.

use crate::common::list::{LinkArena, ListHandle};
use crate::common::memset;
use crate::config::{CHUNK_MAGIC, GROW_BUNDLES_LIMIT, INIT_BUNDLES, MAX_BUNDLES, SIZE_CLASSES};
use crate::memory::frame::kmalloc;
use spin::Mutex;

const NUM_CLASSES: usize = SIZE_CLASSES.len();
const HEADER_SIZE: usize = core::mem::size_of::<ChunkHeader>();
const LARGEST_CLASS: usize = SIZE_CLASSES[NUM_CLASSES - 1];
const SMALLEST_CLASS: usize = SIZE_CLASSES[0];

/// Backing frame size for every bundle, regardless of which class currently
/// owns it: big enough to hold at least one chunk of the largest class.
pub const BUNDLE_SIZE: usize = LARGEST_CLASS + HEADER_SIZE;

/// Worst case chunk count for a bundle: however many (header + smallest
/// class) slots fit in [`BUNDLE_SIZE`].
const MAX_CHUNKS_PER_BUNDLE: usize = BUNDLE_SIZE / (HEADER_SIZE + SMALLEST_CLASS);
const TOTAL_CHUNK_SLOTS: usize = MAX_BUNDLES * MAX_CHUNKS_PER_BUNDLE;

type BundleId = usize;
type ChunkId = usize;

#[repr(C)]
struct ChunkHeader {
    magic: u32,
    in_use: u32,
    tub: u32,
    bundle: u32,
    size: u32,
}

#[derive(Clone, Copy)]
struct Bundle {
    /// Set on first use; never cleared once allocated -- the frame is
    /// retained (not released) when the bundle is retired.
    frame_addr: Option<usize>,
    owner_tub: Option<usize>,
    chunk_total_size: usize,
    chunks_count: usize,
    chunks_in_use: usize,
}

impl Bundle {
    const EMPTY: Bundle = Bundle {
        frame_addr: None,
        owner_tub: None,
        chunk_total_size: 0,
        chunks_count: 0,
        chunks_in_use: 0,
    };

    fn chunk_addr(&self, slot: usize) -> usize {
        self.frame_addr.expect("bundle frame not yet allocated") + slot * self.chunk_total_size
    }
}

struct Tub {
    class_size: usize,
    free_chunks: ListHandle,
    total_in_use: usize,
}

impl Tub {
    const fn new(class_size: usize) -> Self {
        Tub { class_size, free_chunks: ListHandle::new(), total_in_use: 0 }
    }
}

struct Heap {
    bundle_links: LinkArena<MAX_BUNDLES>,
    free_bundles: ListHandle,
    in_use_bundles: ListHandle,
    bundles: [Bundle; MAX_BUNDLES],
    total_bundles: usize,

    chunk_links: LinkArena<TOTAL_CHUNK_SLOTS>,
    tubs: [Tub; NUM_CLASSES],
}

impl Heap {
    const fn new() -> Self {
        Heap {
            bundle_links: LinkArena::new(),
            free_bundles: ListHandle::new(),
            in_use_bundles: ListHandle::new(),
            bundles: [Bundle::EMPTY; MAX_BUNDLES],
            total_bundles: 0,
            chunk_links: LinkArena::new(),
            tubs: [
                Tub::new(SIZE_CLASSES[0]),
                Tub::new(SIZE_CLASSES[1]),
                Tub::new(SIZE_CLASSES[2]),
                Tub::new(SIZE_CLASSES[3]),
                Tub::new(SIZE_CLASSES[4]),
                Tub::new(SIZE_CLASSES[5]),
            ],
        }
    }

    fn init(&mut self) {
        self.add_bundles(INIT_BUNDLES);
    }

    /// Creates `n` fresh, unassigned bundles and drops them in the free
    /// pool. Caller has already checked `total_bundles + n <= MAX_BUNDLES`.
    fn add_bundles(&mut self, n: usize) {
        for _ in 0..n {
            let id = self.total_bundles;
            self.bundles[id] = Bundle::EMPTY;
            self.bundle_links.add_tail(&mut self.free_bundles, id);
            self.total_bundles += 1;
        }
    }

    /// Pulls one bundle from the free pool (growing the pool first if
    /// empty), carves it into chunks of `tub_index`'s class and threads
    /// them onto that tub's free list.
    fn grow(&mut self, tub_index: usize) -> Result<(), ()> {
        if self.free_bundles.is_empty() {
            if self.total_bundles >= MAX_BUNDLES {
                return Err(());
            }
            let n = GROW_BUNDLES_LIMIT.min(MAX_BUNDLES - self.total_bundles);
            self.add_bundles(n);
        }

        let bundle_id = self.bundle_links.remove_front(&mut self.free_bundles).ok_or(())?;
        self.bundle_links.add_tail(&mut self.in_use_bundles, bundle_id);

        if self.bundles[bundle_id].frame_addr.is_none() {
            self.bundles[bundle_id].frame_addr = Some(kmalloc(BUNDLE_SIZE));
        }

        let class_size = self.tubs[tub_index].class_size;
        let chunk_total_size = HEADER_SIZE + class_size;
        let chunks_count = BUNDLE_SIZE / chunk_total_size;

        {
            let bundle = &mut self.bundles[bundle_id];
            bundle.owner_tub = Some(tub_index);
            bundle.chunk_total_size = chunk_total_size;
            bundle.chunks_count = chunks_count;
            bundle.chunks_in_use = 0;
        }

        for slot in 0..chunks_count {
            let addr = self.bundles[bundle_id].chunk_addr(slot);
            unsafe {
                let header = &mut *(addr as *mut ChunkHeader);
                header.magic = CHUNK_MAGIC;
                header.in_use = 0;
                header.tub = tub_index as u32;
                header.bundle = bundle_id as u32;
                header.size = class_size as u32;
            }
            let chunk_id = global_chunk_id(bundle_id, slot);
            self.chunk_links.add_tail(&mut self.tubs[tub_index].free_chunks, chunk_id);
        }

        Ok(())
    }

    /// Unlinks every chunk of `bundle_id` from its tub's free list, zeroes
    /// the frame and returns the bundle to the free pool.
    fn shrink(&mut self, bundle_id: BundleId) {
        let (owner_tub, chunks_count, frame_addr) = {
            let bundle = &self.bundles[bundle_id];
            (bundle.owner_tub.expect("shrinking an idle bundle"), bundle.chunks_count, bundle.frame_addr.unwrap())
        };

        for slot in 0..chunks_count {
            let chunk_id = global_chunk_id(bundle_id, slot);
            self.chunk_links.remove(&mut self.tubs[owner_tub].free_chunks, chunk_id);
        }

        unsafe {
            memset(frame_addr as *mut u8, 0, BUNDLE_SIZE);
        }

        self.bundle_links.remove(&mut self.in_use_bundles, bundle_id);
        self.bundles[bundle_id].owner_tub = None;
        self.bundles[bundle_id].chunks_count = 0;
        self.bundles[bundle_id].chunks_in_use = 0;
        self.bundle_links.add_tail(&mut self.free_bundles, bundle_id);
    }

    pub fn free_bundles_count(&self) -> usize {
        self.free_bundles.len()
    }
}

fn global_chunk_id(bundle_id: BundleId, slot: usize) -> ChunkId {
    bundle_id * MAX_CHUNKS_PER_BUNDLE + slot
}

static HEAP: Mutex<Heap> = Mutex::new(Heap::new());

pub fn init() {
    HEAP.lock().init();
}

/// Smallest size class able to hold `requested`, or `None` if `requested`
/// is at or above the largest class. `requested == LARGEST_CLASS` is
/// rejected, not rounded up to it: the largest tub still needs room for its
/// own header, so a request for exactly its payload size can't be served.
fn pick_class(requested: usize) -> Option<usize> {
    if requested >= LARGEST_CLASS {
        return None;
    }
    SIZE_CLASSES.iter().position(|&c| requested <= c)
}

/// Allocates a zeroed chunk at least `size` bytes, or returns `None` on
/// oversize request or bundle exhaustion.
pub fn kmalloc_heap(size: usize) -> Option<*mut u8> {
    let tub_index = pick_class(size)?;
    let mut heap = HEAP.lock();

    if heap.tubs[tub_index].free_chunks.is_empty() {
        heap.grow(tub_index).ok()?;
    }

    let chunk_id = heap.chunk_links.remove_front(&mut heap.tubs[tub_index].free_chunks)?;
    let bundle_id = chunk_id / MAX_CHUNKS_PER_BUNDLE;
    let addr = heap.bundles[bundle_id].chunk_addr(chunk_id % MAX_CHUNKS_PER_BUNDLE);

    heap.tubs[tub_index].total_in_use += 1;
    heap.bundles[bundle_id].chunks_in_use += 1;

    unsafe {
        let header = &mut *(addr as *mut ChunkHeader);
        header.in_use = 1;
        let payload = (addr + HEADER_SIZE) as *mut u8;
        memset(payload, 0, header.size as usize);
        Some(payload)
    }
}

/// Validates the header, returns the chunk to its tub's free list, and
/// shrinks the owning bundle if it just went fully idle.
///
/// # Panics
/// If the header's magic doesn't match or the chunk wasn't in use: both are
/// heap invariant violations.
///
/// # Safety
/// `ptr` must be a payload pointer previously returned by `kmalloc_heap`
/// and not already freed.
pub unsafe fn kfree_heap(ptr: *mut u8) {
    let header_addr = (ptr as usize) - HEADER_SIZE;
    let header = unsafe { &mut *(header_addr as *mut ChunkHeader) };

    assert_eq!(header.magic, CHUNK_MAGIC, "kfree_heap: bad chunk magic");
    assert_eq!(header.in_use, 1, "kfree_heap: double free or free of unallocated chunk");

    let tub_index = header.tub as usize;
    let bundle_id = header.bundle as usize;
    header.in_use = 0;

    let mut heap = HEAP.lock();
    let chunk_total_size = heap.bundles[bundle_id].chunk_total_size;
    let slot = (header_addr - heap.bundles[bundle_id].frame_addr.unwrap()) / chunk_total_size;
    let chunk_id = global_chunk_id(bundle_id, slot);

    heap.chunk_links.add_tail(&mut heap.tubs[tub_index].free_chunks, chunk_id);
    heap.tubs[tub_index].total_in_use -= 1;
    heap.bundles[bundle_id].chunks_in_use -= 1;

    if heap.bundles[bundle_id].chunks_in_use == 0 {
        heap.shrink(bundle_id);
    }
}

pub fn free_bundles_count() -> usize {
    HEAP.lock().free_bundles_count()
}

pub fn total_in_use(size: usize) -> Option<usize> {
    let tub_index = pick_class(size)?;
    Some(HEAP.lock().tubs[tub_index].total_in_use)
}

#[cfg(test)]
mod tests {
    // Exercising these against real memory needs kmalloc()'s identity-map
    // path (ports, paging), so they aren't run on a hosted target.
}
