use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::paint::{Color32, ColorFormat};

/// Geometry and format of a pixel buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufHeader {
    pub w: u32,
    pub h: u32,
    /// Bytes per row.
    pub stride: u32,
    pub cf: ColorFormat,
}

impl BufHeader {
    /// Header with a tightly packed stride.
    #[inline]
    pub const fn new(w: u32, h: u32, cf: ColorFormat) -> Self {
        Self { w, h, stride: w * (cf.bpp() / 8), cf }
    }

    #[inline]
    pub const fn data_size(&self) -> usize {
        self.stride as usize * self.h as usize
    }

    /// Byte offset of pixel `(x, y)`.
    #[inline]
    pub const fn offset_of(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride as usize + x as usize * self.cf.bytes_per_pixel()
    }
}

/// Shared pixel buffer.
///
/// Cloning is cheap and yields another handle to the same memory, which is how
/// layers, images, the accelerator and the panel DMA all refer to one buffer.
#[derive(Clone)]
pub struct DrawBuf {
    header: BufHeader,
    data: Arc<RwLock<Vec<u8>>>,
}

impl DrawBuf {
    /// Allocates a zeroed buffer.
    pub fn new(header: BufHeader) -> Self {
        Self {
            header,
            data: Arc::new(RwLock::new(vec![0; header.data_size()])),
        }
    }

    /// Wraps existing pixel data. Returns `None` if `data` is too short for `header`.
    pub fn from_bytes(header: BufHeader, data: Vec<u8>) -> Option<Self> {
        if data.len() < header.data_size() {
            return None;
        }
        Some(Self {
            header,
            data: Arc::new(RwLock::new(data)),
        })
    }

    #[inline]
    pub fn header(&self) -> BufHeader {
        self.header
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.header.data_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles refer to the same memory.
    #[inline]
    pub fn same(&self, other: &DrawBuf) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Address of pixel `(x, y)` for hardware programming.
    #[inline]
    pub fn addr(&self, x: u32, y: u32) -> DmaAddr {
        DmaAddr::new(self.clone(), self.header.offset_of(x, y))
    }

    /// Reads one pixel. Out-of-bounds coordinates return `None`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if x >= self.header.w || y >= self.header.h {
            return None;
        }
        let off = self.header.offset_of(x, y);
        Some(self.header.cf.read(&self.read()[off..]))
    }

    /// Overwrites every pixel with `px`.
    pub fn clear(&self, px: Color32) {
        let h = self.header;
        let bpp = h.cf.bytes_per_pixel();
        let mut data = self.write();
        for y in 0..h.h {
            for x in 0..h.w {
                let off = h.offset_of(x, y);
                h.cf.write(&mut data[off..off + bpp], px);
            }
        }
    }
}

impl fmt::Debug for DrawBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawBuf")
            .field("header", &self.header)
            .field("data", &Arc::as_ptr(&self.data))
            .finish()
    }
}

/// A location inside a [`DrawBuf`], as programmed into DMA-capable peripherals.
#[derive(Debug, Clone)]
pub struct DmaAddr {
    pub buf: DrawBuf,
    pub offset: usize,
}

impl DmaAddr {
    #[inline]
    pub fn new(buf: DrawBuf, offset: usize) -> Self {
        Self { buf, offset }
    }
}

impl PartialEq for DmaAddr {
    fn eq(&self, other: &Self) -> bool {
        self.buf.same(&other.buf) && self.offset == other.offset
    }
}

/// Source of layer backing buffers.
pub trait BufferAllocator: Send + Sync {
    /// Returns `None` when memory is exhausted.
    fn allocate(&self, header: BufHeader) -> Option<DrawBuf>;
}

/// Heap allocator with an optional byte budget.
///
/// The budget behaves like a frame arena: allocations only count up until
/// [`reset`](Self::reset) is called.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    budget: Option<usize>,
    used: AtomicUsize,
}

impl HeapAllocator {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_budget(bytes: usize) -> Self {
        Self {
            budget: Some(bytes),
            used: AtomicUsize::new(0),
        }
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.used.store(0, Ordering::Relaxed);
    }
}

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, header: BufHeader) -> Option<DrawBuf> {
        let size = header.data_size();
        let reserved = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                let next = used.checked_add(size)?;
                match self.budget {
                    Some(budget) if next > budget => None,
                    _ => Some(next),
                }
            });

        match reserved {
            Ok(_) => Some(DrawBuf::new(header)),
            Err(used) => {
                log::warn!("layer buffer allocation of {size} bytes failed ({used} bytes in use)");
                None
            }
        }
    }
}
