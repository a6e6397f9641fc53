use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::coords::Area;
use crate::paint::ColorFormat;
use crate::sync::lock;

use super::{BufHeader, BufferAllocator, DmaAddr, DrawBuf};

/// Stable layer identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct LayerId(pub u32);

static NEXT_LAYER_ID: AtomicU32 = AtomicU32::new(1);

/// Render target that draw tasks write into.
///
/// The compositor owns layers; tasks only hold a reference. The backing buffer
/// is allocated lazily by the first unit that dispatches a task for the layer.
#[derive(Debug)]
pub struct Layer {
    id: LayerId,
    color_format: ColorFormat,
    /// Screen area covered by the buffer.
    buf_area: Area,
    draw_buf: Mutex<Option<DrawBuf>>,
    /// Set once the compositor will not add further tasks to this layer.
    all_tasks_added: AtomicBool,
}

impl Layer {
    pub fn new(color_format: ColorFormat, buf_area: Area) -> Arc<Self> {
        Arc::new(Self {
            id: LayerId(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed)),
            color_format,
            buf_area,
            draw_buf: Mutex::new(None),
            all_tasks_added: AtomicBool::new(false),
        })
    }

    /// Layer rendering directly into an existing buffer (e.g. a framebuffer).
    pub fn with_buffer(buf_area: Area, buf: DrawBuf) -> Arc<Self> {
        Arc::new(Self {
            id: LayerId(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed)),
            color_format: buf.header().cf,
            buf_area,
            draw_buf: Mutex::new(Some(buf)),
            all_tasks_added: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[inline]
    pub fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    #[inline]
    pub fn buf_area(&self) -> Area {
        self.buf_area
    }

    /// Header the backing buffer has (or will have once allocated).
    pub fn buf_header(&self) -> BufHeader {
        BufHeader::new(
            self.buf_area.width().max(0) as u32,
            self.buf_area.height().max(0) as u32,
            self.color_format,
        )
    }

    pub fn draw_buf(&self) -> Option<DrawBuf> {
        lock(&self.draw_buf).clone()
    }

    /// Returns the backing buffer, allocating it on first use.
    pub fn ensure_buffer(&self, allocator: &dyn BufferAllocator) -> Option<DrawBuf> {
        let mut slot = lock(&self.draw_buf);
        if slot.is_none() {
            *slot = allocator.allocate(self.buf_header());
        }
        slot.clone()
    }

    #[inline]
    pub fn all_tasks_added(&self) -> bool {
        self.all_tasks_added.load(Ordering::Acquire)
    }

    pub fn set_all_tasks_added(&self, done: bool) {
        self.all_tasks_added.store(done, Ordering::Release);
    }

    /// Buffer address of the screen pixel `(x, y)`.
    ///
    /// Returns `None` if the buffer is not allocated or the point lies outside it.
    pub fn addr_of(&self, x: i32, y: i32) -> Option<DmaAddr> {
        let buf = self.draw_buf()?;
        let (bx, by) = (x - self.buf_area.x1, y - self.buf_area.y1);
        let h = buf.header();
        if bx < 0 || by < 0 || bx as u32 >= h.w || by as u32 >= h.h {
            return None;
        }
        Some(buf.addr(bx as u32, by as u32))
    }
}
