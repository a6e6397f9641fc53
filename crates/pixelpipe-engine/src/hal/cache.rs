use super::DmaAddr;

/// Data cache maintenance.
///
/// Buffers written by the CPU must be cleaned before a DMA master reads them;
/// buffers written by a DMA master must be invalidated before the CPU reads them.
pub trait CacheOps: Send + Sync {
    /// Writes back dirty lines covering `len` bytes at `addr`.
    fn clean(&self, addr: &DmaAddr, len: usize);

    /// Discards cached lines covering `len` bytes at `addr`.
    fn invalidate(&self, addr: &DmaAddr, len: usize);

    /// Writes back and discards the whole data cache.
    fn clean_invalidate_all(&self);
}
