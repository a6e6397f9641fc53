use std::time::Instant;

use crate::coords::Area;
use crate::draw::shapes::FillDsc;
use crate::draw::{DrawBuf, DrawTask, Layer};
use crate::paint::{Color32, Opa};
use crate::sw;

use super::transfer::{HardwareHeader, TransferConfig, TransferError};
use super::worker::Executor;

/// Constant-color transfer covering `area` (screen coordinates) of `layer`.
///
/// `area` must already be clipped to the layer's buffer.
pub(super) fn solid_transfer(
    ex: &Executor,
    layer: &Layer,
    buf: &DrawBuf,
    area: Area,
    px: Color32,
    opa: Opa,
) -> Result<(), TransferError> {
    let ba = layer.buf_area();
    let (w, h) = (area.width() as u32, area.height() as u32);
    let dest = buf.addr((area.x1 - ba.x1) as u32, (area.y1 - ba.y1) as u32);
    let hdr = buf.header();
    let config = TransferConfig::new(
        None,
        HardwareHeader::solid(w, h, px),
        dest,
        HardwareHeader::new(hdr.cf, w, h, hdr.stride),
        opa,
    );
    ex.transfer(&config)
}

pub(super) fn draw_fill(ex: &Executor, task: &DrawTask, dsc: &FillDsc) -> Result<(), TransferError> {
    let started = Instant::now();
    let layer = task.target();
    if !dsc.opa.is_visible() {
        return Ok(());
    }
    let Some(buf) = layer.draw_buf() else {
        return Ok(());
    };
    let Some(area) = task.area().intersect(task.clip_area()).and_then(|a| a.intersect(layer.buf_area())) else {
        return Ok(());
    };

    let min = ex.config.min_fill_size as u64;
    if area.size() < min * min {
        sw::draw_fill(layer.buf_area(), &buf, task.area(), task.clip_area(), dsc);
        ex.stats.sw_fallback();
        log::trace!(
            "sw fill ({} {} {} {}) opa={} in {:?}",
            area.x1, area.y1, area.width(), area.height(), dsc.opa.0, started.elapsed()
        );
        return Ok(());
    }

    solid_transfer(ex, layer, &buf, area, dsc.color.to_32(dsc.opa), dsc.opa)?;
    ex.stats.fill();
    log::trace!(
        "ppe fill ({} {} {} {}) opa={} in {:?}",
        area.x1, area.y1, area.width(), area.height(), dsc.opa.0, started.elapsed()
    );
    Ok(())
}
