use std::time::Instant;

use crate::draw::DrawTask;
use crate::draw::shapes::MaskRectDsc;
use crate::paint::{Color32, Opa};

use super::fill::solid_transfer;
use super::transfer::TransferError;
use super::worker::Executor;

/// Clears everything in the clip area outside the mask rectangle, one opaque
/// transparent-black transfer per band.
pub(super) fn draw_mask_rect(ex: &Executor, task: &DrawTask, dsc: &MaskRectDsc) -> Result<(), TransferError> {
    let started = Instant::now();
    let clip = task.clip_area();
    if dsc.area.intersect(clip).is_none() {
        return Ok(());
    }

    let layer = task.target();
    let Some(buf) = layer.draw_buf() else {
        return Ok(());
    };

    let mut bands = 0;
    for band in dsc.clear_bands(clip) {
        let Some(band) = band.intersect(layer.buf_area()) else {
            continue;
        };
        solid_transfer(ex, layer, &buf, band, Color32::transparent(), Opa::COVER)?;
        bands += 1;
    }

    ex.stats.mask();
    log::trace!("ppe mask ({:?}) {bands} bands in {:?}", dsc.area, started.elapsed());
    Ok(())
}
