use std::time::Instant;

use crate::draw::DrawTask;
use crate::draw::shapes::LineDsc;

use super::fill::solid_transfer;
use super::transfer::TransferError;
use super::worker::Executor;

/// Axis-aligned line drawn as a constant-color rectangle over its stroke box.
pub(super) fn draw_line(ex: &Executor, task: &DrawTask, dsc: &LineDsc) -> Result<(), TransferError> {
    let started = Instant::now();
    if dsc.width <= 0 || !dsc.opa.is_visible() || dsc.p1 == dsc.p2 {
        return Ok(());
    }

    let layer = task.target();
    let Some(buf) = layer.draw_buf() else {
        return Ok(());
    };
    let Some(area) = dsc.bounds().intersect(task.clip_area()).and_then(|a| a.intersect(layer.buf_area())) else {
        return Ok(());
    };

    solid_transfer(ex, layer, &buf, area, dsc.color.to_32(dsc.opa), dsc.opa)?;
    ex.stats.line();
    log::trace!(
        "ppe line ({} {} {} {}) in {:?}",
        area.x1, area.y1, area.width(), area.height(), started.elapsed()
    );
    Ok(())
}
