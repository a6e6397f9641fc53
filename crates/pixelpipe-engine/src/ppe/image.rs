use std::time::Instant;

use crate::coords::Area;
use crate::draw::shapes::{ImageStyle, SCALE_NONE};
use crate::draw::{DrawBuf, DrawTask};
use crate::paint::{ColorFormat, Opa};

use super::transfer::{HardwareHeader, TransferConfig, TransferError};
use super::worker::Executor;

/// Converts an 8.8 fixed-point scale into the factor the hardware is given.
///
/// The value is quantized through the reciprocal, the same way the scaler
/// stores it.
pub(super) fn scale_factor(scale: u32) -> f32 {
    if scale == SCALE_NONE {
        return 1.0;
    }
    let reciprocal = (65536 / scale.max(1)).max(1);
    65536.0 / reciprocal as f32 / SCALE_NONE as f32
}

/// Opacity handed to the engine for an image.
///
/// An image with alpha on a layer that still receives tasks is composited
/// over the background (transparent opacity selects the two-layer path).
/// Otherwise the requested opacity is used, promoted to cover when opaque.
pub(super) fn image_opa(cf: ColorFormat, all_tasks_added: bool, opa: Opa) -> Opa {
    if cf.has_alpha() && !all_tasks_added {
        Opa::TRANSP
    } else if opa < Opa::MAX {
        opa
    } else {
        Opa::COVER
    }
}

/// Draws `src` at the task area, repeated over it when tiling.
pub(super) fn draw_image(
    ex: &Executor,
    task: &DrawTask,
    src: &DrawBuf,
    style: &ImageStyle,
) -> Result<(), TransferError> {
    if !style.opa.is_visible() || style.scale_x == 0 || style.scale_y == 0 {
        return Ok(());
    }
    let coords = task.area();
    if !style.tile {
        return draw_core(ex, task, src, style, coords);
    }

    let h = src.header();
    if h.w == 0 || h.h == 0 {
        return Ok(());
    }
    let mut y = coords.y1;
    while y <= coords.y2 {
        let mut x = coords.x1;
        while x <= coords.x2 {
            let tile = Area::from_origin_size(x, y, h.w as i32, h.h as i32);
            draw_core(ex, task, src, style, tile)?;
            x += h.w as i32;
        }
        y += h.h as i32;
    }
    Ok(())
}

fn draw_core(
    ex: &Executor,
    task: &DrawTask,
    src: &DrawBuf,
    style: &ImageStyle,
    img_coords: Area,
) -> Result<(), TransferError> {
    let started = Instant::now();
    let layer = task.target();
    let Some(buf) = layer.draw_buf() else {
        return Ok(());
    };
    let ba = layer.buf_area();
    let Some(blend) = img_coords
        .intersect(task.clip_area())
        .and_then(|a| a.intersect(ba))
    else {
        return Ok(());
    };

    let sh = src.header();
    let (img_w, img_h) = (blend.width() as u32, blend.height() as u32);
    let scale_x = scale_factor(style.scale_x);
    let scale_y = scale_factor(style.scale_y);
    let scaled_w = (img_w as f32 * scale_x) as u32;
    let scaled_h = (img_h as f32 * scale_y) as u32;

    let src_addr = src.addr((blend.x1 - img_coords.x1) as u32, (blend.y1 - img_coords.y1) as u32);
    let (dx, dy) = ((blend.x1 - ba.x1) as u32, (blend.y1 - ba.y1) as u32);
    let dest = buf.addr(dx, dy);

    let angle = (style.rotation / 10).rem_euclid(360) as u32;
    let (target_w, target_h) = (img_w.max(scaled_w), img_h.max(scaled_h));
    let (out_w, out_h) = if matches!(angle, 90 | 270) {
        (target_h, target_w)
    } else {
        (target_w, target_h)
    };
    let bh = buf.header();
    let out_w = out_w.min(bh.w.saturating_sub(dx));
    let out_h = out_h.min(bh.h.saturating_sub(dy));

    let src_header = HardwareHeader {
        min_x: if scale_x < 1.0 { (img_w - scaled_w) / 2 } else { 0 },
        min_y: if scale_y < 1.0 { (img_h - scaled_h) / 2 } else { 0 },
        ..HardwareHeader::new(sh.cf, img_w, img_h, sh.stride)
    };
    let opa = image_opa(sh.cf, layer.all_tasks_added(), style.opa);

    let config = TransferConfig {
        scale_x,
        scale_y,
        angle,
        ..TransferConfig::new(
            Some(src_addr),
            src_header,
            dest,
            HardwareHeader::new(bh.cf, out_w, out_h, bh.stride),
            opa,
        )
    };
    ex.transfer(&config)?;

    log::trace!(
        "ppe image ({} {} {} {}) cf={:?} opa={} in {:?}",
        blend.x1, blend.y1, out_w, out_h, sh.cf, opa.0, started.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factors_follow_quantized_reciprocal() {
        assert_eq!(scale_factor(SCALE_NONE), 1.0);
        assert_eq!(scale_factor(128), 0.5);
        assert_eq!(scale_factor(512), 2.0);
        // 65536 / 200 = 327 → 65536 / 327 / 256
        assert!((scale_factor(200) - 0.782_874_6).abs() < 1e-4);
    }

    #[test]
    fn opacity_selection() {
        assert_eq!(image_opa(ColorFormat::Argb8888, false, Opa::COVER), Opa::TRANSP);
        assert_eq!(image_opa(ColorFormat::Argb8888, true, Opa::COVER), Opa::COVER);
        assert_eq!(image_opa(ColorFormat::Rgb565, false, Opa::HALF), Opa::HALF);
        assert_eq!(image_opa(ColorFormat::Rgb565, false, Opa(254)), Opa::COVER);
    }
}
