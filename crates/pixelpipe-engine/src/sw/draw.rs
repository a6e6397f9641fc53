use crate::coords::{Area, Point};
use crate::draw::shapes::{BorderDsc, FillDsc, ImageStyle, LineDsc, MaskRectDsc};
use crate::draw::{DrawBuf, DrawTask, DrawTaskKind};
use crate::paint::GradDir;

use super::blend::{self, Blit};

/// Executes `task` on the CPU into `buf`, the target layer's buffer.
pub fn draw_task(task: &DrawTask, buf: &DrawBuf) {
    let layer = task.target();
    let buf_area = layer.buf_area();
    let clip = task.clip_area();

    match task.kind() {
        DrawTaskKind::Fill(dsc) => draw_fill(buf_area, buf, task.area(), clip, dsc),
        DrawTaskKind::Image(dsc) => draw_image(buf_area, buf, task.area(), clip, &dsc.src, &dsc.style),
        DrawTaskKind::Layer(dsc) => match dsc.src.draw_buf() {
            Some(src) => draw_image(buf_area, buf, task.area(), clip, &src, &dsc.style),
            None => log::debug!("sw: layer {} has no buffer, nothing to composite", dsc.src.id().0),
        },
        DrawTaskKind::Line(dsc) => draw_line(buf_area, buf, clip, dsc),
        DrawTaskKind::MaskRect(dsc) => draw_mask_rect(buf_area, buf, clip, dsc),
        DrawTaskKind::Border(dsc) => draw_border(buf_area, buf, task.area(), clip, dsc),
        DrawTaskKind::Label(dsc) => {
            log::debug!("sw: no glyph rasterizer, label {:?} skipped", dsc.text);
        }
    }
}

/// Solid fill of `area` clipped to `clip`.
///
/// Corner radius and gradients are not rasterized here; they degrade to a
/// sharp solid fill.
pub fn draw_fill(buf_area: Area, buf: &DrawBuf, area: Area, clip: Area, dsc: &FillDsc) {
    if !dsc.opa.is_visible() {
        return;
    }
    if dsc.radius != 0 || dsc.grad != GradDir::None {
        log::debug!("sw: radius/gradient fill drawn as a solid rectangle");
    }
    if let Some(area) = area.intersect(clip) {
        blend::fill_area(buf_area, buf, area, dsc.color.to_32(dsc.opa));
    }
}

fn draw_image(buf_area: Area, buf: &DrawBuf, coords: Area, clip: Area, src: &DrawBuf, style: &ImageStyle) {
    if !style.opa.is_visible() {
        return;
    }
    if style.has_transform() {
        log::debug!("sw: image transform not supported, blitting untransformed");
    }
    let Some(area) = coords.intersect(clip) else {
        return;
    };

    let h = src.header();
    let mut origins = vec![coords.origin()];
    if style.tile && h.w > 0 && h.h > 0 {
        origins.clear();
        let (w, hh) = (h.w as i32, h.h as i32);
        let mut y = coords.y1;
        while y <= coords.y2 {
            let mut x = coords.x1;
            while x <= coords.x2 {
                origins.push(Point::new(x, y));
                x += w;
            }
            y += hh;
        }
    }

    for origin in origins {
        let b = Blit {
            src,
            origin,
            opa: style.opa,
            mask: style.bitmap_mask.as_ref(),
        };
        blend::blit(buf_area, buf, area, &b);
    }
}

fn draw_line(buf_area: Area, buf: &DrawBuf, clip: Area, dsc: &LineDsc) {
    if dsc.width <= 0 || !dsc.opa.is_visible() || dsc.p1 == dsc.p2 {
        return;
    }
    let px = dsc.color.to_32(dsc.opa);

    if dsc.is_axis_aligned() {
        if let Some(area) = dsc.bounds().intersect(clip) {
            blend::fill_area(buf_area, buf, area, px);
        }
        return;
    }

    // Diagonal: stamp a width-sized square along the major axis.
    let (dx, dy) = (dsc.p2.x - dsc.p1.x, dsc.p2.y - dsc.p1.y);
    let steps = dx.abs().max(dy.abs());
    let half = dsc.width / 2;
    for i in 0..=steps {
        let x = dsc.p1.x + dx * i / steps;
        let y = dsc.p1.y + dy * i / steps;
        let stamp = Area::new(x - half, y - half, x - half + dsc.width - 1, y - half + dsc.width - 1);
        if let Some(area) = stamp.intersect(clip) {
            blend::fill_area(buf_area, buf, area, px);
        }
    }
}

fn draw_mask_rect(buf_area: Area, buf: &DrawBuf, clip: Area, dsc: &MaskRectDsc) {
    if dsc.area.intersect(clip).is_none() {
        return;
    }
    for band in dsc.clear_bands(clip) {
        blend::clear_area(buf_area, buf, band);
    }
}

fn draw_border(buf_area: Area, buf: &DrawBuf, area: Area, clip: Area, dsc: &BorderDsc) {
    if !dsc.opa.is_visible() {
        return;
    }
    let px = dsc.color.to_32(dsc.opa);
    for strip in dsc.strips(area) {
        if let Some(strip) = strip.intersect(clip) {
            blend::fill_area(buf_area, buf, strip, px);
        }
    }
}
