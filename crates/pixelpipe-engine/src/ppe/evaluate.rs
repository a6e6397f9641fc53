use crate::draw::shapes::{ImageStyle, LineDsc};
use crate::draw::{BufHeader, DrawTask, DrawTaskKind, Evaluation};
use crate::paint::{BlendMode, ColorFormat, GradDir};

use super::{BLOCK_ALIGN, PPE_UNIT_ID, PpeConfig};

/// Formats the accelerator can read as a transformable source.
#[inline]
fn src_format_supported(cf: ColorFormat) -> bool {
    matches!(cf, ColorFormat::Rgb565 | ColorFormat::Rgb888)
}

/// Whether an image (or layer composite) with `header` and `style` can be
/// drawn by the accelerator.
pub fn image_supported(style: &ImageStyle, header: BufHeader) -> bool {
    let transform = style.has_transform();
    if transform && style.has_recolor() {
        return false;
    }
    if header.w < BLOCK_ALIGN || header.h < BLOCK_ALIGN {
        return false;
    }
    if style.rotation % 900 != 0 {
        return false;
    }
    if style.blend_mode != BlendMode::Normal {
        return false;
    }
    if transform && (header.w % BLOCK_ALIGN != 0 || header.h % BLOCK_ALIGN != 0) {
        return false;
    }
    src_format_supported(header.cf)
}

/// Whether `line` is a plain horizontal or vertical stroke of at least
/// `min_len` pixels.
pub fn line_supported(line: &LineDsc, min_len: i32) -> bool {
    if line.round_start || line.round_end || line.dash_gap > 0 {
        return false;
    }
    if !line.is_axis_aligned() {
        return false;
    }
    let h_len = (line.p2.x - line.p1.x).abs();
    let v_len = (line.p2.y - line.p1.y).abs();
    !((h_len > 0 && h_len < min_len) || (v_len > 0 && v_len < min_len))
}

/// Decides whether the accelerator can draw `task` and, if so, bids for it.
///
/// Accepted tasks scoring worse than the ceiling are claimed for the
/// accelerator at the ceiling score. A unit that already bid lower keeps the task.
pub fn evaluate(task: &DrawTask, config: &PpeConfig) -> Evaluation {
    let supported = match task.kind() {
        DrawTaskKind::Fill(dsc) => dsc.radius == 0 && dsc.grad == GradDir::None,
        DrawTaskKind::Image(dsc) => image_supported(&dsc.style, dsc.src.header()),
        DrawTaskKind::Layer(dsc) => image_supported(&dsc.style, dsc.src.buf_header()),
        DrawTaskKind::Line(dsc) => line_supported(dsc, config.min_fill_size as i32),
        DrawTaskKind::MaskRect(dsc) => dsc.radius == 0,
        DrawTaskKind::Border(_) | DrawTaskKind::Label(_) => false,
    };

    if !supported {
        log::trace!("ppe: task {} ({}) rejected", task.id().0, task.kind().name());
        return Evaluation::Rejected;
    }

    task.offer(PPE_UNIT_ID, config.preference_ceiling);
    Evaluation::Accepted { score: task.preference().score }
}
