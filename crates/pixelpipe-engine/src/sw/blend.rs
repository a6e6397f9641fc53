use crate::coords::{Area, Point};
use crate::draw::DrawBuf;
use crate::paint::{Color32, ColorFormat, Opa};

/// `area` (screen coordinates) in buffer coordinates, clipped to the buffer.
fn to_local(buf_area: Area, buf: &DrawBuf, area: Area) -> Option<Area> {
    let h = buf.header();
    area.translate(-buf_area.x1, -buf_area.y1)
        .intersect(Area::from_origin_size(0, 0, h.w as i32, h.h as i32))
}

#[inline]
fn scale_alpha(a: u8, opa: u8) -> u8 {
    ((a as u32 * opa as u32 + 127) / 255) as u8
}

#[inline]
fn blend_px(cf: ColorFormat, bytes: &mut [u8], px: Color32) {
    match px.a {
        0 => {}
        255 => cf.write(bytes, px),
        _ => {
            let under = cf.read(bytes);
            cf.write(bytes, px.over(under));
        }
    }
}

/// Blends `px` over every pixel of `area`.
///
/// `buf_area` is the screen area the buffer covers.
pub fn fill_area(buf_area: Area, buf: &DrawBuf, area: Area, px: Color32) {
    let Some(local) = to_local(buf_area, buf, area) else {
        return;
    };
    let h = buf.header();
    let bpp = h.cf.bytes_per_pixel();
    let mut data = buf.write();
    for y in local.y1..=local.y2 {
        for x in local.x1..=local.x2 {
            let off = h.offset_of(x as u32, y as u32);
            blend_px(h.cf, &mut data[off..off + bpp], px);
        }
    }
}

/// Overwrites every pixel of `area` with transparent black.
pub fn clear_area(buf_area: Area, buf: &DrawBuf, area: Area) {
    let Some(local) = to_local(buf_area, buf, area) else {
        return;
    };
    let h = buf.header();
    let bpp = h.cf.bytes_per_pixel();
    let mut data = buf.write();
    for y in local.y1..=local.y2 {
        for x in local.x1..=local.x2 {
            let off = h.offset_of(x as u32, y as u32);
            h.cf.write(&mut data[off..off + bpp], Color32::transparent());
        }
    }
}

/// Untransformed image copy.
#[derive(Debug, Clone, Copy)]
pub struct Blit<'a> {
    pub src: &'a DrawBuf,
    /// Screen position of the source's top-left pixel.
    pub origin: Point,
    pub opa: Opa,
    /// Per-pixel coverage taken from the mask's alpha, aligned with `src`.
    pub mask: Option<&'a DrawBuf>,
}

/// Blends `blit.src` into the part of `area` it covers.
pub fn blit(buf_area: Area, buf: &DrawBuf, area: Area, blit: &Blit<'_>) {
    let sh = blit.src.header();
    let src_area = Area::from_origin_size(blit.origin.x, blit.origin.y, sh.w as i32, sh.h as i32);
    let Some(area) = area.intersect(src_area) else {
        return;
    };
    let Some(local) = to_local(buf_area, buf, area) else {
        return;
    };

    // The source may alias the destination; copy it before locking for write.
    let src = blit.src.read().clone();
    let mask = blit.mask.map(|m| (m.header(), m.read().clone()));

    let h = buf.header();
    let bpp = h.cf.bytes_per_pixel();
    let mut data = buf.write();
    for y in local.y1..=local.y2 {
        for x in local.x1..=local.x2 {
            let sx = (x + buf_area.x1 - blit.origin.x) as u32;
            let sy = (y + buf_area.y1 - blit.origin.y) as u32;
            let soff = sh.offset_of(sx, sy);
            let Some(bytes) = src.get(soff..soff + sh.cf.bytes_per_pixel()) else {
                continue;
            };
            let mut px = sh.cf.read(bytes);
            px.a = scale_alpha(px.a, blit.opa.0);

            if let Some((mh, mdata)) = &mask {
                if sx >= mh.w || sy >= mh.h {
                    continue;
                }
                let moff = mh.offset_of(sx, sy);
                let coverage = mdata
                    .get(moff..moff + mh.cf.bytes_per_pixel())
                    .map_or(0, |b| mh.cf.read(b).a);
                px.a = scale_alpha(px.a, coverage);
            }

            let off = h.offset_of(x as u32, y as u32);
            blend_px(h.cf, &mut data[off..off + bpp], px);
        }
    }
}
