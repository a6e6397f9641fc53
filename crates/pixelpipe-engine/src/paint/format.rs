use super::Color32;

/// Pixel formats exchanged between layers, images and the panel.
///
/// `Rgb565` and `Rgb888` carry no alpha and can be transformed by the
/// accelerator. The 32-bit formats are only blitted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ColorFormat {
    Rgb565,
    Rgb888,
    Xrgb8888,
    Argb8888,
}

impl ColorFormat {
    #[inline]
    pub const fn bpp(self) -> u32 {
        match self {
            ColorFormat::Rgb565 => 16,
            ColorFormat::Rgb888 => 24,
            ColorFormat::Xrgb8888 | ColorFormat::Argb8888 => 32,
        }
    }

    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        (self.bpp() / 8) as usize
    }

    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, ColorFormat::Argb8888)
    }

    /// Decodes one pixel from the start of `bytes`.
    ///
    /// Formats without alpha decode as fully opaque.
    pub fn read(self, bytes: &[u8]) -> Color32 {
        match self {
            ColorFormat::Rgb565 => {
                let v: u16 = bytemuck::pod_read_unaligned(&bytes[..2]);
                let r = ((v >> 11) & 0x1f) as u8;
                let g = ((v >> 5) & 0x3f) as u8;
                let b = (v & 0x1f) as u8;
                Color32::new(r << 3 | r >> 2, g << 2 | g >> 4, b << 3 | b >> 2, 0xff)
            }
            ColorFormat::Rgb888 => Color32::new(bytes[2], bytes[1], bytes[0], 0xff),
            ColorFormat::Xrgb8888 => {
                let px: Color32 = bytemuck::pod_read_unaligned(&bytes[..4]);
                Color32 { a: 0xff, ..px }
            }
            ColorFormat::Argb8888 => bytemuck::pod_read_unaligned(&bytes[..4]),
        }
    }

    /// Encodes one pixel at the start of `bytes`.
    pub fn write(self, bytes: &mut [u8], px: Color32) {
        match self {
            ColorFormat::Rgb565 => {
                let v: u16 = (px.r as u16 >> 3) << 11 | (px.g as u16 >> 2) << 5 | px.b as u16 >> 3;
                bytes[..2].copy_from_slice(bytemuck::bytes_of(&v.to_le()));
            }
            ColorFormat::Rgb888 => {
                bytes[0] = px.b;
                bytes[1] = px.g;
                bytes[2] = px.r;
            }
            ColorFormat::Xrgb8888 => {
                bytes[..4].copy_from_slice(bytemuck::bytes_of(&Color32 { a: 0xff, ..px }));
            }
            ColorFormat::Argb8888 => bytes[..4].copy_from_slice(bytemuck::bytes_of(&px)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(cf: ColorFormat, px: Color32) -> Color32 {
        let mut buf = [0u8; 4];
        cf.write(&mut buf, px);
        cf.read(&buf)
    }

    #[test]
    fn rgb565_keeps_primaries() {
        let red = Color32::new(0xff, 0, 0, 0xff);
        assert_eq!(round_trip(ColorFormat::Rgb565, red), red);
    }

    #[test]
    fn rgb565_little_endian_layout() {
        let mut buf = [0u8; 2];
        ColorFormat::Rgb565.write(&mut buf, Color32::new(0xff, 0, 0, 0xff));
        assert_eq!(buf, [0x00, 0xf8]);
    }

    #[test]
    fn rgb888_stores_bgr() {
        let mut buf = [0u8; 3];
        ColorFormat::Rgb888.write(&mut buf, Color32::new(1, 2, 3, 0xff));
        assert_eq!(buf, [3, 2, 1]);
    }

    #[test]
    fn alpha_only_survives_argb() {
        let px = Color32::new(10, 20, 30, 40);
        assert_eq!(round_trip(ColorFormat::Argb8888, px), px);
        assert_eq!(round_trip(ColorFormat::Xrgb8888, px).a, 0xff);
        assert_eq!(round_trip(ColorFormat::Rgb888, px).a, 0xff);
    }

    #[test]
    fn sizes() {
        assert_eq!(ColorFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(ColorFormat::Rgb888.bytes_per_pixel(), 3);
        assert_eq!(ColorFormat::Argb8888.bytes_per_pixel(), 4);
        assert!(ColorFormat::Argb8888.has_alpha());
        assert!(!ColorFormat::Xrgb8888.has_alpha());
    }
}
