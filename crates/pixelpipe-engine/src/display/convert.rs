/// Swaps the red and blue channels of packed 24-bit pixels.
///
/// Converts `min(src.len(), dst.len()) / 3` pixels; a trailing partial pixel
/// is left untouched.
pub fn convert_rgb888_to_bgr888(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
    }
}
