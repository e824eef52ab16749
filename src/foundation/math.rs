pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Convert HSL (hue in degrees, saturation and lightness in `[0, 1]`) to 8-bit RGB.
pub(crate) fn hsl_to_rgb8(hue_deg: f64, saturation: f64, lightness: f64) -> [u8; 3] {
    let h = hue_deg.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;

    let to_u8 = |c: f64| -> u8 { ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8 };
    [to_u8(r1), to_u8(g1), to_u8(b1)]
}
