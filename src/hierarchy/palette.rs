use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Lightens the color by `(1 / 0.7)^k`, clamping each channel.
    pub fn brighter(self, k: f32) -> Self {
        let factor = (1.0_f32 / 0.7).powf(k);
        let scale = |channel: u8| (channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const CATEGORY10: [Rgb; 10] = [
    Rgb::from_hex(0x1f77b4),
    Rgb::from_hex(0xff7f0e),
    Rgb::from_hex(0x2ca02c),
    Rgb::from_hex(0xd62728),
    Rgb::from_hex(0x9467bd),
    Rgb::from_hex(0x8c564b),
    Rgb::from_hex(0xe377c2),
    Rgb::from_hex(0x7f7f7f),
    Rgb::from_hex(0xbcbd22),
    Rgb::from_hex(0x17becf),
];

/// Categorical color for an ordinal position, repeating every ten entries.
pub fn palette_color(ordinal: usize) -> Rgb {
    CATEGORY10[ordinal % CATEGORY10.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles_every_ten() {
        assert_eq!(palette_color(0).to_string(), "#1f77b4");
        assert_eq!(palette_color(9).to_string(), "#17becf");
        assert_eq!(palette_color(10), palette_color(0));
        assert_eq!(palette_color(23), palette_color(3));
    }

    #[test]
    fn brighter_scales_and_clamps_channels() {
        let base = palette_color(0);
        let lighter = base.brighter(1.0);
        assert_eq!(lighter, Rgb::new(44, 170, 255));
        assert_eq!(base.brighter(0.0), base);
        assert_eq!(Rgb::new(250, 0, 10).brighter(1.0), Rgb::new(255, 0, 14));
    }
}
