//! Normalized colors and the packed BGR representation used on disk and by
//! the lighting backend.

/// Normalized RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    /// Opaque color from normalized channels.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Decode a packed `0x00BBGGRR` value. The high byte is ignored.
    pub fn from_packed(packed: i32) -> Self {
        let v = packed as u32;
        Self::from_rgb8(
            (v & 0xFF) as u8,
            ((v >> 8) & 0xFF) as u8,
            ((v >> 16) & 0xFF) as u8,
        )
    }

    /// Encode as packed `0x00BBGGRR`. Alpha is dropped.
    pub fn to_packed(self) -> i32 {
        let r = channel_to_u8(self.r) as i32;
        let g = channel_to_u8(self.g) as i32;
        let b = channel_to_u8(self.b) as i32;
        r | (g << 8) | (b << 16)
    }

    /// 8-bit channels `(r, g, b)`.
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        (
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
        )
    }

    /// True when every channel packs to zero.
    pub fn is_black(self) -> bool {
        self.to_packed() == 0
    }
}

#[inline]
fn channel_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
