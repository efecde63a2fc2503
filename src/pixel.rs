/// Interleaved 8-bit pixel memory layout.
///
/// Decoding produces `Gray8`, `GrayAlpha8`, `Rgb8` or `Rgba8`. Encoder sources
/// are read in blue-first order, so they are described by the `Bgr*` layouts
/// (or `Gray8`).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Single channel grayscale.
    Gray8,
    /// Grayscale followed by alpha.
    GrayAlpha8,
    /// 3 channels, R G B.
    Rgb8,
    /// 4 channels, R G B A.
    Rgba8,
    /// 3 channels, B G R.
    Bgr8,
    /// 4 channels, B G R A.
    Bgra8,
    /// 4 channels, B G R X (opaque; 4th byte is padding, not alpha).
    Bgrx8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::GrayAlpha8 => 2,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 | Self::Bgrx8 => 4,
        }
    }

    /// Number of meaningful channels. `Bgrx8` counts its padding byte.
    pub fn channels(&self) -> usize {
        self.bytes_per_pixel()
    }

    /// Whether the layout carries real alpha.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::GrayAlpha8 | Self::Rgba8 | Self::Bgra8)
    }

    /// Whether color layouts store blue first.
    pub fn is_bgr(&self) -> bool {
        matches!(self, Self::Bgr8 | Self::Bgra8 | Self::Bgrx8)
    }

    /// Layout of decoded output with the given channel count.
    pub(crate) fn for_decoded(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::Gray8),
            2 => Some(Self::GrayAlpha8),
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

}

/// Pixel types a [`DecodeOutput`](crate::DecodeOutput) can be viewed as.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy + 'static {
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGB<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::RGBA<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::Gray<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Gray8
    }
}
