use alloc::format;
use alloc::vec;

use enough::{Stop, Unstoppable};
use tracing::{debug, trace};

use crate::channel::{encode_roles, source_offsets};
use crate::codec::{Codec, CodecOptions, ImageFormat, RuntimeGuard};
use crate::error::{Jp2Error, Operation};
use crate::limits::Limits;
use crate::native::{ColorSpace, ComponentParams, NativeImage};
use crate::pixel::PixelLayout;
use crate::plane;
use crate::resolution::{self, PhysicalResolution};
use crate::stream::ByteStream;

/// Encode configuration.
///
/// Source pixels are read blue-first (`Bgr8`, `Bgra8`, `Bgrx8`) or as `Gray8`.
/// `channels` picks how many components are written: 1 (gray, taken from the
/// first byte of each pixel), 3 (RGB) or 4 (RGBA).
///
/// ```no_run
/// # fn run(codec: &impl zenjp2::Codec, bgra: &[u8]) -> Result<(), zenjp2::Jp2Error> {
/// use std::io::Cursor;
/// use zenjp2::{EncodeRequest, PhysicalResolution, PixelLayout};
///
/// let mut out = Vec::new();
/// EncodeRequest::new(3)
///     .with_quality(90)
///     .with_resolution(PhysicalResolution::from_dpi(300.0, 300.0))
///     .encode(codec, &mut Cursor::new(&mut out), bgra, 64, 64, 256, PixelLayout::Bgra8)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct EncodeRequest<'a> {
    channels: usize,
    quality: u8,
    resolution: PhysicalResolution,
    limits: Option<&'a Limits>,
    stop: &'a dyn Stop,
}

impl<'a> EncodeRequest<'a> {
    /// Lossless, no resolution record.
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            quality: 100,
            resolution: PhysicalResolution::UNKNOWN,
            limits: None,
            stop: &Unstoppable,
        }
    }

    /// 0..=100; 100 selects lossless coding.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Physical resolution to record. Non-positive values write no record.
    pub fn with_resolution(mut self, resolution: PhysicalResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = stop;
        self
    }

    /// Split interleaved pixels into an 8-bit planar image ready for a codec.
    pub fn build_image(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
    ) -> Result<NativeImage, Jp2Error> {
        if width == 0 || height == 0 {
            return Err(Jp2Error::InvalidInput(format!(
                "cannot encode an empty {width}x{height} image"
            )));
        }
        if self.quality > 100 {
            return Err(Jp2Error::InvalidInput(format!(
                "quality {} outside 0..=100",
                self.quality
            )));
        }
        let (offsets, roles) = source_offsets(self.channels)
            .zip(encode_roles(self.channels))
            .ok_or_else(|| {
                Jp2Error::InvalidInput(format!("cannot encode {} channels", self.channels))
            })?;
        if layout != PixelLayout::Gray8 && !layout.is_bgr() {
            return Err(Jp2Error::InvalidInput(format!(
                "{layout:?} source; expected a blue-first or gray layout"
            )));
        }
        if self.channels > layout.channels() || (self.channels == 4 && !layout.has_alpha()) {
            return Err(Jp2Error::InvalidInput(format!(
                "{layout:?} source cannot supply {} channels",
                self.channels
            )));
        }
        if let Some(limits) = self.limits {
            limits.check(Operation::Encode, width, height)?;
        }

        let bpp = layout.bytes_per_pixel();
        let row_bytes = (width as usize)
            .checked_mul(bpp)
            .ok_or(Jp2Error::DimensionsTooLarge { width, height })?;
        if stride < row_bytes {
            return Err(Jp2Error::InvalidInput(format!(
                "stride {stride} shorter than a {row_bytes}-byte row"
            )));
        }
        let needed = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or(Jp2Error::DimensionsTooLarge { width, height })?;
        if pixels.len() < needed {
            return Err(Jp2Error::BufferTooSmall {
                needed,
                actual: pixels.len(),
            });
        }

        let params = vec![ComponentParams::unsigned8(width, height); self.channels];
        let mut image = NativeImage::new(&params, ColorSpace::Unknown)?;
        image.set_color_space(if self.channels == 1 {
            ColorSpace::Sgray
        } else {
            ColorSpace::Srgb
        });
        for (index, role) in roles.iter().enumerate() {
            image.set_component_type(index, role.component_type())?;
        }

        plane::write_planes(&mut image, pixels, stride, bpp, offsets, self.stop)?;
        trace!(width, height, channels = self.channels, "planes written");

        image.set_capture_resolution(resolution::synthesize(self.resolution));
        Ok(image)
    }

    /// Build the image and hand it to `codec` as JP2, written to `stream`.
    #[allow(clippy::too_many_arguments)]
    pub fn encode<C: Codec + ?Sized>(
        &self,
        codec: &C,
        stream: &mut dyn ByteStream,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
    ) -> Result<(), Jp2Error> {
        let runtime = RuntimeGuard::new(codec)?;
        let image = self.build_image(pixels, width, height, stride, layout)?;

        let options = CodecOptions::from_quality(self.quality);
        debug!(
            quality = self.quality,
            options = %options.to_option_string(),
            "encoding"
        );
        runtime
            .codec()
            .encode(&image, stream, ImageFormat::Jp2, &options)
            .map_err(|e| match e {
                Jp2Error::OutOfMemory(_) | Jp2Error::Cancelled(_) | Jp2Error::EncodeFailure(_) => e,
                other => Jp2Error::EncodeFailure(format!("{other}")),
            })?;
        stream
            .flush()
            .map_err(|e| Jp2Error::EncodeFailure(format!("flush failed: {e}")))
    }
}
