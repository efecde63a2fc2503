use std::io::SeekFrom;

use alloc::format;
use alloc::vec::Vec;

use enough::{Stop, Unstoppable};
use tracing::{debug, trace};

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::channel::ChannelLayout;
use crate::codec::{Codec, RuntimeGuard};
use crate::color;
use crate::error::{Jp2Error, Operation};
use crate::limits::Limits;
use crate::native::{NativeImage, MAX_COMPONENTS};
use crate::pixel::PixelLayout;
use crate::plane;
use crate::resolution::{self, PhysicalResolution};
use crate::stream::ByteStream;

/// Decode configuration.
///
/// ```no_run
/// # fn run(codec: &impl zenjp2::Codec, bytes: &[u8]) -> Result<(), zenjp2::Jp2Error> {
/// use std::io::Cursor;
/// use zenjp2::{DecodeRequest, Limits};
///
/// let limits = Limits { max_pixels: Some(100_000_000), ..Default::default() };
/// let decoded = DecodeRequest::new()
///     .with_limits(&limits)
///     .decode(codec, &mut Cursor::new(bytes))?;
/// println!("{}x{} {:?}", decoded.width, decoded.height, decoded.layout);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct DecodeRequest<'a> {
    limits: Option<&'a Limits>,
    stop: &'a dyn Stop,
}

impl Default for DecodeRequest<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> DecodeRequest<'a> {
    pub fn new() -> Self {
        Self {
            limits: None,
            stop: &Unstoppable,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Cancellation token, polled every 16 rows.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = stop;
        self
    }

    /// Decode an encoded stream through `codec`.
    ///
    /// The codec runtime is initialized for the duration of the call and torn
    /// down on every exit path.
    pub fn decode<C: Codec + ?Sized>(
        &self,
        codec: &C,
        stream: &mut dyn ByteStream,
    ) -> Result<DecodeOutput, Jp2Error> {
        let runtime = RuntimeGuard::new(codec)?;
        let codec = runtime.codec();

        let format = codec
            .detect_format(stream)
            .ok_or_else(|| Jp2Error::UnknownFormat("unrecognized JPEG 2000 stream".into()))?;
        debug!(format = format.name(), "detected format");
        stream
            .seek(SeekFrom::Start(0))
            .map_err(|e| Jp2Error::DecodeFailure(format!("rewind failed: {e}")))?;

        let image = codec.decode(stream, format).map_err(|e| match e {
            Jp2Error::OutOfMemory(_) | Jp2Error::Cancelled(_) | Jp2Error::DecodeFailure(_) => e,
            other => Jp2Error::DecodeFailure(format!("{other}")),
        })?;
        self.decode_image(image)
    }

    /// Assemble an interleaved 8-bit buffer from an already decoded image.
    pub fn decode_image(&self, mut image: NativeImage) -> Result<DecodeOutput, Jp2Error> {
        let resolution = resolution::extract(image.capture_resolution());

        color::ensure_profile(&mut image)?;

        let count = image.num_components();
        if count > MAX_COMPONENTS {
            return Err(Jp2Error::TooManyComponents {
                count,
                max: MAX_COMPONENTS,
            });
        }

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Jp2Error::DecodeFailure(format!(
                "empty image grid {width}x{height}"
            )));
        }
        if let Some(limits) = self.limits {
            limits.check(Operation::Decode, width, height)?;
        }

        let image = color::normalize(image)?;
        let layout = ChannelLayout::for_image(&image)?;
        let channels = layout.channel_count();
        let pixel_layout = PixelLayout::for_decoded(channels)
            .ok_or_else(|| Jp2Error::UnknownFormat(format!("{channels} output channels")))?;

        let size = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(Jp2Error::DimensionsTooLarge { width, height })?;
        if let Some(limits) = self.limits {
            limits.check_output_buffer(size, channels)?;
        }
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(size)
            .map_err(|_| Jp2Error::OutOfMemory(format!("{size}-byte output buffer")))?;
        pixels.resize(size, 0);

        plane::read_planes(&image, &layout, &mut pixels, self.stop)?;
        trace!(width, height, channels, "planes read");

        Ok(DecodeOutput {
            pixels,
            width,
            height,
            layout: pixel_layout,
            has_alpha: layout.has_alpha(),
            resolution,
        })
    }
}

/// Decoded image: owned interleaved pixels plus metadata.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// `Rgb8`, `Rgba8`, `Gray8` or `GrayAlpha8`.
    pub layout: PixelLayout,
    pub has_alpha: bool,
    /// Capture resolution, or [`PhysicalResolution::UNKNOWN`].
    pub resolution: PhysicalResolution,
}

impl DecodeOutput {
    /// Access the pixel data. Rows are tightly packed.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the pixel data.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Interleaved channels per pixel; 0 after [`release`](Self::release).
    pub fn channels(&self) -> usize {
        if self.pixels.is_empty() {
            0
        } else {
            self.layout.channels()
        }
    }

    /// Free the pixel buffer and zero the metadata. Calling it again is a no-op.
    pub fn release(&mut self) {
        self.pixels = Vec::new();
        self.width = 0;
        self.height = 0;
        self.has_alpha = false;
        self.resolution = PhysicalResolution::UNKNOWN;
    }

    /// Expand to blue-first 4-byte pixels, the layout 32-bit host surfaces
    /// use. Alpha is 255 where the image has none.
    pub fn to_bgra8(&self) -> Vec<u8> {
        let channels = self.channels();
        if channels == 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.pixels.len() / channels * 4);
        for px in self.pixels.chunks_exact(channels) {
            let bgra = match self.layout {
                PixelLayout::Gray8 => [px[0], px[0], px[0], 255],
                PixelLayout::GrayAlpha8 => [px[0], px[0], px[0], px[1]],
                PixelLayout::Rgb8 => [px[2], px[1], px[0], 255],
                PixelLayout::Rgba8 => [px[2], px[1], px[0], px[3]],
                PixelLayout::Bgr8 => [px[0], px[1], px[2], 255],
                PixelLayout::Bgra8 => [px[0], px[1], px[2], px[3]],
                PixelLayout::Bgrx8 => [px[0], px[1], px[2], 255],
            };
            out.extend_from_slice(&bgra);
        }
        out
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`Jp2Error::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], Jp2Error>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if self.layout != P::layout() {
            return Err(Jp2Error::LayoutMismatch {
                expected: P::layout(),
                actual: self.layout,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, Jp2Error>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(&self) -> Result<imgref::ImgVec<P>, Jp2Error>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}
