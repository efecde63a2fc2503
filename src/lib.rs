//! # zenjp2
//!
//! Pixel assembly for JPEG 2000: turns a codec's planar, multi-precision
//! image into one interleaved 8-bit buffer, and interleaved pixels back into
//! planes for encoding.
//!
//! The codec itself (box parsing, wavelet and entropy coding) stays behind the
//! [`Codec`] trait. This crate handles everything between that planar
//! representation and the host:
//!
//! - component-to-channel mapping, with alpha detection
//! - bit-depth reduction to 8 bits (truncating shift)
//! - forced conversion of 8-bit color images with an embedded profile to sRGB
//! - physical resolution metadata in both directions
//!
//! ## Channel order
//!
//! Decoding produces RGB[A] or Gray[A]. Encoding reads BGR[A] sources, the
//! native order of 32-bit host surfaces. Use [`DecodeOutput::to_bgra8`] to go
//! from one to the other.
//!
//! ## Usage
//!
//! ```no_run
//! # fn run(codec: &impl zenjp2::Codec) -> Result<(), zenjp2::Jp2Error> {
//! use std::io::Cursor;
//! use zenjp2::{DecodeRequest, EncodeRequest, PixelLayout};
//!
//! let data: &[u8] = &[]; // your JP2 bytes
//! let decoded = DecodeRequest::new().decode(codec, &mut Cursor::new(data))?;
//! println!("{}x{} alpha={}", decoded.width, decoded.height, decoded.has_alpha);
//!
//! let bgra = decoded.to_bgra8();
//! let mut encoded = Vec::new();
//! EncodeRequest::new(if decoded.has_alpha { 4 } else { 3 })
//!     .with_quality(100)
//!     .with_resolution(decoded.resolution)
//!     .encode(
//!         codec,
//!         &mut Cursor::new(&mut encoded),
//!         &bgra,
//!         decoded.width,
//!         decoded.height,
//!         decoded.width as usize * 4,
//!         PixelLayout::Bgra8,
//!     )?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

extern crate alloc;

mod error;
mod limits;
mod pixel;

pub mod channel;
pub mod codec;
pub mod color;
pub mod native;
pub mod plane;
pub mod resolution;
pub mod stream;

mod decode;
mod encode;
mod info;

// Re-exports
pub use codec::{Codec, CodecOptions, ImageFormat, RuntimeGuard};
pub use decode::{DecodeOutput, DecodeRequest};
pub use encode::EncodeRequest;
pub use enough::{Stop, Unstoppable};
pub use error::{Jp2Error, Operation, Status};
pub use info::ImageSummary;
pub use limits::Limits;
pub use native::{
    ColorFamily, ColorSpace, Component, ComponentParams, ComponentType, NativeImage, Plane,
    MAX_COMPONENTS,
};
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::PixelLayout;
pub use resolution::{PhysicalResolution, ResolutionRecord};
pub use stream::{ByteStream, CallbackStream};
