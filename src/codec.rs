//! Seam to the external JPEG 2000 codec.
//!
//! Container parsing and wavelet coding live behind [`Codec`]. The pipeline
//! asks it to sniff the format, to produce a [`NativeImage`] from a stream and
//! to write one back out.

use alloc::string::String;

use crate::error::Jp2Error;
use crate::native::NativeImage;
use crate::stream::ByteStream;

/// Container format recognized by a codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// JP2 file format (box container).
    Jp2,
    /// Raw JPEG 2000 codestream.
    J2k,
    /// Any other format the codec happens to handle.
    Other(&'static str),
}

impl ImageFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jp2 => "jp2",
            ImageFormat::J2k => "j2k",
            ImageFormat::Other(name) => name,
        }
    }
}

/// Encoder settings passed to [`Codec::encode`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CodecOptions {
    /// Target rate as a fraction of the uncompressed size. `None` is lossless.
    pub rate: Option<f32>,
}

impl CodecOptions {
    /// Options for a 0..=100 quality setting. 100 is lossless.
    pub fn from_quality(quality: u8) -> Self {
        if quality >= 100 {
            Self::lossless()
        } else {
            Self {
                rate: Some(f32::from(quality) / 100.0),
            }
        }
    }

    pub fn lossless() -> Self {
        Self { rate: None }
    }

    pub fn is_lossless(&self) -> bool {
        self.rate.is_none()
    }

    /// Render as a textual option string: `rate=0.950`, or empty when lossless.
    pub fn to_option_string(&self) -> String {
        match self.rate {
            Some(rate) => alloc::format!("rate={rate:.3}"),
            None => String::new(),
        }
    }
}

/// External JPEG 2000 codec.
///
/// `initialize` and `cleanup` bracket every pipeline run; codecs without a
/// process-wide runtime keep the default no-ops.
pub trait Codec {
    fn initialize(&self) -> Result<(), Jp2Error> {
        Ok(())
    }

    fn cleanup(&self) {}

    /// Sniff the container format. The stream is left at an unspecified
    /// position; callers rewind before decoding.
    fn detect_format(&self, stream: &mut dyn ByteStream) -> Option<ImageFormat>;

    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        format: ImageFormat,
    ) -> Result<NativeImage, Jp2Error>;

    fn encode(
        &self,
        image: &NativeImage,
        stream: &mut dyn ByteStream,
        format: ImageFormat,
        options: &CodecOptions,
    ) -> Result<(), Jp2Error>;
}

/// Keeps a codec runtime initialized for its lifetime.
#[must_use]
pub struct RuntimeGuard<'a, C: Codec + ?Sized> {
    codec: &'a C,
}

impl<'a, C: Codec + ?Sized> RuntimeGuard<'a, C> {
    /// Initialize `codec`. Failure is reported as [`Jp2Error::InitFailure`];
    /// no cleanup runs for a runtime that never started.
    pub fn new(codec: &'a C) -> Result<Self, Jp2Error> {
        codec.initialize().map_err(|e| match e {
            e @ Jp2Error::InitFailure(_) => e,
            other => Jp2Error::InitFailure(alloc::format!("{other}")),
        })?;
        tracing::trace!("codec runtime initialized");
        Ok(Self { codec })
    }

    pub fn codec(&self) -> &'a C {
        self.codec
    }
}

impl<C: Codec + ?Sized> Drop for RuntimeGuard<'_, C> {
    fn drop(&mut self) {
        self.codec.cleanup();
        tracing::trace!("codec runtime cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn option_strings() {
        assert_eq!(CodecOptions::from_quality(100).to_option_string(), "");
        assert_eq!(CodecOptions::from_quality(95).to_option_string(), "rate=0.950");
        assert_eq!(CodecOptions::from_quality(0).to_option_string(), "rate=0.000");
        assert!(CodecOptions::from_quality(100).is_lossless());
        assert!(!CodecOptions::from_quality(99).is_lossless());
    }

    #[derive(Default)]
    struct Counting {
        fail_init: bool,
        inits: Cell<u32>,
        cleanups: Cell<u32>,
    }

    impl Codec for Counting {
        fn initialize(&self) -> Result<(), Jp2Error> {
            self.inits.set(self.inits.get() + 1);
            if self.fail_init {
                Err(Jp2Error::DecodeFailure("no runtime".into()))
            } else {
                Ok(())
            }
        }

        fn cleanup(&self) {
            self.cleanups.set(self.cleanups.get() + 1);
        }

        fn detect_format(&self, _: &mut dyn ByteStream) -> Option<ImageFormat> {
            None
        }

        fn decode(&self, _: &mut dyn ByteStream, _: ImageFormat) -> Result<NativeImage, Jp2Error> {
            Err(Jp2Error::DecodeFailure("unused".into()))
        }

        fn encode(
            &self,
            _: &NativeImage,
            _: &mut dyn ByteStream,
            _: ImageFormat,
            _: &CodecOptions,
        ) -> Result<(), Jp2Error> {
            Ok(())
        }
    }

    #[test]
    fn guard_cleans_up_once() {
        let codec = Counting::default();
        {
            let _guard = RuntimeGuard::new(&codec).unwrap();
            assert_eq!(codec.cleanups.get(), 0);
        }
        assert_eq!(codec.inits.get(), 1);
        assert_eq!(codec.cleanups.get(), 1);
    }

    #[test]
    fn failed_init_is_init_failure_without_cleanup() {
        let codec = Counting {
            fail_init: true,
            ..Default::default()
        };
        assert!(matches!(
            RuntimeGuard::new(&codec),
            Err(Jp2Error::InitFailure(_))
        ));
        assert_eq!(codec.cleanups.get(), 0);
    }

    #[test]
    fn format_names() {
        assert_eq!(ImageFormat::Jp2.name(), "jp2");
        assert_eq!(ImageFormat::Other("jpc").name(), "jpc");
    }
}
