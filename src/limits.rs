use alloc::format;

use crate::error::{Jp2Error, Operation};

/// Caps on the image grid and output buffer a request will accept.
///
/// All fields default to `None` (no limit). The component-count cap is not a
/// limit; it is fixed at [`crate::MAX_COMPONENTS`]. Violations surface as
/// [`Jp2Error::LimitExceeded`], which maps to the out-of-memory status.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height) of the image grid.
    pub max_pixels: Option<u64>,
    /// Maximum size of the interleaved 8-bit buffer a decode allocates.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Check the image grid of an `operation` against the dimension limits.
    pub(crate) fn check(
        &self,
        operation: Operation,
        width: u32,
        height: u32,
    ) -> Result<(), Jp2Error> {
        let exceeded = |what: &str, value: u64, max: u64| {
            Jp2Error::LimitExceeded(format!(
                "{operation}: image {what} {value} exceeds limit {max} ({width}x{height} grid)"
            ))
        };
        if let Some(max) = self.max_width.filter(|&m| u64::from(width) > m) {
            return Err(exceeded("width", u64::from(width), max));
        }
        if let Some(max) = self.max_height.filter(|&m| u64::from(height) > m) {
            return Err(exceeded("height", u64::from(height), max));
        }
        let pixels = u64::from(width) * u64::from(height);
        if let Some(max) = self.max_pixels.filter(|&m| pixels > m) {
            return Err(exceeded("pixel count", pixels, max));
        }
        Ok(())
    }

    /// Check the size of the interleaved output buffer before allocating it.
    pub(crate) fn check_output_buffer(
        &self,
        bytes: usize,
        channels: usize,
    ) -> Result<(), Jp2Error> {
        match self.max_memory_bytes {
            Some(max) if bytes as u64 > max => Err(Jp2Error::LimitExceeded(format!(
                "decode: {channels}-channel output buffer of {bytes} bytes exceeds memory limit {max}"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<(), Jp2Error>) -> String {
        match result {
            Err(Jp2Error::LimitExceeded(msg)) => msg,
            other => panic!("expected LimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn default_is_unlimited() {
        let limits = Limits::default();
        assert!(limits.check(Operation::Decode, u32::MAX, u32::MAX).is_ok());
        assert!(limits.check_output_buffer(usize::MAX, 4).is_ok());
    }

    #[test]
    fn pixel_limit_names_the_operation() {
        let limits = Limits {
            max_pixels: Some(100),
            ..Default::default()
        };
        assert!(limits.check(Operation::Encode, 10, 10).is_ok());
        let msg = message(limits.check(Operation::Encode, 10, 11));
        assert!(msg.starts_with("encode: image pixel count 110"), "{msg}");
        assert!(msg.contains("10x11"), "{msg}");
    }

    #[test]
    fn width_is_checked_before_height() {
        let limits = Limits {
            max_width: Some(8),
            max_height: Some(8),
            ..Default::default()
        };
        let msg = message(limits.check(Operation::Decode, 9, 9));
        assert!(msg.starts_with("decode: image width 9"), "{msg}");
    }

    #[test]
    fn output_buffer_limit() {
        let limits = Limits {
            max_memory_bytes: Some(1024),
            ..Default::default()
        };
        assert!(limits.check_output_buffer(1024, 4).is_ok());
        let msg = message(limits.check_output_buffer(1025, 4));
        assert!(msg.contains("4-channel output buffer of 1025 bytes"), "{msg}");
    }
}
