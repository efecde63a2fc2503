use alloc::string::String;
use enough::StopReason;

use crate::pixel::PixelLayout;

/// Errors from JPEG 2000 pixel assembly and disassembly.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Jp2Error {
    #[error("codec runtime failed to initialize: {0}")]
    InitFailure(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("unknown or unsupported image format: {0}")]
    UnknownFormat(String),

    #[error("decode failed: {0}")]
    DecodeFailure(String),

    #[error("too many components: {count} (maximum {max})")]
    TooManyComponents { count: usize, max: usize },

    #[error("color profile creation failed: {0}")]
    ProfileCreation(String),

    #[error("color profile conversion failed: {0}")]
    ProfileConversion(String),

    #[error("failed to write row {row} of component {component}")]
    ImageBufferWrite { component: usize, row: u32 },

    #[error("encode failed: {0}")]
    EncodeFailure(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: PixelLayout,
        actual: PixelLayout,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for Jp2Error {
    fn from(r: StopReason) -> Self {
        Jp2Error::Cancelled(r)
    }
}

/// Which pipeline produced an error. Used to resolve direction-neutral
/// errors to a [`Status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Decode,
    Encode,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Operation::Decode => "decode",
            Operation::Encode => "encode",
        })
    }
}

/// Stable status codes, one per failure class.
///
/// Values are fixed for the lifetime of the crate so they can cross an FFI
/// boundary unchanged.
#[non_exhaustive]
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 1,
    InitFailure = 0,
    OutOfMemory = -1,
    UnknownFormat = -2,
    DecodeFailure = -3,
    TooManyComponents = -4,
    ProfileCreation = -5,
    ProfileConversion = -6,
    ImageBufferWrite = -7,
    EncodeFailure = -8,
}

impl Status {
    /// Numeric value of this status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Collapse a pipeline result into its status code.
    pub fn of<T>(result: &Result<T, Jp2Error>, op: Operation) -> Status {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(op),
        }
    }
}

impl Jp2Error {
    /// The status code reported for this error when raised by `op`.
    pub fn status(&self, op: Operation) -> Status {
        let failure = match op {
            Operation::Decode => Status::DecodeFailure,
            Operation::Encode => Status::EncodeFailure,
        };
        match self {
            Jp2Error::InitFailure(_) => Status::InitFailure,
            Jp2Error::OutOfMemory(_) | Jp2Error::LimitExceeded(_) => Status::OutOfMemory,
            Jp2Error::DimensionsTooLarge { .. } => Status::OutOfMemory,
            Jp2Error::UnknownFormat(_) => Status::UnknownFormat,
            Jp2Error::DecodeFailure(_) => Status::DecodeFailure,
            Jp2Error::TooManyComponents { .. } => Status::TooManyComponents,
            Jp2Error::ProfileCreation(_) => Status::ProfileCreation,
            Jp2Error::ProfileConversion(_) => Status::ProfileConversion,
            Jp2Error::ImageBufferWrite { .. } => Status::ImageBufferWrite,
            Jp2Error::EncodeFailure(_) => Status::EncodeFailure,
            Jp2Error::InvalidInput(_)
            | Jp2Error::BufferTooSmall { .. }
            | Jp2Error::LayoutMismatch { .. }
            | Jp2Error::Cancelled(_) => failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_distinct() {
        let all = [
            Status::Ok,
            Status::InitFailure,
            Status::OutOfMemory,
            Status::UnknownFormat,
            Status::DecodeFailure,
            Status::TooManyComponents,
            Status::ProfileCreation,
            Status::ProfileConversion,
            Status::ImageBufferWrite,
            Status::EncodeFailure,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code(), "{a:?} and {b:?} share a code");
            }
        }
        assert_eq!(Status::Ok.code(), 1);
        assert_eq!(Status::EncodeFailure.code(), -8);
    }

    #[test]
    fn neutral_errors_follow_operation() {
        let e = Jp2Error::InvalidInput("x".into());
        assert_eq!(e.status(Operation::Decode), Status::DecodeFailure);
        assert_eq!(e.status(Operation::Encode), Status::EncodeFailure);

        let e = Jp2Error::LimitExceeded("x".into());
        assert_eq!(e.status(Operation::Encode), Status::OutOfMemory);
    }

    #[test]
    fn status_of_result() {
        let ok: Result<(), Jp2Error> = Ok(());
        assert_eq!(Status::of(&ok, Operation::Decode), Status::Ok);
        let err: Result<(), Jp2Error> = Err(Jp2Error::TooManyComponents { count: 65, max: 64 });
        assert_eq!(Status::of(&err, Operation::Decode), Status::TooManyComponents);
    }
}
