//! Byte source/sink handed to the codec.
//!
//! The pixel pipeline never touches encoded bytes itself; it only passes a
//! [`ByteStream`] through to the [`Codec`](crate::Codec). In-memory buffers,
//! files and host-provided callbacks all implement it.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Random-access byte stream.
pub trait ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Returns the new position from the start of the stream.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Read from the current position until `read` returns 0.
    fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            match self.read(&mut chunk) {
                Ok(0) => return Ok(out),
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Write the whole buffer, retrying short writes.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

macro_rules! io_stream {
    ($($ty:ty),* $(,)?) => {$(
        impl ByteStream for $ty {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                Read::read(self, buf)
            }

            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Write::write(self, buf)
            }

            fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
                Seek::seek(self, pos)
            }

            fn flush(&mut self) -> io::Result<()> {
                Write::flush(self)
            }
        }
    )*};
}

io_stream!(Cursor<Vec<u8>>, Cursor<&mut Vec<u8>>, File);

/// Read-only view of encoded bytes.
impl ByteStream for Cursor<&[u8]> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(unsupported("write"))
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }
}

fn unsupported(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        alloc::format!("stream does not support {op}"),
    )
}

type ReadFn<'a> = Box<dyn FnMut(&mut [u8]) -> io::Result<usize> + 'a>;
type WriteFn<'a> = Box<dyn FnMut(&[u8]) -> io::Result<usize> + 'a>;
type SeekFn<'a> = Box<dyn FnMut(SeekFrom) -> io::Result<u64> + 'a>;

/// Stream backed by host callbacks. Any callback left unset reports
/// [`io::ErrorKind::Unsupported`].
///
/// ```
/// use std::io::SeekFrom;
/// use zenjp2::{ByteStream, CallbackStream};
///
/// let data = [1u8, 2, 3];
/// let mut pos = 0;
/// let mut stream = CallbackStream::new().on_read(|buf: &mut [u8]| {
///     let n = buf.len().min(data.len() - pos);
///     buf[..n].copy_from_slice(&data[pos..pos + n]);
///     pos += n;
///     Ok(n)
/// });
/// assert_eq!(stream.read_to_vec().unwrap(), [1, 2, 3]);
/// assert!(stream.seek(SeekFrom::Start(0)).is_err());
/// ```
#[derive(Default)]
pub struct CallbackStream<'a> {
    read: Option<ReadFn<'a>>,
    write: Option<WriteFn<'a>>,
    seek: Option<SeekFn<'a>>,
}

impl<'a> CallbackStream<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_read(mut self, f: impl FnMut(&mut [u8]) -> io::Result<usize> + 'a) -> Self {
        self.read = Some(Box::new(f));
        self
    }

    pub fn on_write(mut self, f: impl FnMut(&[u8]) -> io::Result<usize> + 'a) -> Self {
        self.write = Some(Box::new(f));
        self
    }

    pub fn on_seek(mut self, f: impl FnMut(SeekFrom) -> io::Result<u64> + 'a) -> Self {
        self.seek = Some(Box::new(f));
        self
    }
}

impl core::fmt::Debug for CallbackStream<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackStream")
            .field("read", &self.read.is_some())
            .field("write", &self.write.is_some())
            .field("seek", &self.seek.is_some())
            .finish()
    }
}

impl ByteStream for CallbackStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read.as_mut() {
            Some(f) => f(buf),
            None => Err(unsupported("read")),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write.as_mut() {
            Some(f) => f(buf),
            None => Err(unsupported("write")),
        }
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self.seek.as_mut() {
            Some(f) => f(pos),
            None => Err(unsupported("seek")),
        }
    }
}
