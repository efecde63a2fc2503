//! In-memory stand-in for a JPEG 2000 codec.
//!
//! Writes the JP2 signature box followed by a flat dump of the planar image,
//! and reads the same back. Good enough to drive the pixel pipeline end to end.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use zenjp2::{
    ByteStream, Codec, CodecOptions, ColorFamily, ColorSpace, Component, ComponentParams,
    ComponentType, ImageFormat, Jp2Error, NativeImage, ResolutionRecord,
};

pub const JP2_SIGNATURE: [u8; 12] = [0, 0, 0, 12, b'j', b'P', b' ', b' ', 13, 10, 0x87, 10];
pub const J2K_SIGNATURE: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

#[derive(Default)]
pub struct MemoryCodec {
    pub fail_init: bool,
    pub fail_encode: bool,
    /// Replaces whatever the stream holds on decode.
    pub decoded: RefCell<Option<NativeImage>>,
    pub inits: Cell<u32>,
    pub cleanups: Cell<u32>,
    pub last_options: RefCell<Option<String>>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec whose decode ignores the stream and yields `image`.
    pub fn yielding(image: NativeImage) -> Self {
        Self {
            decoded: RefCell::new(Some(image)),
            ..Self::default()
        }
    }

    pub fn balanced(&self) -> bool {
        self.inits.get() == self.cleanups.get()
    }
}

impl Codec for MemoryCodec {
    fn initialize(&self) -> Result<(), Jp2Error> {
        if self.fail_init {
            return Err(Jp2Error::InitFailure("runtime unavailable".into()));
        }
        self.inits.set(self.inits.get() + 1);
        Ok(())
    }

    fn cleanup(&self) {
        self.cleanups.set(self.cleanups.get() + 1);
    }

    fn detect_format(&self, stream: &mut dyn ByteStream) -> Option<ImageFormat> {
        let mut head = [0u8; 12];
        let mut filled = 0;
        while filled < head.len() {
            match stream.read(&mut head[filled..]) {
                Ok(0) | Err(_) => break,
                Ok(n) => filled += n,
            }
        }
        if filled == 12 && head == JP2_SIGNATURE {
            Some(ImageFormat::Jp2)
        } else if filled >= 4 && head[..4] == J2K_SIGNATURE {
            Some(ImageFormat::J2k)
        } else {
            None
        }
    }

    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        _format: ImageFormat,
    ) -> Result<NativeImage, Jp2Error> {
        if let Some(image) = self.decoded.borrow_mut().take() {
            return Ok(image);
        }
        let bytes = stream
            .read_to_vec()
            .map_err(|e| Jp2Error::DecodeFailure(e.to_string()))?;
        let body = bytes
            .strip_prefix(&JP2_SIGNATURE[..])
            .ok_or_else(|| Jp2Error::DecodeFailure("missing signature".into()))?;
        Reader { bytes: body }.image()
    }

    fn encode(
        &self,
        image: &NativeImage,
        stream: &mut dyn ByteStream,
        _format: ImageFormat,
        options: &CodecOptions,
    ) -> Result<(), Jp2Error> {
        *self.last_options.borrow_mut() = Some(options.to_option_string());
        if self.fail_encode {
            return Err(Jp2Error::InvalidInput("encoder refused image".into()));
        }
        let mut out = JP2_SIGNATURE.to_vec();
        write_image(&mut out, image);
        stream
            .write_all(&out)
            .map_err(|e| Jp2Error::EncodeFailure(e.to_string()))
    }
}

fn color_space_code(cs: ColorSpace) -> u8 {
    match cs {
        ColorSpace::Srgb => 1,
        ColorSpace::Sgray => 2,
        ColorSpace::Sycc => 3,
        ColorSpace::CieLab => 4,
        ColorSpace::Generic(ColorFamily::Rgb) => 5,
        ColorSpace::Generic(ColorFamily::Gray) => 6,
        _ => 0,
    }
}

fn color_space_from(code: u8) -> ColorSpace {
    match code {
        1 => ColorSpace::Srgb,
        2 => ColorSpace::Sgray,
        3 => ColorSpace::Sycc,
        4 => ColorSpace::CieLab,
        5 => ColorSpace::Generic(ColorFamily::Rgb),
        6 => ColorSpace::Generic(ColorFamily::Gray),
        _ => ColorSpace::Unknown,
    }
}

const KINDS: [ComponentType; 9] = [
    ComponentType::Red,
    ComponentType::Green,
    ComponentType::Blue,
    ComponentType::Gray,
    ComponentType::Luma,
    ComponentType::ChromaBlue,
    ComponentType::ChromaRed,
    ComponentType::Opacity,
    ComponentType::Unspecified,
];

fn write_image(out: &mut Vec<u8>, image: &NativeImage) {
    out.push(color_space_code(image.color_space()));
    out.extend_from_slice(&(image.num_components() as u16).to_le_bytes());
    for c in image.components() {
        out.extend_from_slice(&c.width().to_le_bytes());
        out.extend_from_slice(&c.height().to_le_bytes());
        out.push(c.precision());
        out.push(u8::from(c.is_signed()));
        out.push(KINDS.iter().position(|k| *k == c.kind()).unwrap_or(8) as u8);
        for s in c.samples() {
            out.extend_from_slice(&s.to_le_bytes());
        }
    }
    match image.capture_resolution() {
        Some(r) => {
            out.push(1);
            out.extend_from_slice(&r.h_numerator.to_le_bytes());
            out.extend_from_slice(&r.h_denominator.to_le_bytes());
            out.push(r.h_exponent as u8);
            out.extend_from_slice(&r.v_numerator.to_le_bytes());
            out.extend_from_slice(&r.v_denominator.to_le_bytes());
            out.push(r.v_exponent as u8);
        }
        None => out.push(0),
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], Jp2Error> {
        if self.bytes.len() < N {
            return Err(Jp2Error::DecodeFailure("truncated stream".into()));
        }
        let (head, rest) = self.bytes.split_at(N);
        self.bytes = rest;
        Ok(head.try_into().unwrap())
    }

    fn u8(&mut self) -> Result<u8, Jp2Error> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, Jp2Error> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32, Jp2Error> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn image(mut self) -> Result<NativeImage, Jp2Error> {
        let color_space = color_space_from(self.u8()?);
        let count = self.u16()?;
        let mut components = Vec::new();
        for _ in 0..count {
            let params = ComponentParams {
                width: self.u32()?,
                height: self.u32()?,
                precision: self.u8()?,
                signed: self.u8()? != 0,
            };
            let kind = *KINDS
                .get(usize::from(self.u8()?))
                .ok_or_else(|| Jp2Error::DecodeFailure("bad component type".into()))?;
            let n = params.width as usize * params.height as usize;
            if n > self.bytes.len() / 4 {
                return Err(Jp2Error::DecodeFailure("truncated samples".into()));
            }
            let mut samples = Vec::with_capacity(n);
            for _ in 0..n {
                samples.push(i32::from_le_bytes(self.take()?));
            }
            components.push(Component::from_samples(params, kind, samples)?);
        }
        let mut image = NativeImage::from_components(components, color_space);
        if self.u8()? == 1 {
            image.set_capture_resolution(Some(ResolutionRecord {
                h_numerator: self.u16()?,
                h_denominator: self.u16()?,
                h_exponent: self.u8()? as i8,
                v_numerator: self.u16()?,
                v_denominator: self.u16()?,
                v_exponent: self.u8()? as i8,
            }));
        }
        Ok(image)
    }
}

/// Planar image with explicit samples for each tagged component.
pub fn planar_image(
    width: u32,
    height: u32,
    precision: u8,
    color_space: ColorSpace,
    planes: &[(ComponentType, Vec<i32>)],
) -> NativeImage {
    let params = ComponentParams {
        width,
        height,
        precision,
        signed: false,
    };
    let components = planes
        .iter()
        .map(|(kind, samples)| Component::from_samples(params, *kind, samples.clone()).unwrap())
        .collect();
    NativeImage::from_components(components, color_space)
}
