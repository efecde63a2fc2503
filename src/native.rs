//! Planar image exchanged with the external codec.
//!
//! A [`NativeImage`] is a set of independent component planes (one per
//! sample kind: red, green, opacity, ...) plus the metadata the codec reads
//! from or writes to the container: color space, embedded color profile and
//! resolution records. Components are addressed a row at a time through a
//! reusable [`Plane`] scratch buffer.

use alloc::format;
use alloc::vec::Vec;

use moxcms::ColorProfile;

use crate::error::Jp2Error;
use crate::resolution::ResolutionRecord;

/// Upper bound on the component count of an image accepted for decoding.
pub const MAX_COMPONENTS: usize = 64;

/// Highest sample precision a component may declare.
pub const MAX_PRECISION: u8 = 31;

/// Broad color family of a [`ColorSpace`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorFamily {
    Rgb,
    Gray,
    Ycc,
    Lab,
    Unknown,
}

/// Color space tag carried by a [`NativeImage`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// No color interpretation.
    Unknown,
    /// Family is known but the exact space is defined only by an embedded profile.
    Generic(ColorFamily),
    /// IEC 61966-2-1 sRGB. The canonical space decoded pixels end up in.
    Srgb,
    /// Grayscale with the sRGB tone curve.
    Sgray,
    /// sYCC: YCbCr encoding of sRGB.
    Sycc,
    /// CIE L*a*b*.
    CieLab,
}

impl ColorSpace {
    pub fn family(self) -> ColorFamily {
        match self {
            ColorSpace::Unknown => ColorFamily::Unknown,
            ColorSpace::Generic(family) => family,
            ColorSpace::Srgb => ColorFamily::Rgb,
            ColorSpace::Sgray => ColorFamily::Gray,
            ColorSpace::Sycc => ColorFamily::Ycc,
            ColorSpace::CieLab => ColorFamily::Lab,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, ColorSpace::Unknown | ColorSpace::Generic(ColorFamily::Unknown))
    }

    pub fn is_generic(self) -> bool {
        matches!(self, ColorSpace::Generic(_))
    }
}

/// Semantic tag of one component.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Red,
    Green,
    Blue,
    Gray,
    Luma,
    ChromaBlue,
    ChromaRed,
    Opacity,
    Unspecified,
}

/// Geometry and sample format of a component. Components always start at the
/// origin and have unit sampling steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentParams {
    pub width: u32,
    pub height: u32,
    /// Bits per sample, `1..=MAX_PRECISION`.
    pub precision: u8,
    pub signed: bool,
}

impl ComponentParams {
    /// Unsigned 8-bit component of the given size.
    pub fn unsigned8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            precision: 8,
            signed: false,
        }
    }

    fn sample_count(&self) -> Result<usize, Jp2Error> {
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(Jp2Error::InvalidInput(format!(
                "component precision {} outside 1..={MAX_PRECISION}",
                self.precision
            )));
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or(Jp2Error::DimensionsTooLarge {
                width: self.width,
                height: self.height,
            })
    }
}

/// One sample plane of an image.
#[derive(Clone, Debug)]
pub struct Component {
    params: ComponentParams,
    kind: ComponentType,
    samples: Vec<i32>,
}

impl Component {
    /// Allocate a zero-filled component.
    pub fn new(params: ComponentParams, kind: ComponentType) -> Result<Self, Jp2Error> {
        let count = params.sample_count()?;
        let mut samples = Vec::new();
        samples.try_reserve_exact(count).map_err(|_| {
            Jp2Error::OutOfMemory(format!("component plane of {count} samples"))
        })?;
        samples.resize(count, 0);
        Ok(Self {
            params,
            kind,
            samples,
        })
    }

    /// Wrap existing row-major samples.
    pub fn from_samples(
        params: ComponentParams,
        kind: ComponentType,
        samples: Vec<i32>,
    ) -> Result<Self, Jp2Error> {
        let count = params.sample_count()?;
        if samples.len() != count {
            return Err(Jp2Error::InvalidInput(format!(
                "component of {}x{} needs {count} samples, got {}",
                params.width,
                params.height,
                samples.len()
            )));
        }
        Ok(Self {
            params,
            kind,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.params.width
    }

    pub fn height(&self) -> u32 {
        self.params.height
    }

    pub fn precision(&self) -> u8 {
        self.params.precision
    }

    pub fn is_signed(&self) -> bool {
        self.params.signed
    }

    pub fn params(&self) -> ComponentParams {
        self.params
    }

    pub fn kind(&self) -> ComponentType {
        self.kind
    }

    /// Row-major samples.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }
}

/// One-row scratch buffer for transferring a component row.
#[derive(Clone, Debug)]
pub struct Plane {
    samples: Vec<i32>,
}

impl Plane {
    pub fn new(width: u32) -> Result<Self, Jp2Error> {
        let width = width as usize;
        let mut samples = Vec::new();
        samples
            .try_reserve_exact(width)
            .map_err(|_| Jp2Error::OutOfMemory(format!("row buffer of {width} samples")))?;
        samples.resize(width, 0);
        Ok(Self { samples })
    }

    pub fn width(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn get(&self, x: usize) -> i32 {
        self.samples[x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, value: i32) {
        self.samples[x] = value;
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.samples
    }
}

/// Decoded (or to-be-encoded) image in the codec's planar representation.
#[derive(Clone, Debug)]
pub struct NativeImage {
    components: Vec<Component>,
    color_space: ColorSpace,
    profile: Option<ColorProfile>,
    capture_resolution: Option<ResolutionRecord>,
    display_resolution: Option<ResolutionRecord>,
}

impl NativeImage {
    /// Allocate zero-filled components, all tagged [`ComponentType::Unspecified`].
    pub fn new(params: &[ComponentParams], color_space: ColorSpace) -> Result<Self, Jp2Error> {
        let components = params
            .iter()
            .map(|p| Component::new(*p, ComponentType::Unspecified))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_components(components, color_space))
    }

    pub fn from_components(components: Vec<Component>, color_space: ColorSpace) -> Self {
        Self {
            components,
            color_space,
            profile: None,
            capture_resolution: None,
            display_resolution: None,
        }
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    /// Index of the first component tagged `kind`.
    pub fn component_by_type(&self, kind: ComponentType) -> Option<usize> {
        self.components.iter().position(|c| c.kind == kind)
    }

    pub fn set_component_type(&mut self, index: usize, kind: ComponentType) -> Result<(), Jp2Error> {
        let count = self.components.len();
        let component = self.components.get_mut(index).ok_or_else(|| {
            Jp2Error::InvalidInput(format!("component {index} out of range ({count} components)"))
        })?;
        component.kind = kind;
        Ok(())
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn set_color_space(&mut self, color_space: ColorSpace) {
        self.color_space = color_space;
    }

    /// Embedded color profile, if any.
    pub fn profile(&self) -> Option<&ColorProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: Option<ColorProfile>) {
        self.profile = profile;
    }

    /// Capture resolution record (`resc` box).
    pub fn capture_resolution(&self) -> Option<&ResolutionRecord> {
        self.capture_resolution.as_ref()
    }

    pub fn set_capture_resolution(&mut self, record: Option<ResolutionRecord>) {
        self.capture_resolution = record;
    }

    /// Default display resolution record (`resd` box).
    pub fn display_resolution(&self) -> Option<&ResolutionRecord> {
        self.display_resolution.as_ref()
    }

    pub fn set_display_resolution(&mut self, record: Option<ResolutionRecord>) {
        self.display_resolution = record;
    }

    /// Width of component 0, which defines the image grid.
    pub fn width(&self) -> u32 {
        self.components.first().map_or(0, Component::width)
    }

    /// Height of component 0.
    pub fn height(&self) -> u32 {
        self.components.first().map_or(0, Component::height)
    }

    /// Precision of component 0.
    pub fn precision(&self) -> u8 {
        self.components.first().map_or(0, Component::precision)
    }

    /// Copy row `y` of `component` into `plane`.
    pub fn read_row(&self, component: usize, y: u32, plane: &mut Plane) -> Result<(), Jp2Error> {
        let c = self.components.get(component).ok_or_else(|| {
            Jp2Error::DecodeFailure(format!("component {component} does not exist"))
        })?;
        let w = c.params.width as usize;
        if y >= c.params.height || plane.width() != w {
            return Err(Jp2Error::DecodeFailure(format!(
                "row {y} of component {component} ({}x{}) does not fit a {}-sample buffer",
                c.params.width,
                c.params.height,
                plane.width()
            )));
        }
        let start = y as usize * w;
        plane.samples.copy_from_slice(&c.samples[start..start + w]);
        Ok(())
    }

    /// Store `plane` as row `y` of `component`.
    pub fn write_row(&mut self, component: usize, y: u32, plane: &Plane) -> Result<(), Jp2Error> {
        let c = self
            .components
            .get_mut(component)
            .ok_or(Jp2Error::ImageBufferWrite { component, row: y })?;
        let w = c.params.width as usize;
        if y >= c.params.height || plane.width() != w {
            return Err(Jp2Error::ImageBufferWrite { component, row: y });
        }
        let start = y as usize * w;
        c.samples[start..start + w].copy_from_slice(&plane.samples);
        Ok(())
    }
}

/// Build an image from explicit per-component sample vectors. Test helper
/// shared by the unit tests of sibling modules.
#[cfg(test)]
pub(crate) fn test_image(
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
