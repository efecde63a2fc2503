use core::fmt;

use crate::native::NativeImage;
use crate::resolution::{self, PhysicalResolution};

/// One-line description of a decoded image.
///
/// Renders as `<format> <components> <width> <height> <depth> <hres> <vres> <raw size>`,
/// with resolutions in dots per centimeter.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSummary {
    pub format: &'static str,
    pub num_components: usize,
    pub width: u32,
    pub height: u32,
    /// Precision of component 0.
    pub depth: u8,
    /// Capture resolution if recorded, else display resolution.
    pub resolution: PhysicalResolution,
    /// Bytes needed to store every component at its own precision.
    pub raw_size: u64,
}

impl ImageSummary {
    pub fn new(format: &'static str, image: &NativeImage) -> Self {
        let capture = resolution::extract(image.capture_resolution());
        let resolution = if capture.is_known() {
            capture
        } else {
            resolution::extract(image.display_resolution())
        };
        let raw_size = image
            .components()
            .iter()
            .map(|c| {
                let bits = u64::from(c.width()) * u64::from(c.height()) * u64::from(c.precision());
                bits.div_ceil(8)
            })
            .sum();
        Self {
            format,
            num_components: image.num_components(),
            width: image.width(),
            height: image.height(),
            depth: image.precision(),
            resolution,
            raw_size,
        }
    }
}

impl fmt::Display for ImageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {:.2} {:.2} {}",
            self.format,
            self.num_components,
            self.width,
            self.height,
            self.depth,
            self.resolution.dpcm_x,
            self.resolution.dpcm_y,
            self.raw_size
        )
    }
}
