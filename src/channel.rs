//! Mapping between native components and interleaved channels.
//!
//! Decoded output is interleaved RGB[A] or Gray[A]. Encoder input is read as
//! BGR[A], the byte order of 32-bit host surfaces. The two directions are
//! intentionally asymmetric: a decoded buffer must be swizzled to BGR[A]
//! before it can be fed back to the encoder (see
//! [`DecodeOutput::to_bgra8`](crate::DecodeOutput::to_bgra8)).

use std::collections::HashSet;

use alloc::format;

use crate::error::Jp2Error;
use crate::native::{ColorFamily, ComponentType, NativeImage};

/// Semantic role of an interleaved channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Red,
    Green,
    Blue,
    Gray,
    Alpha,
}

impl Role {
    /// Component tag carrying this role.
    pub fn component_type(self) -> ComponentType {
        match self {
            Role::Red => ComponentType::Red,
            Role::Green => ComponentType::Green,
            Role::Blue => ComponentType::Blue,
            Role::Gray => ComponentType::Gray,
            Role::Alpha => ComponentType::Opacity,
        }
    }
}

/// Interleaved channel family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelFamily {
    Rgb,
    Gray,
}

static RGB_ROLES: [Role; 4] = [Role::Red, Role::Green, Role::Blue, Role::Alpha];
static GRAY_ROLES: [Role; 2] = [Role::Gray, Role::Alpha];

/// Which component feeds each output channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelLayout {
    family: ChannelFamily,
    has_alpha: bool,
    components: [usize; 4],
}

impl ChannelLayout {
    /// Derive the layout from the image's color family and component tags.
    pub fn for_image(image: &NativeImage) -> Result<Self, Jp2Error> {
        let family = match image.color_space().family() {
            ColorFamily::Rgb => ChannelFamily::Rgb,
            ColorFamily::Gray => ChannelFamily::Gray,
            other => {
                return Err(Jp2Error::UnknownFormat(format!(
                    "cannot map {other:?} components to channels"
                )));
            }
        };
        let has_alpha = image.component_by_type(ComponentType::Opacity).is_some();
        let mut layout = Self {
            family,
            has_alpha,
            components: [0; 4],
        };
        for (slot, role) in layout.roles().iter().enumerate() {
            layout.components[slot] =
                image.component_by_type(role.component_type()).ok_or_else(|| {
                    Jp2Error::UnknownFormat(format!("no {role:?} component"))
                })?;
        }
        Ok(layout)
    }

    pub fn family(&self) -> ChannelFamily {
        self.family
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// 3 or 4 for RGB, 1 or 2 for gray.
    pub fn channel_count(&self) -> usize {
        let color = match self.family {
            ChannelFamily::Rgb => 3,
            ChannelFamily::Gray => 1,
        };
        color + usize::from(self.has_alpha)
    }

    /// Roles in interleaved order.
    pub fn roles(&self) -> &'static [Role] {
        let n = self.channel_count();
        match self.family {
            ChannelFamily::Rgb => &RGB_ROLES[..n],
            ChannelFamily::Gray => &GRAY_ROLES[..n],
        }
    }

    /// Component indices in interleaved order.
    pub fn components(&self) -> &[usize] {
        &self.components[..self.channel_count()]
    }

    /// Component feeding `role`, if the layout has that role.
    pub fn component_for(&self, role: Role) -> Option<usize> {
        self.roles()
            .iter()
            .position(|&r| r == role)
            .map(|slot| self.components[slot])
    }
}

/// Byte offsets within a source pixel for each encoded component, in
/// component order. Sources are BGR[A]; `channels` is 1, 3 or 4.
pub fn source_offsets(channels: usize) -> Option<&'static [usize]> {
    match channels {
        1 => Some(&[0]),
        3 => Some(&[2, 1, 0]),
        4 => Some(&[2, 1, 0, 3]),
        _ => None,
    }
}

/// Roles of the encoded components, in component order.
pub fn encode_roles(channels: usize) -> Option<&'static [Role]> {
    match channels {
        1 => Some(&[Role::Gray]),
        3 => Some(&RGB_ROLES[..3]),
        4 => Some(&RGB_ROLES),
        _ => None,
    }
}

/// Distinct colors tracked before giving up on the gray check.
const MAX_TRACKED_COLORS: usize = 300;
/// Largest palette still considered for single-channel output.
const MAX_GRAY_COLORS: usize = 256;

/// Pick the smallest channel count that represents a BGRA buffer.
///
/// Returns 4 if any pixel is translucent. Otherwise returns 1 when at most
/// 256 distinct colors occur and every pixel has equal B, G and R, and 3 in
/// every other case.
pub fn suggest_channel_count(
    pixels: &[u8],
    width: u32,
    height: u32,
    stride: usize,
) -> Result<usize, Jp2Error> {
    let w = width as usize;
    let row_bytes = w
        .checked_mul(4)
        .ok_or(Jp2Error::DimensionsTooLarge { width, height })?;
    if stride < row_bytes {
        return Err(Jp2Error::InvalidInput(format!(
            "stride {stride} shorter than a {width}-pixel BGRA row"
        )));
    }
    let needed = match height {
        0 => 0,
        h => stride
            .checked_mul(h as usize - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or(Jp2Error::DimensionsTooLarge { width, height })?,
    };
    if pixels.len() < needed {
        return Err(Jp2Error::BufferTooSmall {
            needed,
            actual: pixels.len(),
        });
    }

    let rows = || {
        (0..height as usize).map(move |y| &pixels[y * stride..y * stride + row_bytes])
    };

    let mut colors: HashSet<[u8; 4]> = HashSet::new();
    for row in rows() {
        for px in row.chunks_exact(4) {
            if px[3] < 255 {
                return Ok(4);
            }
            if colors.len() < MAX_TRACKED_COLORS {
                colors.insert([px[0], px[1], px[2], px[3]]);
            }
        }
    }

    if colors.len() <= MAX_GRAY_COLORS {
        let all_gray = rows().all(|row| {
            row.chunks_exact(4)
                .all(|px| px[0] == px[1] && px[1] == px[2])
        });
        if all_gray {
            return Ok(1);
        }
    }
    Ok(3)
}
