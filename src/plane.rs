//! Row-by-row transfer between component planes and interleaved bytes.

use alloc::format;
use alloc::vec::Vec;

use enough::Stop;

use crate::channel::ChannelLayout;
use crate::error::Jp2Error;
use crate::native::{NativeImage, Plane};

/// Right shift that maps a `precision`-bit sample to 8 bits.
#[inline]
pub fn reduction_shift(precision: u8) -> u32 {
    u32::from(precision.saturating_sub(8))
}

/// Fill `out` (`width * height * channels` bytes, row-major) from the
/// components named by `layout`.
///
/// Samples are truncated to their top 8 bits; no rounding. Each component is
/// shifted by its own precision, so a 16-bit alpha plane next to 8-bit color
/// keeps its high byte instead of taking the color planes' shift.
pub fn read_planes(
    image: &NativeImage,
    layout: &ChannelLayout,
    out: &mut [u8],
    stop: &dyn Stop,
) -> Result<(), Jp2Error> {
    let width = image.width();
    let height = image.height();
    let channels = layout.channel_count();
    let stride = width as usize * channels;
    if out.len() < stride * height as usize {
        return Err(Jp2Error::BufferTooSmall {
            needed: stride * height as usize,
            actual: out.len(),
        });
    }

    let mut sources = Vec::with_capacity(channels);
    for &index in layout.components() {
        let component = image.component(index).ok_or_else(|| {
            Jp2Error::DecodeFailure(format!("component {index} does not exist"))
        })?;
        if component.width() != width || component.height() != height {
            return Err(Jp2Error::DecodeFailure(format!(
                "component {index} is {}x{}, image grid is {width}x{height}",
                component.width(),
                component.height()
            )));
        }
        sources.push((index, reduction_shift(component.precision()), Plane::new(width)?));
    }

    if stride == 0 {
        return Ok(());
    }
    for (y, row) in out.chunks_exact_mut(stride).take(height as usize).enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        for (offset, (index, shift, plane)) in sources.iter_mut().enumerate() {
            image.read_row(*index, y as u32, plane)?;
            for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                px[offset] = (plane.get(x) >> *shift) as u8;
            }
        }
    }
    Ok(())
}

/// Write a strided source buffer into the image's components.
///
/// `offsets[i]` is the byte within each `bytes_per_pixel`-sized source pixel
/// that feeds component `i`.
pub fn write_planes(
    image: &mut NativeImage,
    pixels: &[u8],
    stride: usize,
    bytes_per_pixel: usize,
    offsets: &[usize],
    stop: &dyn Stop,
) -> Result<(), Jp2Error> {
    let width = image.width();
    let height = image.height();
    let mut planes = offsets
        .iter()
        .map(|_| Plane::new(width))
        .collect::<Result<Vec<_>, _>>()?;

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        let start = y as usize * stride;
        let row = pixels
            .get(start..start + width as usize * bytes_per_pixel)
            .ok_or(Jp2Error::BufferTooSmall {
                needed: start + width as usize * bytes_per_pixel,
                actual: pixels.len(),
            })?;
        for (x, px) in row.chunks_exact(bytes_per_pixel).enumerate() {
            for (plane, &offset) in planes.iter_mut().zip(offsets) {
                plane.set(x, i32::from(px[offset]));
            }
        }
        for (component, plane) in planes.iter().enumerate() {
            image.write_row(component, y, plane)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{test_image, ColorSpace, ComponentParams, ComponentType};
    use enough::Unstoppable;

    #[test]
    fn shift_by_precision() {
        assert_eq!(reduction_shift(1), 0);
        assert_eq!(reduction_shift(8), 0);
        assert_eq!(reduction_shift(12), 4);
        assert_eq!(reduction_shift(16), 8);
    }

    #[test]
    fn reads_high_precision_by_truncation() {
        let image = test_image(
            2,
            1,
            12,
            ColorSpace::Sgray,
            &[(ComponentType::Gray, vec![0x0FFF, 0x0ABF])],
        );
        let layout = ChannelLayout::for_image(&image).unwrap();
        let mut out = [0u8; 2];
        read_planes(&image, &layout, &mut out, &Unstoppable).unwrap();
        assert_eq!(out, [0xFF, 0xAB]);
    }

    #[test]
    fn mixed_precisions_shift_independently() {
        let gray = ComponentParams::unsigned8(2, 1);
        let alpha = ComponentParams {
            precision: 16,
            ..gray
        };
        let components = vec![
            crate::native::Component::from_samples(gray, ComponentType::Gray, vec![7, 200])
                .unwrap(),
            crate::native::Component::from_samples(alpha, ComponentType::Opacity, vec![0xFF00, 0x1234])
                .unwrap(),
        ];
        let image = NativeImage::from_components(components, ColorSpace::Sgray);
        let layout = ChannelLayout::for_image(&image).unwrap();
        let mut out = [0u8; 4];
        read_planes(&image, &layout, &mut out, &Unstoppable).unwrap();
        assert_eq!(out, [7, 0xFF, 200, 0x12]);
    }

    #[test]
    fn interleaves_in_role_order() {
        // components stored B, R, G; output must be R, G, B
        let image = test_image(
            2,
            1,
            8,
            ColorSpace::Srgb,
            &[
                (ComponentType::Blue, vec![3, 6]),
                (ComponentType::Red, vec![1, 4]),
                (ComponentType::Green, vec![2, 5]),
            ],
        );
        let layout = ChannelLayout::for_image(&image).unwrap();
        let mut out = [0u8; 6];
        read_planes(&image, &layout, &mut out, &Unstoppable).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn gray_alpha_uses_full_stride() {
        let image = test_image(
            2,
            2,
            8,
            ColorSpace::Sgray,
            &[
                (ComponentType::Gray, vec![10, 20, 30, 40]),
                (ComponentType::Opacity, vec![1, 2, 3, 4]),
            ],
        );
        let layout = ChannelLayout::for_image(&image).unwrap();
        let mut out = [0u8; 8];
        read_planes(&image, &layout, &mut out, &Unstoppable).unwrap();
        assert_eq!(out, [10, 1, 20, 2, 30, 3, 40, 4]);
    }

    #[test]
    fn subsampled_component_is_rejected() {
        let full = ComponentParams::unsigned8(2, 2);
        let half = ComponentParams::unsigned8(1, 1);
        let components = vec![
            crate::native::Component::from_samples(full, ComponentType::Gray, vec![0; 4]).unwrap(),
            crate::native::Component::from_samples(half, ComponentType::Opacity, vec![0]).unwrap(),
        ];
        let image = NativeImage::from_components(components, ColorSpace::Sgray);
        let layout = ChannelLayout::for_image(&image).unwrap();
        let mut out = [0u8; 8];
        assert!(matches!(
            read_planes(&image, &layout, &mut out, &Unstoppable),
            Err(Jp2Error::DecodeFailure(_))
        ));
    }

    #[test]
    fn writes_bgra_source_into_rgba_components() {
        let params = [ComponentParams::unsigned8(2, 1); 4];
        let mut image = NativeImage::new(&params, ColorSpace::Srgb).unwrap();
        let bgra = [30, 20, 10, 40, 31, 21, 11, 41];
        write_planes(&mut image, &bgra, 8, 4, &[2, 1, 0, 3], &Unstoppable).unwrap();
        let samples: Vec<&[i32]> = image.components().iter().map(|c| c.samples()).collect();
        assert_eq!(samples, [&[10, 11][..], &[20, 21], &[30, 31], &[40, 41]]);
    }

    #[test]
    fn write_failure_is_reported() {
        // three offsets but only two components: the third row write fails
        let params = [ComponentParams::unsigned8(1, 1); 2];
        let mut image = NativeImage::new(&params, ColorSpace::Srgb).unwrap();
        let result = write_planes(&mut image, &[1, 2, 3, 4], 4, 4, &[2, 1, 0], &Unstoppable);
        assert!(matches!(
            result,
            Err(Jp2Error::ImageBufferWrite { component: 2, row: 0 })
        ));
    }
}
