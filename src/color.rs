//! Color normalization to sRGB.
//!
//! Many JPEG 2000 files tag their color inconsistently, so every 8-bit (or
//! lower) image with three or more components, an embedded profile, and a
//! color space other than sRGB is converted to sRGB before its planes are
//! read. Higher precisions are left alone. Conversion uses a perceptual
//! intent transform through moxcms; sYCC goes through its defining matrix.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use moxcms::{ColorProfile, Layout, RenderingIntent, TransformOptions};
use tracing::debug;

use crate::error::Jp2Error;
use crate::native::{
    ColorFamily, ColorSpace, Component, ComponentParams, ComponentType, NativeImage,
};

/// Profile describing a well-known color space, for images that carry none.
///
/// Unknown and generic spaces have no intrinsic profile and yield `None`.
/// sYCC shares sRGB's primaries and tone curve, so it maps to the sRGB profile.
pub fn profile_for_color_space(color_space: ColorSpace) -> Result<Option<ColorProfile>, Jp2Error> {
    match color_space {
        ColorSpace::Srgb | ColorSpace::Sycc => Ok(Some(ColorProfile::new_srgb())),
        ColorSpace::Sgray => Ok(Some(sgray_profile())),
        ColorSpace::Unknown | ColorSpace::Generic(_) => Ok(None),
        ColorSpace::CieLab => Err(Jp2Error::ProfileCreation(
            "no built-in profile for CIE L*a*b*".into(),
        )),
    }
}

/// Gray profile with the sRGB tone curve.
fn sgray_profile() -> ColorProfile {
    let mut profile = ColorProfile::new_gray_with_gamma(1.0);
    profile.gray_trc = ColorProfile::new_srgb().red_trc;
    profile
}

/// Attach the intrinsic profile of the image's color space if it has none.
pub(crate) fn ensure_profile(image: &mut NativeImage) -> Result<(), Jp2Error> {
    let cs = image.color_space();
    if image.profile().is_none() && !cs.is_unknown() && !cs.is_generic() {
        let profile = profile_for_color_space(cs)?;
        image.set_profile(profile);
    }
    Ok(())
}

/// Whether [`normalize`] would convert this image.
pub fn needs_normalization(image: &NativeImage) -> bool {
    image.num_components() >= 3
        && image.precision() <= 8
        && image.color_space() != ColorSpace::Srgb
        && image.profile().is_some()
}

/// Convert `image` to sRGB if [`needs_normalization`] holds, otherwise return
/// it unchanged.
///
/// The result has 8-bit unsigned red, green and blue components followed by
/// any opacity components of the source, copied as-is.
pub fn normalize(image: NativeImage) -> Result<NativeImage, Jp2Error> {
    if !needs_normalization(&image) {
        return Ok(image);
    }
    debug!(
        color_space = ?image.color_space(),
        components = image.num_components(),
        "converting to sRGB"
    );
    let target = ColorProfile::new_srgb();
    let rgb = if image.color_space() == ColorSpace::Sycc {
        sycc_to_srgb(&image)?
    } else {
        transform_to(&image, &target)?
    };

    let params = ComponentParams::unsigned8(image.width(), image.height());
    let mut components = Vec::with_capacity(3 + image.num_components());
    for (kind, samples) in [ComponentType::Red, ComponentType::Green, ComponentType::Blue]
        .into_iter()
        .zip(rgb)
    {
        components.push(Component::from_samples(params, kind, samples)?);
    }
    components.extend(
        image
            .components()
            .iter()
            .filter(|c| c.kind() == ComponentType::Opacity)
            .cloned(),
    );

    let mut out = NativeImage::from_components(components, ColorSpace::Srgb);
    out.set_profile(Some(target));
    out.set_capture_resolution(image.capture_resolution().copied());
    out.set_display_resolution(image.display_resolution().copied());
    Ok(out)
}

/// Indices of the color (non-opacity) components feeding the transform, in
/// the order the source profile expects them.
fn color_components(image: &NativeImage) -> Result<(Layout, Vec<usize>), Jp2Error> {
    let by_type = |kinds: &[ComponentType]| -> Result<Vec<usize>, Jp2Error> {
        kinds
            .iter()
            .map(|&k| {
                image.component_by_type(k).ok_or_else(|| {
                    Jp2Error::ProfileConversion(format!("no {k:?} component to convert"))
                })
            })
            .collect()
    };
    match image.color_space().family() {
        ColorFamily::Rgb => Ok((
            Layout::Rgb,
            by_type(&[ComponentType::Red, ComponentType::Green, ComponentType::Blue])?,
        )),
        ColorFamily::Gray => Ok((Layout::Gray, by_type(&[ComponentType::Gray])?)),
        ColorFamily::Ycc => Ok((
            Layout::Rgb,
            by_type(&[
                ComponentType::Luma,
                ComponentType::ChromaBlue,
                ComponentType::ChromaRed,
            ])?,
        )),
        ColorFamily::Unknown | ColorFamily::Lab => {
            let indices: Vec<usize> = image
                .components()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.kind() != ComponentType::Opacity)
                .map(|(i, _)| i)
                .take(3)
                .collect();
            if indices.len() < 3 {
                return Err(Jp2Error::ProfileConversion(
                    "fewer than three color components".into(),
                ));
            }
            Ok((Layout::Rgb, indices))
        }
    }
}

/// Scale a native sample to 8 bits, removing the signed offset.
fn to_u8(value: i32, precision: u8, signed: bool) -> u8 {
    let precision = u32::from(precision);
    let max = (1i64 << precision) - 1;
    let mut v = i64::from(value);
    if signed {
        v += 1i64 << (precision - 1);
    }
    let v = v.clamp(0, max);
    if precision == 8 {
        v as u8
    } else {
        ((v * 255 + max / 2) / max) as u8
    }
}

/// Gather the given components as interleaved 8-bit rows.
fn interleave_u8(image: &NativeImage, indices: &[usize]) -> Result<Vec<u8>, Jp2Error> {
    let (w, h) = (image.width(), image.height());
    let sources: Vec<&Component> = indices
        .iter()
        .map(|&i| {
            image
                .component(i)
                .filter(|c| c.width() == w && c.height() == h)
                .ok_or_else(|| {
                    Jp2Error::ProfileConversion(format!(
                        "component {i} does not match the {w}x{h} image grid"
                    ))
                })
        })
        .collect::<Result<_, _>>()?;
    let n = sources.len();
    let mut out = vec![0u8; w as usize * h as usize * n];
    for (ch, c) in sources.iter().enumerate() {
        for (px, &s) in c.samples().iter().enumerate() {
            out[px * n + ch] = to_u8(s, c.precision(), c.is_signed());
        }
    }
    Ok(out)
}

fn split_rgb(interleaved: &[u8]) -> [Vec<i32>; 3] {
    let pixels = interleaved.len() / 3;
    let mut planes = [
        Vec::with_capacity(pixels),
        Vec::with_capacity(pixels),
        Vec::with_capacity(pixels),
    ];
    for px in interleaved.chunks_exact(3) {
        for (plane, &v) in planes.iter_mut().zip(px) {
            plane.push(i32::from(v));
        }
    }
    planes
}

fn transform_to(image: &NativeImage, target: &ColorProfile) -> Result<[Vec<i32>; 3], Jp2Error> {
    let source = image
        .profile()
        .ok_or_else(|| Jp2Error::ProfileConversion("image has no profile".into()))?;
    let (layout, indices) = color_components(image)?;
    let options = TransformOptions {
        rendering_intent: RenderingIntent::Perceptual,
        ..Default::default()
    };
    let transform = source
        .create_transform_8bit(layout, target, Layout::Rgb, options)
        .map_err(|e| Jp2Error::ProfileConversion(format!("{e:?}")))?;

    let input = interleave_u8(image, &indices)?;
    let w = image.width() as usize;
    let mut output = vec![0u8; w * image.height() as usize * 3];
    if w > 0 {
        for (src_row, dst_row) in input
            .chunks_exact(w * indices.len())
            .zip(output.chunks_exact_mut(w * 3))
        {
            transform
                .transform(src_row, dst_row)
                .map_err(|e| Jp2Error::ProfileConversion(format!("{e:?}")))?;
        }
    }
    Ok(split_rgb(&output))
}

fn sycc_to_srgb(image: &NativeImage) -> Result<[Vec<i32>; 3], Jp2Error> {
    let (_, indices) = color_components(image)?;
    let ycc = interleave_u8(image, &indices)?;
    let mut rgb = Vec::with_capacity(ycc.len());
    for px in ycc.chunks_exact(3) {
        let y = f32::from(px[0]);
        let cb = f32::from(px[1]) - 128.0;
        let cr = f32::from(px[2]) - 128.0;
        let r = y + 1.402 * cr;
        let g = y - 0.344_136 * cb - 0.714_136 * cr;
        let b = y + 1.772 * cb;
        rgb.extend([r, g, b].map(|v| v.round().clamp(0.0, 255.0) as u8));
    }
    Ok(split_rgb(&rgb))
}
