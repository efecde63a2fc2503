#![no_main]
use libfuzzer_sys::fuzz_target;
use zenjp2::*;

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

const SPACES: [ColorSpace; 6] = [
    ColorSpace::Unknown,
    ColorSpace::Srgb,
    ColorSpace::Sgray,
    ColorSpace::Sycc,
    ColorSpace::CieLab,
    ColorSpace::Generic(ColorFamily::Rgb),
];

fuzz_target!(|data: &[u8]| {
    // Header: width, height, color space, component count; then per component
    // precision, signedness, kind and a size divisor; samples come from the rest.
    let [w, h, space, count, rest @ ..] = data else {
        return;
    };
    let (width, height) = (u32::from(*w % 32) + 1, u32::from(*h % 32) + 1);
    let count = usize::from(*count % 70);
    if rest.len() < count * 3 {
        return;
    }
    let (header, mut samples) = rest.split_at(count * 3);

    let mut components = Vec::with_capacity(count);
    for c in header.chunks_exact(3) {
        let subsampled = c[2] & 0x80 != 0;
        let params = ComponentParams {
            width: if subsampled { width.div_ceil(2) } else { width },
            height,
            precision: c[0] % 31 + 1,
            signed: c[1] & 1 != 0,
        };
        let kind = KINDS[usize::from(c[2] & 0x7F) % KINDS.len()];
        let n = (params.width * params.height) as usize;
        let plane: Vec<i32> = (0..n)
            .map(|i| {
                let b = samples.get(i % samples.len().max(1)).copied().unwrap_or(0);
                i32::from(b) << (params.precision.saturating_sub(8))
            })
            .collect();
        samples = samples.get(n.min(samples.len())..).unwrap_or(&[]);
        let Ok(component) = Component::from_samples(params, kind, plane) else {
            return;
        };
        components.push(component);
    }

    let space = SPACES[usize::from(*space) % SPACES.len()];
    let image = NativeImage::from_components(components, space);

    // must never panic
    let Ok(decoded) = DecodeRequest::new()
        .with_stop(&enough::Unstoppable)
        .decode_image(image)
    else {
        return;
    };
    assert_eq!(
        decoded.pixels().len(),
        decoded.width as usize * decoded.height as usize * decoded.channels()
    );
    let _ = decoded.to_bgra8();
});
