#![no_main]
use libfuzzer_sys::fuzz_target;
use zenjp2::*;

fuzz_target!(|data: &[u8]| {
    // Lossless split then reassembly must reproduce every byte, swizzled from
    // blue-first to red-first.
    let [w, channels, pixels @ ..] = data else {
        return;
    };
    let (channels, layout) = match channels % 3 {
        0 => (1, PixelLayout::Gray8),
        1 => (3, PixelLayout::Bgr8),
        _ => (4, PixelLayout::Bgra8),
    };
    let width = u32::from(*w % 64) + 1;
    let row = width as usize * layout.bytes_per_pixel();
    let height = (pixels.len() / row) as u32;
    if height == 0 {
        return;
    }

    let image = EncodeRequest::new(channels)
        .with_stop(&enough::Unstoppable)
        .build_image(pixels, width, height, row, layout)
        .expect("valid input must build");
    let decoded = DecodeRequest::new()
        .with_stop(&enough::Unstoppable)
        .decode_image(image)
        .expect("built image must decode");

    assert_eq!(decoded.width, width);
    assert_eq!(decoded.height, height);
    for (src, dst) in pixels
        .chunks_exact(channels)
        .zip(decoded.pixels().chunks_exact(channels))
    {
        match channels {
            1 => assert_eq!(dst[0], src[0]),
            3 => assert_eq!(dst, [src[2], src[1], src[0]]),
            _ => assert_eq!(dst, [src[2], src[1], src[0], src[3]]),
        }
    }
});
