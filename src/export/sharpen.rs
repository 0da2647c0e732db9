//! 反锐化掩模（unsharp mask）。
//!
//! 原图减去高斯模糊结果得到边缘差值，差值严格大于阈值的通道按强度叠加回原图。
//! 透明通道保持不变。

use image::RgbaImage;

use super::SharpenParams;

/// 对位图执行反锐化掩模，返回新的位图。
pub(crate) fn unsharp_mask(image: &RgbaImage, params: &SharpenParams) -> RgbaImage {
    if params.amount <= 0.0 || params.radius <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let blurred = image::imageops::blur(image, params.radius);
    let factor = params.amount / 100.0;
    let threshold = i16::from(params.threshold);

    let mut output = image.clone();
    for (out, soft) in output.pixels_mut().zip(blurred.pixels()) {
        for channel in 0..3 {
            let original = i16::from(out.0[channel]);
            let diff = original - i16::from(soft.0[channel]);
            if diff == 0 || diff.abs() <= threshold {
                continue;
            }
            let sharpened = f32::from(original) + f32::from(diff) * factor;
            out.0[channel] = sharpened.round().clamp(0.0, 255.0) as u8;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn flat_image_is_unchanged() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([120, 60, 30, 255]));
        let sharpened = unsharp_mask(&image, &SharpenParams::default());

        assert_eq!(sharpened, image);
    }

    #[test]
    fn edges_gain_contrast() {
        let image = RgbaImage::from_fn(16, 4, |x, _| {
            if x < 8 {
                Rgba([60, 60, 60, 255])
            } else {
                Rgba([200, 200, 200, 255])
            }
        });

        let sharpened = unsharp_mask(
            &image,
            &SharpenParams {
                amount: 100.0,
                radius: 1.0,
                threshold: 0,
            },
        );

        assert!(sharpened.get_pixel(7, 1).0[0] < 60);
        assert!(sharpened.get_pixel(8, 1).0[0] > 200);
        assert_eq!(sharpened.get_pixel(0, 1).0[0], 60);
        assert_eq!(sharpened.get_pixel(8, 1).0[3], 255);
    }

    #[test]
    fn zero_amount_is_identity() {
        let image = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 30) as u8, (y * 30) as u8, 0, 255]));
        let params = SharpenParams {
            amount: 0.0,
            ..SharpenParams::default()
        };

        assert_eq!(unsharp_mask(&image, &params), image);
    }
}
