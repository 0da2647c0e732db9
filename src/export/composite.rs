//! # 合成模块
//!
//! ## 设计思路
//!
//! 最终画布尺寸严格等于目标分辨率。先整体填充不透明背景，避免透明区域
//! 在导出文件中变成棋盘格或黑边；再把第一次重采样的中间图截取目标大小的
//! 窗口，做第二次滤波重采样后叠加到背景上。
//!
//! ## 实现思路
//!
//! - 截取窗口尺寸为 `min(目标, 中间图)`，位置由 `Alignment` 决定。
//! - `TopLeft` 保留左上角对齐：适配阶段算出的偏移不参与定位。
//! - `Centered` 使用适配偏移（取反即为中间图内的起点）做居中裁剪。
//! - 中间图因舍入略小于目标时，第二次重采样负责补足到精确尺寸。

use super::{
    Alignment, Bitmap, CropWindow, ExportConfig, ExportError, FitTransform, ResampleTarget,
    Resampler,
};

/// 计算合成阶段在中间图中截取的窗口。
pub fn crop_window(
    intermediate: (u32, u32),
    target: (u32, u32),
    fit: &FitTransform,
    alignment: Alignment,
) -> CropWindow {
    let (pw, ph) = intermediate;
    let (tw, th) = target;
    let width = tw.min(pw);
    let height = th.min(ph);

    let (left, top) = match alignment {
        Alignment::TopLeft => (0, 0),
        Alignment::Centered => (
            centered_origin(fit.offset_x, pw - width),
            centered_origin(fit.offset_y, ph - height),
        ),
    };

    CropWindow {
        left,
        top,
        width,
        height,
    }
}

fn centered_origin(offset: f64, max_origin: u32) -> u32 {
    let origin = (-offset).round();
    if !origin.is_finite() || origin <= 0.0 {
        return 0;
    }
    (origin as u64).min(u64::from(max_origin)) as u32
}

/// 将中间图合成到目标尺寸的最终画布上。
pub(crate) fn composite_onto_background(
    intermediate: &Bitmap,
    fit: &FitTransform,
    target: (u32, u32),
    config: &ExportConfig,
    resampler: &dyn Resampler,
) -> Result<Bitmap, ExportError> {
    let (tw, th) = target;
    let window = crop_window(intermediate.dimensions(), target, fit, config.alignment);

    let fitted = resampler.resample(intermediate, ResampleTarget::new(tw, th).with_crop(window), None)?;
    if fitted.dimensions() != target {
        return Err(ExportError::Resample(format!(
            "合成重采样输出尺寸异常：{}x{}（期望 {}x{}）",
            fitted.width(),
            fitted.height(),
            tw,
            th
        )));
    }

    let [r, g, b, _] = config.background;
    let mut canvas = Bitmap::filled(tw, th, [r, g, b, 255]).into_image();
    image::imageops::overlay(&mut canvas, fitted.as_image(), 0, 0);

    for pixel in canvas.pixels_mut() {
        pixel.0[3] = 255;
    }

    log::debug!(
        "🖼️ 合成完成：中间图 {}x{} 截取 {:?} -> {}x{}（alignment={}）",
        intermediate.width(),
        intermediate.height(),
        window,
        tw,
        th,
        config.alignment
    );

    Ok(Bitmap::from(canvas))
}
