//! # 缩放适配计算
//!
//! ## 设计思路
//!
//! 采用 cover 适配：缩放到内容在两个方向上都铺满目标画框，
//! 多出的部分在合成阶段被裁掉，换取主方向上没有留边。
//!
//! ## 实现思路
//!
//! 纯函数：输入内容尺寸与目标尺寸，输出缩放比例、缩放后尺寸与居中偏移。
//! 偏移在 cover 适配下通常 ≤ 0，表示缩放后的内容溢出画框。

use super::ExportError;

/// 由内容尺寸与目标尺寸推导出的缩放变换。
///
/// 不做存储，每次导出重新计算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FitTransform {
    /// 计算 cover 适配变换。
    ///
    /// 任一内容边为零时无法推导比例，按采集失败处理。
    pub fn cover(
        content_width: u32,
        content_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Self, ExportError> {
        if content_width == 0 || content_height == 0 {
            return Err(ExportError::Capture(format!(
                "采集结果尺寸为空：{}x{}",
                content_width, content_height
            )));
        }
        if target_width == 0 || target_height == 0 {
            return Err(ExportError::Resample(format!(
                "目标尺寸无效：{}x{}",
                target_width, target_height
            )));
        }

        let cw = f64::from(content_width);
        let ch = f64::from(content_height);
        let tw = f64::from(target_width);
        let th = f64::from(target_height);

        let scale = (tw / cw).max(th / ch);
        let scaled_width = cw * scale;
        let scaled_height = ch * scale;

        Ok(Self {
            scale,
            scaled_width,
            scaled_height,
            offset_x: (tw - scaled_width) / 2.0,
            offset_y: (th - scaled_height) / 2.0,
        })
    }

    /// 中间画布的像素宽度（四舍五入）。
    pub fn pixel_width(&self) -> u32 {
        round_to_pixels(self.scaled_width)
    }

    /// 中间画布的像素高度（四舍五入）。
    pub fn pixel_height(&self) -> u32 {
        round_to_pixels(self.scaled_height)
    }

    /// 中间画布像素尺寸，任一边舍入为零时报错。
    pub fn pixel_dimensions(&self) -> Result<(u32, u32), ExportError> {
        let (width, height) = (self.pixel_width(), self.pixel_height());
        if width == 0 || height == 0 {
            return Err(ExportError::Resample(format!(
                "缩放后尺寸舍入为零：{:.3}x{:.3}",
                self.scaled_width, self.scaled_height
            )));
        }
        Ok((width, height))
    }
}

fn round_to_pixels(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}
