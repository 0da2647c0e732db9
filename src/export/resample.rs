//! # 重采样模块
//!
//! ## 设计思路
//!
//! 流水线只依赖 `Resampler` trait，具体滤镜实现可替换。
//! 默认实现 `ConvolutionResampler` 基于 `fast_image_resize` 的卷积缩放，
//! 失败时回退到 `image::imageops::resize`，两者都失败才上报错误。
//!
//! ## 实现思路
//!
//! 1. 校验源图与目标尺寸（零尺寸直接拒绝）
//! 2. 按需截取源图窗口（合成阶段用于 cover 裁剪）
//! 3. 卷积缩放到目标尺寸
//! 4. 若给出锐化参数，再执行反锐化掩模

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::RgbaImage;

use super::sharpen::unsharp_mask;
use super::{Bitmap, ExportError, SharpenParams};

/// 源图中参与重采样的矩形窗口（像素坐标）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    /// 检查窗口是否完全落在给定尺寸内。
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && u64::from(self.left) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.top) + u64::from(self.height) <= u64::from(height)
    }
}

/// 重采样目标：输出尺寸与可选的源窗口。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleTarget {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropWindow>,
}

impl ResampleTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: None,
        }
    }

    pub fn with_crop(mut self, crop: CropWindow) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// 重采样协作者。
///
/// 实现需保证输出尺寸严格等于 `target` 给出的宽高。
pub trait Resampler: Send + Sync {
    fn resample(
        &self,
        source: &Bitmap,
        target: ResampleTarget,
        sharpen: Option<&SharpenParams>,
    ) -> Result<Bitmap, ExportError>;
}

/// 基于卷积滤镜的默认重采样实现。
#[derive(Debug, Clone, Copy)]
pub struct ConvolutionResampler {
    filter: FilterType,
}

impl ConvolutionResampler {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    fn resize_with_fast_image_resize(
        &self,
        source: &Bitmap,
        target: ResampleTarget,
    ) -> Result<RgbaImage, ExportError> {
        let (src_width, src_height) = source.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            source.as_raw().to_vec(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| ExportError::Resample(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target.width, target.height, fr::PixelType::U8x4);

        let mut options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(self.filter)));
        if let Some(crop) = target.crop {
            options = options.crop(
                f64::from(crop.left),
                f64::from(crop.top),
                f64::from(crop.width),
                f64::from(crop.height),
            );
        }

        let mut resizer = fr::Resizer::new();
        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ExportError::Resample(format!("fast_image_resize 执行失败：{}", e)))?;

        RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
            .ok_or_else(|| ExportError::Resample("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    fn resize_with_imageops(&self, source: &Bitmap, target: ResampleTarget) -> RgbaImage {
        match target.crop {
            Some(crop) => {
                let window = image::imageops::crop_imm(
                    source.as_image(),
                    crop.left,
                    crop.top,
                    crop.width,
                    crop.height,
                )
                .to_image();
                image::imageops::resize(&window, target.width, target.height, self.filter)
            }
            None => image::imageops::resize(source.as_image(), target.width, target.height, self.filter),
        }
    }
}

impl Default for ConvolutionResampler {
    fn default() -> Self {
        Self::new(FilterType::Lanczos3)
    }
}

impl Resampler for ConvolutionResampler {
    fn resample(
        &self,
        source: &Bitmap,
        target: ResampleTarget,
        sharpen: Option<&SharpenParams>,
    ) -> Result<Bitmap, ExportError> {
        if source.is_empty() {
            return Err(ExportError::Resample(format!(
                "源图尺寸为空：{}x{}",
                source.width(),
                source.height()
            )));
        }
        if target.width == 0 || target.height == 0 {
            return Err(ExportError::Resample(format!(
                "目标尺寸无效：{}x{}",
                target.width, target.height
            )));
        }
        if let Some(crop) = target.crop {
            if !crop.fits_within(source.width(), source.height()) {
                return Err(ExportError::Resample(format!(
                    "截取窗口越界：{:?}（源图 {}x{}）",
                    crop,
                    source.width(),
                    source.height()
                )));
            }
        }

        let resized = match self.resize_with_fast_image_resize(source, target) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 重采样失败，回退 image::imageops::resize：{}", err);
                self.resize_with_imageops(source, target)
            }
        };

        let output = match sharpen {
            Some(params) => unsharp_mask(&resized, params),
            None => resized,
        };

        log::debug!(
            "🧩 重采样：{}x{} -> {}x{}（filter={:?}, crop={:?}, sharpen={}）",
            source.width(),
            source.height(),
            target.width,
            target.height,
            self.filter,
            target.crop,
            sharpen.is_some()
        );

        Ok(Bitmap::from(output))
    }
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
