//! # 位图模型
//!
//! 流水线各阶段之间传递的 RGBA 像素网格。位图一经构造便不可变，
//! 每个阶段都产出新的位图，而不是原地修改上一阶段的结果。

use image::{Rgba, RgbaImage};

use super::ExportError;

/// 不可变的 RGBA8 位图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    /// 从原始 RGBA 字节构造位图，并校验字节长度与宽高一致。
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, ExportError> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ExportError::ResourceLimit("位图尺寸导致内存溢出风险".to_string()))?;

        if bytes.len() != expected_len {
            return Err(ExportError::InvalidFormat(format!(
                "像素数据长度异常：{}（期望 {}）",
                bytes.len(),
                expected_len
            )));
        }

        let image = RgbaImage::from_raw(width, height, bytes)
            .ok_or_else(|| ExportError::InvalidFormat("无法构建位图缓冲".to_string()))?;
        Ok(Self { image })
    }

    /// 构造一张纯色位图。
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(color)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 任一边为零时视为空位图，流水线会拒绝处理。
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// 读取单个像素，越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y).0)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl From<RgbaImage> for Bitmap {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}
