//! # 文本排版与绘制
//!
//! 单行文本，固定字号与内边距（不支持样式）。
//! 有字体时使用 `fontdue` 测量并光栅化字形；没有字体时按平均字宽估算尺寸，
//! 绘制阶段跳过字形，只保留元素占位。

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use image::RgbaImage;

use super::{SceneError, Size};

/// 文本字号（CSS 像素）。
pub const TEXT_FONT_SIZE: f32 = 16.0;
/// 文本元素四周的内边距（CSS 像素）。
pub const TEXT_PADDING: f32 = 8.0;
const LINE_HEIGHT_RATIO: f32 = 1.5;
const FALLBACK_ADVANCE_RATIO: f32 = 0.6;

/// 文本测量与绘制所需的字体信息。
#[derive(Clone, Default)]
pub struct TextMetrics {
    font: Option<Arc<Font>>,
}

impl fmt::Debug for TextMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextMetrics")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextMetrics {
    pub fn with_font(font: Font) -> Self {
        Self {
            font: Some(Arc::new(font)),
        }
    }

    /// 从字体字节构造。
    pub fn from_font_bytes(bytes: &[u8]) -> Result<Self, SceneError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| SceneError::Decode(format!("字体解析失败：{}", e)))?;
        Ok(Self::with_font(font))
    }

    /// 从字体文件构造。
    pub fn from_font_file(path: &Path) -> Result<Self, SceneError> {
        let bytes = std::fs::read(path)
            .map_err(|e| SceneError::FileSystem(format!("无法读取字体文件 {}：{}", path.display(), e)))?;
        Self::from_font_bytes(&bytes)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn line_height(&self) -> f32 {
        TEXT_FONT_SIZE * LINE_HEIGHT_RATIO
    }

    /// 文本内容本身的宽高（不含内边距）。
    pub fn measure(&self, text: &str) -> Size {
        let width = match &self.font {
            Some(font) => text
                .chars()
                .map(|ch| font.metrics(ch, TEXT_FONT_SIZE).advance_width)
                .sum(),
            None => text.chars().count() as f32 * TEXT_FONT_SIZE * FALLBACK_ADVANCE_RATIO,
        };
        Size::new(width, self.line_height())
    }

    /// 文本元素的外框尺寸（含内边距）。
    pub fn box_size(&self, text: &str) -> Size {
        let content = self.measure(text);
        Size::new(
            content.width + TEXT_PADDING * 2.0,
            content.height + TEXT_PADDING * 2.0,
        )
    }

    /// 在画布上绘制文本，`origin` 为内容区左上角（设备像素）。
    ///
    /// 返回是否真正绘制了字形。
    pub(crate) fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        origin: (f32, f32),
        scale: f32,
        color: [u8; 3],
    ) -> bool {
        let Some(font) = &self.font else {
            return false;
        };

        let px = TEXT_FONT_SIZE * scale;
        let line_height = self.line_height() * scale;
        let ascent = font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent)
            .unwrap_or(px * 0.8);
        let descent = font
            .horizontal_line_metrics(px)
            .map(|m| m.descent)
            .unwrap_or(-px * 0.2);
        // 行内垂直居中
        let baseline = origin.1 + (line_height - (ascent - descent)) / 2.0 + ascent;

        let mut cursor_x = origin.0;
        for ch in text.chars() {
            let (metrics, coverage) = font.rasterize(ch, px);
            let glyph_x = (cursor_x + metrics.xmin as f32).round() as i64;
            let glyph_y = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = coverage[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }
                    let x = glyph_x + gx as i64;
                    let y = glyph_y + gy as i64;
                    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
                        continue;
                    }
                    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                    blend_channel(&mut pixel.0, color, alpha);
                }
            }

            cursor_x += metrics.advance_width;
        }

        true
    }
}

fn blend_channel(dst: &mut [u8; 4], color: [u8; 3], coverage: u8) {
    let a = u32::from(coverage);
    for channel in 0..3 {
        let blended = (u32::from(color[channel]) * a + u32::from(dst[channel]) * (255 - a) + 127) / 255;
        dst[channel] = blended as u8;
    }
    let alpha = u32::from(dst[3]);
    dst[3] = (a + alpha * (255 - a) / 255).min(255) as u8;
}
