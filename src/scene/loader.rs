//! # 图片素材加载与校验
//!
//! ## 设计思路
//!
//! 统一处理不同来源（Data URL / Base64 / 本地文件 / 内存字节）的图片加载，
//! 并在“尽可能早”的阶段执行输入校验，尽快失败，减少不必要的内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! 1. 来源解析：Base64 在解码前先按长度估算体积；文件先读 metadata 体积
//! 2. 文件签名校验（`infer`），拒绝非图片内容
//! 3. 仅读取图片头获取宽高，按像素上限快速拒绝
//! 4. 完整解码并转换为 RGBA

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};

use super::SceneError;
use image::RgbaImage;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径。
    FilePath(PathBuf),
    /// 已在内存中的原始字节。
    Bytes(Vec<u8>),
}

/// 素材加载的资源上限。
#[derive(Debug, Clone, Copy)]
pub struct ImageLoadLimits {
    /// 原始字节体积上限（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
}

impl Default for ImageLoadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
        }
    }
}

/// 加载并解码图片素材。
pub fn load_image(source: &ImageSource, limits: &ImageLoadLimits) -> Result<RgbaImage, SceneError> {
    let (bytes, source_hint) = match source {
        ImageSource::Base64(data) => (parse_base64_with_limit(data, limits.max_file_size)?, "base64"),
        ImageSource::FilePath(path) => (read_file_with_limit(path, limits.max_file_size)?, "file"),
        ImageSource::Bytes(bytes) => {
            validate_byte_size(bytes.len() as u64, limits.max_file_size)?;
            (bytes.clone(), "bytes")
        }
    };

    decode_with_limits(&bytes, limits, source_hint)
}

fn validate_byte_size(size: u64, max_file_size: u64) -> Result<(), SceneError> {
    if size > max_file_size {
        return Err(SceneError::ResourceLimit(format!(
            "图片体积过大：{:.2} MB（限制：{:.2} MB）",
            size as f64 / 1024.0 / 1024.0,
            max_file_size as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

/// 解析 Base64，解码前按字符长度估算体积。
pub(crate) fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, SceneError> {
    let trimmed = data.trim();
    let payload = if trimmed.starts_with("data:") {
        if !trimmed.starts_with("data:image/") {
            return Err(SceneError::InvalidFormat("Data URL 不是图片类型".to_string()));
        }
        let marker = trimmed
            .find(";base64,")
            .ok_or_else(|| SceneError::InvalidFormat("缺少 base64 标记".to_string()))?;
        &trimmed[marker + ";base64,".len()..]
    } else {
        trimmed
    };

    let estimated = (payload.len() as u64).saturating_mul(3) / 4;
    validate_byte_size(estimated, max_file_size)?;

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| SceneError::Decode(format!("Base64 解码失败：{}", e)))
}

fn read_file_with_limit(path: &Path, max_file_size: u64) -> Result<Vec<u8>, SceneError> {
    log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

    let metadata = std::fs::metadata(path)
        .map_err(|e| SceneError::FileSystem(format!("无法读取文件信息 {}：{}", path.display(), e)))?;
    validate_byte_size(metadata.len(), max_file_size)?;

    std::fs::read(path)
        .map_err(|e| SceneError::FileSystem(format!("无法读取图片文件 {}：{}", path.display(), e)))
}

/// 按文件头签名确认是图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), SceneError> {
    if !infer::is_image(bytes) {
        return Err(SceneError::InvalidFormat("内容不是受支持的图片".to_string()));
    }
    Ok(())
}

/// 仅通过图片头读取宽高，用于在完整解码前做像素限制检查。
fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), SceneError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SceneError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| SceneError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(width: u32, height: u32, max_decoded_pixels: u64) -> Result<(), SceneError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels == 0 {
        return Err(SceneError::InvalidFormat(format!("图片尺寸为空：{}x{}", width, height)));
    }
    if pixels > max_decoded_pixels {
        return Err(SceneError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, max_decoded_pixels
        )));
    }
    Ok(())
}

fn decode_with_limits(
    bytes: &[u8],
    limits: &ImageLoadLimits,
    source_hint: &str,
) -> Result<RgbaImage, SceneError> {
    validate_image_signature(bytes)?;

    let (header_width, header_height) = inspect_dimensions(bytes)?;
    validate_pixel_limits(header_width, header_height, limits.max_decoded_pixels)?;

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| SceneError::Decode(format!("图片解码失败：{}", e)))?
        .to_rgba8();

    log::info!(
        "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
        source_hint,
        decoded.width(),
        decoded.height()
    );

    Ok(decoded)
}
