//! # 编码模块
//!
//! 把最终位图序列化为 PNG 字节，并封装成一次导出的产物。

use base64::{Engine as _, engine::general_purpose};
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::{Bitmap, ExportError};

/// 单次导出的产物。
///
/// 每次调用生成一次，交给下载端后即丢弃，不保留任何状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// 输出 `data:image/png;base64,...` 形式的 Data URL。
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// 将位图编码为 PNG 字节。
pub(crate) fn encode_png(bitmap: &Bitmap, compression: CompressionType) -> Result<Vec<u8>, ExportError> {
    if bitmap.is_empty() {
        return Err(ExportError::Encode(format!(
            "无法编码空位图：{}x{}",
            bitmap.width(),
            bitmap.height()
        )));
    }

    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, compression, PngFilterType::Adaptive)
        .write_image(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::Encode(format!("PNG 编码失败：{}", e)))?;

    Ok(bytes)
}
