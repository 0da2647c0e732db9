//! # 配置模块
//!
//! ## 设计思路
//!
//! 将导出链路中所有“可调策略”集中到 `ExportConfig`：重采样滤镜、锐化参数、
//! 背景色、对齐方式、PNG 压缩级别与内存上限。
//! 质量档位（quality / balanced / speed）作为高层语义，映射到底层参数组合。
//!
//! ## 实现思路
//!
//! - `Default` 等同于 quality 档位，与界面“最高画质”导出保持一致。
//! - `ExportQualityProfile` 负责档位字符串解析与反向输出。
//! - `apply_quality_profile` 将档位转换为具体参数。
//! - `infer_quality_profile` 用于从当前配置反推档位（给界面展示状态）。

use std::fmt;
use std::str::FromStr;

use image::codecs::png::CompressionType;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::ExportError;

/// 默认导出文件名。
pub const DEFAULT_FILE_NAME: &str = "my-image.png";

/// 反锐化掩模参数。
///
/// - `amount`：增强强度（百分比，80 表示 0.8 倍差值）
/// - `radius`：高斯模糊半径（像素，sigma）
/// - `threshold`：差值阈值（0~255），不超过阈值的差值不做增强
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpenParams {
    pub amount: f32,
    pub radius: f32,
    pub threshold: u8,
}

impl Default for SharpenParams {
    fn default() -> Self {
        Self {
            amount: 80.0,
            radius: 0.6,
            threshold: 1,
        }
    }
}

/// 合成阶段从中间图中截取目标画框的位置。
///
/// - `TopLeft`：内容左上角与画布左上角对齐，溢出部分从右侧/底部裁掉
/// - `Centered`：应用适配阶段计算出的居中偏移，两侧均匀裁掉
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    TopLeft,
    Centered,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::Centered => "centered",
        }
    }
}

impl FromStr for Alignment {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "top-left" | "topleft" => Ok(Self::TopLeft),
            "centered" | "center" => Ok(Self::Centered),
            other => Err(ExportError::InvalidFormat(format!(
                "未知对齐方式：{}（可选：top-left / centered）",
                other
            ))),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 导出配置。
///
/// 字段覆盖了重采样、合成、编码与输出四个阶段。
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// 两次重采样使用的卷积滤镜。
    pub resize_filter: FilterType,
    /// 第一次重采样后的锐化参数，`None` 表示不锐化。
    pub sharpen: Option<SharpenParams>,
    /// 最终画布的背景色（RGBA），合成时强制为不透明。
    pub background: [u8; 4],
    /// 合成阶段的截取位置。
    pub alignment: Alignment,
    /// PNG 压缩级别。
    pub png_compression: CompressionType,
    /// 第一次重采样中间图的像素上限（`width * height`）。
    pub max_intermediate_pixels: u64,
    /// 交给下载端的文件名。
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resize_filter: FilterType::Lanczos3,
            sharpen: Some(SharpenParams::default()),
            background: [255, 255, 255, 255],
            alignment: Alignment::TopLeft,
            png_compression: CompressionType::Best,
            max_intermediate_pixels: 200_000_000,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

/// 导出质量档位（面向产品/用户语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与耗时平衡
/// - `Speed`：优先导出速度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQualityProfile {
    Quality,
    Balanced,
    Speed,
}

impl ExportQualityProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use canvas_export::export::ExportQualityProfile;
    ///
    /// let p = ExportQualityProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), canvas_export::export::ExportError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, ExportError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ExportError::InvalidFormat(format!(
                "未知质量档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供界面展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl ExportConfig {
    /// 基于当前参数反推质量档位。
    pub fn infer_quality_profile(&self) -> ExportQualityProfile {
        if self.sharpen.is_none() || matches!(self.resize_filter, FilterType::Nearest | FilterType::Triangle) {
            return ExportQualityProfile::Speed;
        }

        if matches!(self.resize_filter, FilterType::Lanczos3)
            && matches!(self.png_compression, CompressionType::Best)
        {
            return ExportQualityProfile::Quality;
        }

        ExportQualityProfile::Balanced
    }

    /// 应用指定质量档位到实际参数。
    ///
    /// 只改动与画质/耗时相关的字段，背景色、对齐方式与文件名保持不变。
    pub fn apply_quality_profile(&mut self, profile: ExportQualityProfile) {
        match profile {
            ExportQualityProfile::Quality => {
                self.resize_filter = FilterType::Lanczos3;
                self.sharpen = Some(SharpenParams::default());
                self.png_compression = CompressionType::Best;
            }
            ExportQualityProfile::Balanced => {
                self.resize_filter = FilterType::CatmullRom;
                self.sharpen = Some(SharpenParams::default());
                self.png_compression = CompressionType::Default;
            }
            ExportQualityProfile::Speed => {
                self.resize_filter = FilterType::Triangle;
                self.sharpen = None;
                self.png_compression = CompressionType::Fast;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_quality_profile() {
        let config = ExportConfig::default();

        assert_eq!(config.infer_quality_profile(), ExportQualityProfile::Quality);
        assert_eq!(config.sharpen, Some(SharpenParams::default()));
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
        assert_eq!(config.alignment, Alignment::TopLeft);
    }

    #[test]
    fn applied_profile_is_inferred_back() {
        let mut config = ExportConfig::default();

        for profile in [
            ExportQualityProfile::Speed,
            ExportQualityProfile::Balanced,
            ExportQualityProfile::Quality,
        ] {
            config.apply_quality_profile(profile);
            assert_eq!(config.infer_quality_profile(), profile);
        }
    }

    #[test]
    fn profile_keeps_background_and_alignment() {
        let mut config = ExportConfig {
            background: [0, 0, 0, 255],
            alignment: Alignment::Centered,
            ..ExportConfig::default()
        };

        config.apply_quality_profile(ExportQualityProfile::Speed);

        assert_eq!(config.background, [0, 0, 0, 255]);
        assert_eq!(config.alignment, Alignment::Centered);
        assert!(config.sharpen.is_none());
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(matches!(
            ExportQualityProfile::from_str("ultra"),
            Err(ExportError::InvalidFormat(_))
        ));
        assert_eq!(
            ExportQualityProfile::from_str(" Speed ").ok(),
            Some(ExportQualityProfile::Speed)
        );
    }

    #[test]
    fn alignment_parses_aliases() {
        assert_eq!("center".parse::<Alignment>().ok(), Some(Alignment::Centered));
        assert_eq!("TOP-LEFT".parse::<Alignment>().ok(), Some(Alignment::TopLeft));
        assert!("bottom".parse::<Alignment>().is_err());
    }
}
