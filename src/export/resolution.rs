//! # 目标分辨率
//!
//! 导出时可选的固定档位。档位名称与界面下拉框保持一致，
//! 便于设置文件与命令行直接复用同一套字符串。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ExportError;

/// 导出目标分辨率档位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// 3840×2160
    #[serde(rename = "4K")]
    FourK,
    /// 1920×1080
    #[default]
    #[serde(rename = "1080p")]
    FullHd,
    /// 1280×720
    #[serde(rename = "720p")]
    Hd,
}

impl Resolution {
    pub fn width(self) -> u32 {
        match self {
            Self::FourK => 3840,
            Self::FullHd => 1920,
            Self::Hd => 1280,
        }
    }

    pub fn height(self) -> u32 {
        match self {
            Self::FourK => 2160,
            Self::FullHd => 1080,
            Self::Hd => 720,
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// 稳定的档位名称，供界面展示与设置持久化。
    pub fn label(self) -> &'static str {
        match self {
            Self::FourK => "4K",
            Self::FullHd => "1080p",
            Self::Hd => "720p",
        }
    }

    /// 按界面展示顺序列出全部档位。
    pub fn all() -> &'static [Resolution] {
        &[Self::FourK, Self::FullHd, Self::Hd]
    }
}

impl FromStr for Resolution {
    type Err = ExportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "4k" | "2160p" => Ok(Self::FourK),
            "1080p" => Ok(Self::FullHd),
            "720p" => Ok(Self::Hd),
            other => Err(ExportError::InvalidFormat(format!(
                "未知分辨率：{}（可选：4K / 1080p / 720p）",
                other
            ))),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
