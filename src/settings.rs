//! 导出偏好设置
//!
//! 以 JSON 文件保存用户的导出偏好（分辨率、质量档位、对齐方式、背景色、输出目录、文件名）。
//! 所有字段都是可选的：未设置的字段沿用默认值，命令行参数再覆盖设置文件。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::export::{Alignment, ExportQualityProfile, ExportService, Resolution};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub resolution: Option<Resolution>,
    pub profile: Option<ExportQualityProfile>,
    pub alignment: Option<Alignment>,
    /// `#rrggbb`
    pub background: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub file_name: Option<String>,
}

impl AppSettings {
    /// 将设置中已填写的导出参数应用到服务配置。
    pub fn apply_to(&self, service: &ExportService) -> Result<(), AppError> {
        if let Some(profile) = self.profile {
            service.set_quality_profile(profile)?;
        }
        if let Some(alignment) = self.alignment {
            service.set_alignment(alignment)?;
        }
        if let Some(background) = &self.background {
            service.set_background(parse_hex_color(background)?)?;
        }
        if let Some(file_name) = &self.file_name {
            service.set_file_name(file_name)?;
        }
        Ok(())
    }
}

/// 读取设置文件，文件不存在时返回 `None`。
pub fn load_settings(path: &Path) -> Result<Option<AppSettings>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<AppSettings>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    Ok(Some(parsed))
}

/// 保存设置文件，必要时创建父目录。
pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}

/// 解析 `#rrggbb` 颜色为不透明 RGBA。
pub fn parse_hex_color(value: &str) -> Result<[u8; 4], AppError> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::Settings(format!("颜色格式无效: {}（应为 #rrggbb）", value)));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|e| AppError::Settings(format!("颜色格式无效: {}: {}", value, e)))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])
}
