//! # 下载端
//!
//! ## 设计思路
//!
//! 导出产物的最终去向抽象为 `DownloadSink`，流水线本身不关心文件落在哪里。
//! 只有完整编码成功的产物才会交给下载端。
//!
//! ## 实现思路
//!
//! - `FileSink`：写入目录，先写临时文件再原子重命名，目录中不会出现半截文件。
//!   临时文件名带进程号与自增序号，并发写入同名产物时互不覆盖。
//! - `MemorySink`：保存在内存里，供测试与嵌入场景读取。
//! - 文件名统一校验：不允许路径分隔符，必须以 `.png` 结尾。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ExportError;

/// 导出产物的下载协作者。
pub trait DownloadSink: Send + Sync {
    /// 接收完整的 PNG 字节，返回产物的落点描述（路径或标识）。
    fn download(&self, bytes: &[u8], file_name: &str) -> Result<String, ExportError>;
}

/// 校验导出文件名。
pub fn validate_file_name(file_name: &str) -> Result<&str, ExportError> {
    let name = file_name.trim();
    if name.is_empty() {
        return Err(ExportError::InvalidFormat("文件名不能为空".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ExportError::InvalidFormat(format!("文件名包含非法路径：{}", name)));
    }
    if !name.to_lowercase().ends_with(".png") || name.len() <= 4 {
        return Err(ExportError::InvalidFormat(format!("文件名必须以 .png 结尾：{}", name)));
    }
    Ok(name)
}

/// 写入本地目录的下载端。
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 本次写入专用的临时文件路径。
    fn temp_path(&self, name: &str) -> PathBuf {
        static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);
        let id = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(".{}.{}-{}.part", name, std::process::id(), id))
    }
}

impl DownloadSink for FileSink {
    fn download(&self, bytes: &[u8], file_name: &str) -> Result<String, ExportError> {
        let name = validate_file_name(file_name)?;

        fs::create_dir_all(&self.dir)
            .map_err(|e| ExportError::Sink(format!("创建输出目录失败：{}", e)))?;

        let final_path = self.dir.join(name);
        let temp_path = self.temp_path(name);

        fs::write(&temp_path, bytes)
            .map_err(|e| ExportError::Sink(format!("写入临时文件失败：{}", e)))?;

        if let Err(err) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(ExportError::Sink(format!("重命名输出文件失败：{}", err)));
        }

        log::info!("💾 已写入导出文件：{} ({} KB)", final_path.display(), bytes.len() / 1024);
        Ok(final_path.display().to_string())
    }
}

/// 保存在内存中的下载端。
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出目前收到的全部产物（文件名，字节）。
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }
}

impl DownloadSink for MemorySink {
    fn download(&self, bytes: &[u8], file_name: &str) -> Result<String, ExportError> {
        let name = validate_file_name(file_name)?.to_string();
        let mut files = self
            .files
            .lock()
            .map_err(|_| ExportError::Sink("内存下载端锁已中毒".to_string()))?;
        files.push((name.clone(), bytes.to_vec()));
        Ok(format!("memory://{}", name))
    }
}
