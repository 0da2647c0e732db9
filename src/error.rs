//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，汇总导出流水线、编辑区与设置读写的错误，
//! 命令行入口只需处理这一种错误类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ExportError` / `SceneError` / `io::Error` 提供 `From` 转换，`?` 直接传播。
//! - 实现 `Serialize` 将错误序列化为字符串，便于以 JSON 形式输出。

use serde::Serialize;

use crate::export::ExportError;
use crate::scene::SceneError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 导出流水线错误（采集 / 重采样 / 编码 / 下载）
    #[error("{0}")]
    Export(#[from] ExportError),

    /// 编辑区错误（元素操作 / 素材加载 / 场景文档）
    #[error("{0}")]
    Scene(#[from] SceneError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置读写失败
    #[error("设置错误: {0}")]
    Settings(String),
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_message_string() {
        let err = AppError::from(ExportError::Busy);
        let json = serde_json::to_string(&err).expect("serialize failed");

        assert_eq!(json, serde_json::to_string(&ExportError::Busy.to_string()).expect("serialize failed"));
    }

    #[test]
    fn question_mark_converts_module_errors() {
        fn fails() -> Result<(), AppError> {
            let scene: Result<(), SceneError> = Err(SceneError::EmptyText);
            scene?;
            Ok(())
        }
        assert!(matches!(fails(), Err(AppError::Scene(SceneError::EmptyText))));
    }
}
