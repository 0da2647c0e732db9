//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 导出链路的每个阶段（采集 / 重采样 / 编码 / 落盘）各自对应一个错误分支，
//! 调用侧可以按分支匹配，决定向用户展示哪一类失败。
//! 任一阶段失败都会短路整条流水线，不会产出半成品。

/// 导出流水线统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("采集失败：{0}")]
    Capture(String),

    #[error("重采样失败：{0}")]
    Resample(String),

    #[error("编码失败：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("输出失败：{0}")]
    Sink(String),

    #[error("导出配置不可用：{0}")]
    Config(String),

    #[error("已有导出任务正在进行")]
    Busy,
}

impl From<ExportError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: ExportError) -> Self {
        error.to_string()
    }
}
