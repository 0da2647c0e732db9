//! 编辑区错误类型。

use super::ElementId;

/// 场景编辑与素材加载的统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("文本内容为空")]
    EmptyText,

    #[error("元素不存在：{0}")]
    NotFound(ElementId),

    #[error("元素不是图片：{0}")]
    NotAnImage(ElementId),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("场景包含 {0} 个文本元素，但未提供字体")]
    MissingFont(usize),
}
