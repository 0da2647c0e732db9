//! 采集协作者。
//!
//! 流水线把编辑区域视为不透明的可光栅化对象，只需要“当前画面 → 位图”这一能力，
//! 不关心其中的元素、位置与层级。

use super::{Bitmap, ExportError};

/// 将某个区域光栅化为位图。
///
/// `Region` 必须是拥有所有权的只读快照：采集在阻塞线程池中执行，
/// 快照在采集时读取一次，之后编辑区的修改不会影响本次导出。
pub trait Rasterizer: Send + Sync {
    type Region: Send + 'static;

    fn rasterize(&self, region: &Self::Region) -> Result<Bitmap, ExportError>;
}
