//! # 服务层
//!
//! ## 设计思路
//!
//! `ExportService` 是对外的导出入口，内部持有 `ExportHandler`。
//! 同一服务实例同一时刻只允许一次导出：第二次触发直接返回 `ExportError::Busy`，
//! 而不是与进行中的导出并发读取同一块编辑区域。
//!
//! ## 实现思路
//!
//! - 进行中标志使用 `AtomicBool` + `compare_exchange` 抢占。
//! - `InFlightGuard` 采用 RAII 模式：抢占成功时构造，`Drop` 时释放标志，
//!   无论导出成功、失败还是 future 被丢弃都能恢复。
//! - `export_and_download` 的守卫覆盖到下载结束，下载端不会被两次导出交错写入。
//! - 只有完整成功的产物才会交给下载端。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{
    Alignment, DownloadSink, ExportArtifact, ExportConfig, ExportError, ExportHandler,
    ExportQualityProfile, Rasterizer, Resolution,
};

/// 进行中导出的 RAII 守卫。
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ExportError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ExportError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// 导出服务。
pub struct ExportService {
    handler: ExportHandler,
    in_flight: AtomicBool,
}

/// 一次“导出并下载”的结果。
#[derive(Debug, Clone)]
pub struct DownloadReceipt {
    pub location: String,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

impl ExportService {
    /// 使用默认配置创建服务。
    ///
    /// # 示例
    /// ```rust
    /// use canvas_export::export::{ExportQualityProfile, ExportService};
    ///
    /// let service = ExportService::new();
    /// assert_eq!(service.quality_profile()?, ExportQualityProfile::Quality);
    /// # Ok::<(), canvas_export::export::ExportError>(())
    /// ```
    pub fn new() -> Self {
        Self::with_config(ExportConfig::default())
    }

    /// 使用自定义配置创建服务。
    pub fn with_config(config: ExportConfig) -> Self {
        Self {
            handler: ExportHandler::new(config),
            in_flight: AtomicBool::new(false),
        }
    }

    /// 当前是否有导出正在进行。
    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 执行完整导出流程：采集→适配→重采样→合成→编码。
    pub async fn export<R>(
        &self,
        rasterizer: Arc<R>,
        region: R::Region,
        resolution: Resolution,
    ) -> Result<ExportArtifact, ExportError>
    where
        R: Rasterizer + 'static,
    {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        self.run_export(rasterizer, region, resolution).await
    }

    /// 导出并交给下载端。失败时下载端不会收到任何字节。
    ///
    /// 进行中标志一直持有到下载完成。
    pub async fn export_and_download<R, S>(
        &self,
        rasterizer: Arc<R>,
        region: R::Region,
        resolution: Resolution,
        sink: &S,
    ) -> Result<DownloadReceipt, ExportError>
    where
        R: Rasterizer + 'static,
        S: DownloadSink + ?Sized,
    {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let artifact = self.run_export(rasterizer, region, resolution).await?;
        let location = sink.download(&artifact.bytes, &artifact.file_name).map_err(|err| {
            log::error!("❌ 下载失败：{}", err);
            err
        })?;

        Ok(DownloadReceipt {
            location,
            file_name: artifact.file_name,
            width: artifact.width,
            height: artifact.height,
            size_bytes: artifact.bytes.len(),
        })
    }

    /// 调用方需已持有 `InFlightGuard`。
    async fn run_export<R>(
        &self,
        rasterizer: Arc<R>,
        region: R::Region,
        resolution: Resolution,
    ) -> Result<ExportArtifact, ExportError>
    where
        R: Rasterizer + 'static,
    {
        log::info!("🚀 开始导出 - 目标分辨率: {}", resolution);

        let result = self.handler.export(rasterizer, region, resolution).await;
        if let Err(err) = &result {
            log::error!("❌ 导出失败：{}", err);
        }
        result
    }

    pub fn set_quality_profile(&self, profile: ExportQualityProfile) -> Result<(), ExportError> {
        self.handler.set_quality_profile(profile)
    }

    pub fn quality_profile(&self) -> Result<ExportQualityProfile, ExportError> {
        self.handler.quality_profile()
    }

    pub fn set_alignment(&self, alignment: Alignment) -> Result<(), ExportError> {
        self.handler.set_alignment(alignment)
    }

    pub fn set_background(&self, background: [u8; 4]) -> Result<(), ExportError> {
        self.handler.set_background(background)
    }

    pub fn set_file_name(&self, file_name: &str) -> Result<(), ExportError> {
        self.handler.set_file_name(file_name)
    }

    /// 读取当前配置快照。
    pub fn config(&self) -> Result<ExportConfig, ExportError> {
        self.handler.config_snapshot()
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}
