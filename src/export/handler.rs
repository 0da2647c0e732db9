//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ExportHandler` 只负责流程编排与配置管理。处理链路固定为：
//! 1. 读取配置快照
//! 2. 采集：区域 → 位图
//! 3. 计算 cover 适配变换
//! 4. 第一次重采样（含锐化）到缩放后尺寸
//! 5. 合成：背景填充 + 第二次重采样到目标尺寸
//! 6. 编码 PNG
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ExportConfig>>` 支持运行时切换档位。
//! - 单次导出内使用“同一配置快照”，避免处理中途配置漂移。
//! - 采集、重采样、编码都是 CPU 密集操作，放到 `spawn_blocking` 中执行，
//!   各阶段严格串行，上一阶段的输出是下一阶段唯一的输入。
//! - 记录 `capture/resample/composite/encode/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::composite::composite_onto_background;
use super::encode::encode_png;
use super::{
    Alignment, Bitmap, ConvolutionResampler, ExportArtifact, ExportConfig, ExportError,
    ExportQualityProfile, FitTransform, Rasterizer, ResampleTarget, Resampler, Resolution,
};

/// 导出处理器。
pub struct ExportHandler {
    pub(super) config: Arc<RwLock<ExportConfig>>,
}

impl ExportHandler {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<ExportConfig, ExportError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ExportError::Config("配置读取锁已中毒".to_string()))
    }

    fn update_config<F>(&self, update: F) -> Result<(), ExportError>
    where
        F: FnOnce(&mut ExportConfig),
    {
        let mut config = self
            .config
            .write()
            .map_err(|_| ExportError::Config("配置写入锁已中毒".to_string()))?;
        update(&mut config);
        Ok(())
    }

    /// 设置质量档位。
    pub fn set_quality_profile(&self, profile: ExportQualityProfile) -> Result<(), ExportError> {
        self.update_config(|config| {
            config.apply_quality_profile(profile);
            log::info!(
                "⚙️ 已切换导出质量档位：{:?}（filter={:?}, sharpen={:?}, png={:?}）",
                profile,
                config.resize_filter,
                config.sharpen,
                config.png_compression
            );
        })
    }

    /// 获取当前生效档位。
    pub fn quality_profile(&self) -> Result<ExportQualityProfile, ExportError> {
        Ok(self.config_snapshot()?.infer_quality_profile())
    }

    pub fn set_alignment(&self, alignment: Alignment) -> Result<(), ExportError> {
        self.update_config(|config| config.alignment = alignment)
    }

    /// 设置背景色，透明度会在合成时被强制为不透明。
    pub fn set_background(&self, background: [u8; 4]) -> Result<(), ExportError> {
        self.update_config(|config| config.background = background)
    }

    pub fn set_file_name(&self, file_name: &str) -> Result<(), ExportError> {
        let name = super::sink::validate_file_name(file_name)?.to_string();
        self.update_config(|config| config.file_name = name)
    }

    /// 导出主入口：采集区域并生成目标分辨率的 PNG。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use canvas_export::export::{ExportConfig, ExportHandler, Resolution};
    /// use canvas_export::scene::{SceneGraph, SceneRasterizer};
    ///
    /// # async fn demo(scene: &SceneGraph) -> Result<(), canvas_export::export::ExportError> {
    /// let handler = ExportHandler::new(ExportConfig::default());
    /// let artifact = handler
    ///     .export(Arc::new(SceneRasterizer::new()), scene.snapshot(), Resolution::FullHd)
    ///     .await?;
    /// assert_eq!((artifact.width, artifact.height), (1920, 1080));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn export<R>(
        &self,
        rasterizer: Arc<R>,
        region: R::Region,
        resolution: Resolution,
    ) -> Result<ExportArtifact, ExportError>
    where
        R: Rasterizer + 'static,
    {
        let config = self.config_snapshot()?;
        let resampler: Arc<dyn Resampler> = Arc::new(ConvolutionResampler::new(config.resize_filter));
        self.export_with_resampler(rasterizer, region, resolution, resampler, config)
            .await
    }

    /// 使用指定重采样器执行导出。
    pub async fn export_with_resampler<R>(
        &self,
        rasterizer: Arc<R>,
        region: R::Region,
        resolution: Resolution,
        resampler: Arc<dyn Resampler>,
        config: ExportConfig,
    ) -> Result<ExportArtifact, ExportError>
    where
        R: Rasterizer + 'static,
    {
        let (target_width, target_height) = resolution.dimensions();
        let total_start = Instant::now();

        let capture_start = Instant::now();
        let captured = run_blocking(ExportError::Capture, move || capture(rasterizer.as_ref(), &region)).await?;
        let capture_elapsed = capture_start.elapsed();

        let fit = FitTransform::cover(
            captured.width(),
            captured.height(),
            target_width,
            target_height,
        )?;
        let (pixel_width, pixel_height) = fit.pixel_dimensions()?;
        validate_intermediate_pixels(&config, pixel_width, pixel_height)?;

        log::info!(
            "📐 适配计算：内容 {}x{} -> 目标 {}（scale={:.4}, scaled={:.1}x{:.1}, offset=({:.1}, {:.1})）",
            captured.width(),
            captured.height(),
            resolution,
            fit.scale,
            fit.scaled_width,
            fit.scaled_height,
            fit.offset_x,
            fit.offset_y
        );

        let resample_start = Instant::now();
        let pass_resampler = Arc::clone(&resampler);
        let sharpen = config.sharpen;
        let intermediate = run_blocking(ExportError::Resample, move || {
            pass_resampler.resample(
                &captured,
                ResampleTarget::new(pixel_width, pixel_height),
                sharpen.as_ref(),
            )
        })
        .await?;
        let resample_elapsed = resample_start.elapsed();

        let composite_start = Instant::now();
        let composite_config = config.clone();
        let composed = run_blocking(ExportError::Resample, move || {
            composite_onto_background(
                &intermediate,
                &fit,
                (target_width, target_height),
                &composite_config,
                resampler.as_ref(),
            )
        })
        .await?;
        let composite_elapsed = composite_start.elapsed();

        let encode_start = Instant::now();
        let compression = config.png_compression;
        let (width, height) = composed.dimensions();
        let bytes = run_blocking(ExportError::Encode, move || encode_png(&composed, compression)).await?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 导出完成 - {}x{} {}KB capture={}ms resample={}ms composite={}ms encode={}ms total={}ms",
            width,
            height,
            bytes.len() / 1024,
            capture_elapsed.as_millis(),
            resample_elapsed.as_millis(),
            composite_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ExportArtifact {
            width,
            height,
            file_name: config.file_name,
            bytes,
        })
    }
}

fn capture<R: Rasterizer>(rasterizer: &R, region: &R::Region) -> Result<Bitmap, ExportError> {
    let bitmap = rasterizer.rasterize(region).map_err(|err| match err {
        ExportError::Capture(message) => ExportError::Capture(message),
        other => ExportError::Capture(other.to_string()),
    })?;

    if bitmap.is_empty() {
        return Err(ExportError::Capture(format!(
            "采集结果尺寸为空：{}x{}",
            bitmap.width(),
            bitmap.height()
        )));
    }

    log::debug!("📸 采集完成：{}x{}", bitmap.width(), bitmap.height());
    Ok(bitmap)
}

/// 校验中间图像素数量是否超过配置上限。
fn validate_intermediate_pixels(config: &ExportConfig, width: u32, height: u32) -> Result<(), ExportError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > config.max_intermediate_pixels {
        return Err(ExportError::ResourceLimit(format!(
            "缩放中间图过大：{}x{} = {} 像素（限制：{} 像素）",
            width, height, pixels, config.max_intermediate_pixels
        )));
    }
    Ok(())
}

/// 在阻塞线程池中执行一个阶段，线程崩溃时归为该阶段自身的错误。
async fn run_blocking<T, F>(stage_error: fn(String) -> ExportError, job: F) -> Result<T, ExportError>
where
    F: FnOnce() -> Result<T, ExportError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| stage_error(format!("阶段线程异常退出：{}", e)))?
}
