//! # 画布导出模块（export）
//!
//! ## 设计思路
//!
//! 该模块将“采集 → 适配计算 → 重采样 → 合成 → 编码 → 下载”按职责拆分为多个子模块：
//!
//! - `service`：对外入口，负责进行中互斥与下载端交付
//! - `handler`：编排整条处理流水线并记录阶段耗时
//! - `rasterizer`：采集协作者 trait（区域 → 位图）
//! - `fit`：cover 适配的比例与偏移计算
//! - `resample`：重采样协作者 trait 与默认卷积实现
//! - `sharpen`：反锐化掩模
//! - `composite`：背景填充与目标画框裁剪
//! - `encode`：PNG 编码与导出产物
//! - `sink`：下载端 trait 与文件/内存实现
//! - `config/error/resolution/bitmap`：配置、错误、分辨率档位、位图模型
//!
//! ## 调用链
//!
//! ```text
//! ExportService::export_and_download
//!    ↓
//! ExportHandler::export（配置快照 + 阶段耗时日志）
//!    ├─ Rasterizer::rasterize（采集）
//!    ├─ FitTransform::cover（适配）
//!    ├─ Resampler::resample + unsharp_mask（第一次重采样）
//!    ├─ composite_onto_background（背景 + 第二次重采样）
//!    └─ encode_png（编码）
//!    ↓
//! DownloadSink::download
//! ```

mod bitmap;
mod composite;
mod config;
mod encode;
mod error;
mod fit;
mod handler;
mod rasterizer;
mod resample;
mod resolution;
mod service;
mod sharpen;
mod sink;

pub use bitmap::Bitmap;
pub use composite::crop_window;
pub use config::{Alignment, DEFAULT_FILE_NAME, ExportConfig, ExportQualityProfile, SharpenParams};
pub use encode::ExportArtifact;
pub use error::ExportError;
pub use fit::FitTransform;
pub use handler::ExportHandler;
pub use rasterizer::Rasterizer;
pub use resample::{ConvolutionResampler, CropWindow, ResampleTarget, Resampler};
pub use resolution::Resolution;
pub use service::{DownloadReceipt, ExportService};
pub use sink::{DownloadSink, FileSink, MemorySink, validate_file_name};
