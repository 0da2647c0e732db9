//! # 画布导出工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  编辑区 (scene)                           │
//! │                                                          │
//! │  SceneDocument ──▶ SceneGraph ◀── InteractionController  │
//! │                        │ snapshot()                      │
//! │                        ↓                                 │
//! │                  SceneRasterizer (Rasterizer)            │
//! └────────────────────────┼─────────────────────────────────┘
//!                          ↓ Bitmap
//! ┌────────────────────────┼─────────────────────────────────┐
//! │                  导出流水线 (export)                      │
//! │                                                          │
//! │  ExportService ── InFlightGuard（同一时刻只允许一次导出）  │
//! │       ↓                                                  │
//! │  ExportHandler: 采集 → 适配 → 重采样 → 合成 → 编码        │
//! │       ↓                                                  │
//! │  DownloadSink (FileSink / MemorySink)                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`export`] | 按目标分辨率导出 PNG 的流水线与下载端 |
//! | [`scene`] | 画布元素、交互、素材加载、光栅化与场景文档 |
//! | [`settings`] | 导出偏好的读取与保存 |

pub mod error;
pub mod export;
pub mod scene;
pub mod settings;
