//! # 编辑区场景
//!
//! ## 设计思路
//!
//! 编辑区是导出流水线的“画面来源”：用户在画布上放置文本与图片，拖拽、缩放并调整层级。
//! 场景图由编辑区独占并可变；导出时只取一份只读快照交给光栅化器。
//!
//! ## 模块组成
//!
//! - `element`：元素与几何类型
//! - `graph`：场景图，增删、选中、层级、命中测试
//! - `interaction`：拖拽/缩放的指针状态机
//! - `loader`：图片素材的加载与校验
//! - `text`：文本测量与字形绘制
//! - `render`：快照与光栅化器（实现 `export::Rasterizer`）
//! - `document`：JSON 场景文档

mod document;
mod element;
mod error;
mod graph;
mod interaction;
mod loader;
mod render;
mod text;

pub use document::{CanvasSpec, ElementSpec, SceneDocument};
pub use element::{Element, ElementId, ElementKind, Point, Rect, Size};
pub use error::SceneError;
pub use graph::{HitTarget, MIN_IMAGE_WIDTH, RESIZE_HANDLE_SIZE, SceneGraph};
pub use interaction::{InteractionController, InteractionState, PointerEvent};
pub use loader::{ImageLoadLimits, ImageSource, load_image};
pub use render::{CANVAS_BACKGROUND, CANVAS_BORDER, SceneRasterizer, SceneSnapshot};
pub use text::{TEXT_FONT_SIZE, TEXT_PADDING, TextMetrics};
