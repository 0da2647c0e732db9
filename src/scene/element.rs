//! # 元素模型
//!
//! 画布上的两类元素：文本与图片。每个元素带有位置、可选的显式尺寸、
//! 层级键 `order_key` 以及插入序号 `seq`（层级相同时按插入顺序绘制）。

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use super::TextMetrics;

/// 画布坐标系中的点（CSS 像素）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 尺寸（CSS 像素）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// 轴对齐矩形。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    /// 左上闭、右下开。
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.right()
            && point.y < self.bottom()
    }
}

/// 元素标识，场景内唯一且不复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 元素内容。
#[derive(Debug, Clone)]
pub enum ElementKind {
    Text { content: String },
    /// 已解码的图片像素，快照之间共享同一份数据。
    Image { pixels: Arc<RgbaImage> },
}

/// 画布元素。
#[derive(Debug, Clone)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub position: Point,
    /// 图片缩放后的显示尺寸；`None` 表示按原始尺寸显示。
    pub size: Option<Size>,
    pub order_key: i32,
    pub seq: u64,
}

impl Element {
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image { .. })
    }

    /// 图片原始尺寸，文本元素返回 `None`。
    pub fn natural_size(&self) -> Option<Size> {
        match &self.kind {
            ElementKind::Image { pixels } => {
                Some(Size::new(pixels.width() as f32, pixels.height() as f32))
            }
            ElementKind::Text { .. } => None,
        }
    }

    /// 当前显示尺寸：文本为含内边距的外框，图片为显式尺寸或原始尺寸。
    pub fn display_size(&self, metrics: &TextMetrics) -> Size {
        match &self.kind {
            ElementKind::Text { content } => metrics.box_size(content),
            ElementKind::Image { pixels } => self
                .size
                .unwrap_or_else(|| Size::new(pixels.width() as f32, pixels.height() as f32)),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text { content } => Some(content),
            ElementKind::Image { .. } => None,
        }
    }
}
