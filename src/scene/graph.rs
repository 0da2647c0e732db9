//! # 场景图
//!
//! ## 设计思路
//!
//! 编辑区独占一份可变场景图：元素的增删、选中、移动、缩放与层级调整都通过
//! 显式方法完成。导出流水线只拿到 `snapshot()` 产出的只读快照。
//!
//! ## 实现思路
//!
//! - 元素列表始终按 `(order_key, seq)` 排序，即绘制顺序；每次层级变化后重新排序。
//! - 命中测试从最上层往下找，图片右下角的缩放手柄优先于元素本体。
//! - 图片缩放保持原始宽高比：`height = width * 原始高 / 原始宽`。

use std::sync::Arc;

use image::RgbaImage;

use super::render::SceneSnapshot;
use super::{Element, ElementId, ElementKind, Point, Rect, SceneError, Size, TextMetrics};

/// 图片缩放手柄的边长（CSS 像素）。
pub const RESIZE_HANDLE_SIZE: f32 = 10.0;
/// 图片缩放后的最小宽度。
pub const MIN_IMAGE_WIDTH: f32 = 1.0;

/// 命中测试结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body(ElementId),
    ResizeHandle(ElementId),
}

/// 编辑区场景图。
#[derive(Debug, Clone)]
pub struct SceneGraph {
    canvas: Size,
    elements: Vec<Element>,
    next_id: u64,
    next_seq: u64,
    selected: Option<ElementId>,
    metrics: TextMetrics,
}

impl SceneGraph {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            canvas: Size::new(width, height),
            elements: Vec::new(),
            next_id: 1,
            next_seq: 0,
            selected: None,
            metrics: TextMetrics::default(),
        }
    }

    /// 指定文本测量/绘制所用的字体信息。
    pub fn with_text_metrics(mut self, metrics: TextMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn text_metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn push(&mut self, kind: ElementKind) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        self.elements.push(Element {
            id,
            kind,
            position: Point::default(),
            size: None,
            order_key: 0,
            seq,
        });
        self.resort();
        id
    }

    /// 添加文本元素。内容会去掉首尾空白，空内容被拒绝。
    pub fn add_text(&mut self, text: &str) -> Result<ElementId, SceneError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(SceneError::EmptyText);
        }
        let id = self.push(ElementKind::Text {
            content: content.to_string(),
        });
        log::debug!("📝 添加文本元素 {}：{:?}", id, content);
        Ok(id)
    }

    /// 添加已解码的图片元素，初始按原始尺寸显示。
    pub fn add_image(&mut self, pixels: RgbaImage) -> Result<ElementId, SceneError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(SceneError::InvalidFormat(format!(
                "图片尺寸为空：{}x{}",
                pixels.width(),
                pixels.height()
            )));
        }
        let (width, height) = pixels.dimensions();
        let id = self.push(ElementKind::Image {
            pixels: Arc::new(pixels),
        });
        log::debug!("🖼️ 添加图片元素 {}：{}x{}", id, width, height);
        Ok(id)
    }

    pub fn remove(&mut self, id: ElementId) -> Result<Element, SceneError> {
        let index = self.index_of(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(self.elements.remove(index))
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    fn index_of(&self, id: ElementId) -> Result<usize, SceneError> {
        self.elements
            .iter()
            .position(|element| element.id == id)
            .ok_or(SceneError::NotFound(id))
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, SceneError> {
        let index = self.index_of(id)?;
        Ok(&mut self.elements[index])
    }

    /// 设置当前选中元素，`None` 表示取消选中。
    pub fn select(&mut self, id: Option<ElementId>) -> Result<(), SceneError> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        self.selected = id;
        Ok(())
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    fn resort(&mut self) {
        self.elements.sort_by_key(|element| (element.order_key, element.seq));
    }

    /// 直接设置层级键。
    pub fn set_order_key(&mut self, id: ElementId, order_key: i32) -> Result<(), SceneError> {
        self.get_mut(id)?.order_key = order_key;
        self.resort();
        Ok(())
    }

    /// 层级键加一，返回新值。
    pub fn raise(&mut self, id: ElementId) -> Result<i32, SceneError> {
        let element = self.get_mut(id)?;
        element.order_key = element.order_key.saturating_add(1);
        let key = element.order_key;
        self.resort();
        Ok(key)
    }

    /// 层级键减一，返回新值。
    pub fn lower(&mut self, id: ElementId) -> Result<i32, SceneError> {
        let element = self.get_mut(id)?;
        element.order_key = element.order_key.saturating_sub(1);
        let key = element.order_key;
        self.resort();
        Ok(key)
    }

    pub fn move_to(&mut self, id: ElementId, position: Point) -> Result<(), SceneError> {
        self.get_mut(id)?.position = position;
        Ok(())
    }

    pub fn move_by(&mut self, id: ElementId, dx: f32, dy: f32) -> Result<Point, SceneError> {
        let element = self.get_mut(id)?;
        element.position.x += dx;
        element.position.y += dy;
        Ok(element.position)
    }

    /// 按宽度缩放图片，高度按原始宽高比推导。
    pub fn resize_image(&mut self, id: ElementId, width: f32) -> Result<Size, SceneError> {
        let element = self.get_mut(id)?;
        let natural = element.natural_size().ok_or(SceneError::NotAnImage(id))?;

        let width = if width.is_finite() {
            width.max(MIN_IMAGE_WIDTH)
        } else {
            MIN_IMAGE_WIDTH
        };
        let size = Size::new(width, width * natural.height / natural.width);
        element.size = Some(size);
        Ok(size)
    }

    /// 恢复为显式尺寸（`None` 为原始尺寸）。
    pub(crate) fn restore_size(&mut self, id: ElementId, size: Option<Size>) -> Result<(), SceneError> {
        self.get_mut(id)?.size = size;
        Ok(())
    }

    /// 元素当前的显示尺寸。
    pub fn display_size(&self, element: &Element) -> Size {
        element.display_size(&self.metrics)
    }

    pub fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.get(id)
            .map(|element| Rect::new(element.position, self.display_size(element)))
    }

    /// 从最上层开始的命中测试。
    pub fn hit_test(&self, point: Point) -> Option<HitTarget> {
        for element in self.elements.iter().rev() {
            let bounds = Rect::new(element.position, self.display_size(element));
            if element.is_image() {
                let handle = Rect::new(
                    Point::new(
                        bounds.right() - RESIZE_HANDLE_SIZE,
                        bounds.bottom() - RESIZE_HANDLE_SIZE,
                    ),
                    Size::new(RESIZE_HANDLE_SIZE, RESIZE_HANDLE_SIZE),
                );
                if handle.contains(point) {
                    return Some(HitTarget::ResizeHandle(element.id));
                }
            }
            if bounds.contains(point) {
                return Some(HitTarget::Body(element.id));
            }
        }
        None
    }

    /// 按绘制顺序（下层在前）遍历元素。
    pub fn render_order(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// 生成只读快照，供导出采集使用。
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot::new(self.canvas, self.elements.clone(), self.metrics.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))
    }

    fn order(scene: &SceneGraph) -> Vec<ElementId> {
        scene.render_order().map(|element| element.id).collect()
    }

    #[test]
    fn add_text_trims_and_rejects_blank() {
        let mut scene = SceneGraph::new(800.0, 600.0);

        let id = scene.add_text("  hello ").expect("add text failed");
        assert_eq!(scene.get(id).and_then(Element::text), Some("hello"));
        assert!(matches!(scene.add_text("   "), Err(SceneError::EmptyText)));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let a = scene.add_text("a").expect("add failed");
        let b = scene.add_image(image(4, 4)).expect("add failed");
        let c = scene.add_text("c").expect("add failed");

        assert_eq!(order(&scene), vec![a, b, c]);
    }

    #[test]
    fn raise_and_lower_reorder_immediately() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let a = scene.add_text("a").expect("add failed");
        let b = scene.add_text("b").expect("add failed");
        let c = scene.add_text("c").expect("add failed");

        assert_eq!(scene.raise(a).expect("raise failed"), 1);
        assert_eq!(order(&scene), vec![b, c, a]);

        assert_eq!(scene.lower(c).expect("lower failed"), -1);
        assert_eq!(order(&scene), vec![c, b, a]);

        scene.lower(a).expect("lower failed");
        assert_eq!(order(&scene), vec![c, a, b]);
    }

    #[test]
    fn resize_keeps_aspect_ratio() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let id = scene.add_image(image(200, 100)).expect("add failed");

        let size = scene.resize_image(id, 50.0).expect("resize failed");
        assert_eq!(size, Size::new(50.0, 25.0));

        let clamped = scene.resize_image(id, -30.0).expect("resize failed");
        assert_eq!(clamped.width, MIN_IMAGE_WIDTH);

        let text = scene.add_text("t").expect("add failed");
        assert!(matches!(
            scene.resize_image(text, 10.0),
            Err(SceneError::NotAnImage(_))
        ));
    }

    #[test]
    fn hit_test_prefers_topmost_and_handle() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let lower = scene.add_image(image(100, 100)).expect("add failed");
        let upper = scene.add_image(image(50, 50)).expect("add failed");
        scene.move_to(upper, Point::new(20.0, 20.0)).expect("move failed");

        assert_eq!(scene.hit_test(Point::new(30.0, 30.0)), Some(HitTarget::Body(upper)));
        assert_eq!(scene.hit_test(Point::new(5.0, 5.0)), Some(HitTarget::Body(lower)));
        assert_eq!(
            scene.hit_test(Point::new(65.0, 65.0)),
            Some(HitTarget::ResizeHandle(upper))
        );
        assert_eq!(
            scene.hit_test(Point::new(95.0, 95.0)),
            Some(HitTarget::ResizeHandle(lower))
        );
        assert_eq!(scene.hit_test(Point::new(300.0, 300.0)), None);

        scene.raise(lower).expect("raise failed");
        assert_eq!(scene.hit_test(Point::new(30.0, 30.0)), Some(HitTarget::Body(lower)));
    }

    #[test]
    fn remove_clears_selection() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let id = scene.add_text("x").expect("add failed");
        scene.select(Some(id)).expect("select failed");

        scene.remove(id).expect("remove failed");

        assert_eq!(scene.selected(), None);
        assert!(matches!(scene.remove(id), Err(SceneError::NotFound(_))));
        assert!(matches!(scene.select(Some(id)), Err(SceneError::NotFound(_))));
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let id = scene.add_text("before").expect("add failed");
        let snapshot = scene.snapshot();

        scene.move_by(id, 10.0, 10.0).expect("move failed");
        scene.add_text("after").expect("add failed");

        assert_eq!(snapshot.elements().len(), 1);
        assert_eq!(snapshot.elements()[0].position, Point::default());
    }
}
