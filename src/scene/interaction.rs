//! # 指针交互状态机
//!
//! ## 设计思路
//!
//! 拖拽与缩放都是“按下 → 移动 → 松开”的短流程，用一个显式状态机承载：
//!
//! ```text
//! Idle ──按下元素本体──▶ Dragging ──松开/取消──▶ Idle
//! Idle ──按下缩放手柄──▶ Resizing ──松开/取消──▶ Idle
//! ```
//!
//! ## 实现思路
//!
//! - 按下时先命中测试并选中元素（与点击选中一致）。
//! - 拖拽记录按下点相对元素左上角的偏移，移动时保持偏移不变。
//! - 缩放宽度 = 指针 x − 元素左边缘，高度按宽高比推导。
//! - 松开保留当前结果；取消恢复到按下前的位置/尺寸。

use super::{ElementId, HitTarget, Point, SceneError, SceneGraph, Size};

/// 指针输入事件（画布坐标）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    Cancel,
}

/// 交互状态。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    Dragging {
        id: ElementId,
        grab_offset: Point,
        origin: Point,
    },
    Resizing {
        id: ElementId,
        original_size: Option<Size>,
    },
}

/// 编辑区的指针交互控制器。
#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    /// 处理一次指针事件，返回处理后的状态。
    ///
    /// 目标元素在交互过程中被删除时，状态回到 `Idle` 并返回错误。
    pub fn handle(
        &mut self,
        scene: &mut SceneGraph,
        event: PointerEvent,
    ) -> Result<InteractionState, SceneError> {
        let result = self.apply(scene, event);
        if result.is_err() {
            self.state = InteractionState::Idle;
        }
        result.map(|_| self.state)
    }

    fn apply(&mut self, scene: &mut SceneGraph, event: PointerEvent) -> Result<(), SceneError> {
        match (self.state, event) {
            (InteractionState::Idle, PointerEvent::Down(point)) => match scene.hit_test(point) {
                Some(HitTarget::ResizeHandle(id)) => {
                    scene.select(Some(id))?;
                    let original_size = scene.get(id).ok_or(SceneError::NotFound(id))?.size;
                    self.state = InteractionState::Resizing { id, original_size };
                }
                Some(HitTarget::Body(id)) => {
                    scene.select(Some(id))?;
                    let origin = scene.get(id).ok_or(SceneError::NotFound(id))?.position;
                    self.state = InteractionState::Dragging {
                        id,
                        grab_offset: Point::new(point.x - origin.x, point.y - origin.y),
                        origin,
                    };
                }
                None => scene.select(None)?,
            },
            (InteractionState::Dragging { id, grab_offset, .. }, PointerEvent::Move(point)) => {
                scene.move_to(id, Point::new(point.x - grab_offset.x, point.y - grab_offset.y))?;
            }
            (InteractionState::Resizing { id, .. }, PointerEvent::Move(point)) => {
                let left = scene.get(id).ok_or(SceneError::NotFound(id))?.position.x;
                scene.resize_image(id, point.x - left)?;
            }
            (InteractionState::Dragging { id, grab_offset, .. }, PointerEvent::Up(point)) => {
                scene.move_to(id, Point::new(point.x - grab_offset.x, point.y - grab_offset.y))?;
                self.state = InteractionState::Idle;
            }
            (InteractionState::Resizing { .. }, PointerEvent::Up(_)) => {
                self.state = InteractionState::Idle;
            }
            (InteractionState::Dragging { id, origin, .. }, PointerEvent::Cancel) => {
                self.state = InteractionState::Idle;
                scene.move_to(id, origin)?;
            }
            (InteractionState::Resizing { id, original_size }, PointerEvent::Cancel) => {
                self.state = InteractionState::Idle;
                scene.restore_size(id, original_size)?;
            }
            // 空闲时的移动/松开/取消，以及交互中重复按下，均忽略
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn scene_with_image() -> (SceneGraph, ElementId) {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let id = scene
            .add_image(RgbaImage::from_pixel(100, 50, image::Rgba([0, 0, 0, 255])))
            .expect("add failed");
        (scene, id)
    }

    #[test]
    fn drag_moves_element_keeping_grab_offset() {
        let (mut scene, id) = scene_with_image();
        let mut controller = InteractionController::new();

        let state = controller
            .handle(&mut scene, PointerEvent::Down(Point::new(10.0, 10.0)))
            .expect("down failed");
        assert!(matches!(state, InteractionState::Dragging { .. }));
        assert_eq!(scene.selected(), Some(id));

        controller
            .handle(&mut scene, PointerEvent::Move(Point::new(60.0, 40.0)))
            .expect("move failed");
        assert_eq!(scene.get(id).map(|e| e.position), Some(Point::new(50.0, 30.0)));

        let state = controller
            .handle(&mut scene, PointerEvent::Up(Point::new(70.0, 40.0)))
            .expect("up failed");
        assert_eq!(state, InteractionState::Idle);
        assert_eq!(scene.get(id).map(|e| e.position), Some(Point::new(60.0, 30.0)));

        controller
            .handle(&mut scene, PointerEvent::Move(Point::new(500.0, 500.0)))
            .expect("idle move failed");
        assert_eq!(scene.get(id).map(|e| e.position), Some(Point::new(60.0, 30.0)));
    }

    #[test]
    fn resize_handle_scales_with_aspect_ratio() {
        let (mut scene, id) = scene_with_image();
        scene.move_to(id, Point::new(20.0, 20.0)).expect("move failed");
        let mut controller = InteractionController::new();

        let state = controller
            .handle(&mut scene, PointerEvent::Down(Point::new(115.0, 65.0)))
            .expect("down failed");
        assert!(matches!(state, InteractionState::Resizing { .. }));

        controller
            .handle(&mut scene, PointerEvent::Move(Point::new(220.0, 0.0)))
            .expect("move failed");
        assert_eq!(scene.bounds(id).map(|b| b.size), Some(Size::new(200.0, 100.0)));

        controller
            .handle(&mut scene, PointerEvent::Up(Point::new(220.0, 0.0)))
            .expect("up failed");
        assert!(controller.is_idle());
        assert_eq!(scene.bounds(id).map(|b| b.size), Some(Size::new(200.0, 100.0)));
    }

    #[test]
    fn cancel_restores_previous_geometry() {
        let (mut scene, id) = scene_with_image();
        let mut controller = InteractionController::new();

        controller
            .handle(&mut scene, PointerEvent::Down(Point::new(5.0, 5.0)))
            .expect("down failed");
        controller
            .handle(&mut scene, PointerEvent::Move(Point::new(300.0, 300.0)))
            .expect("move failed");
        controller
            .handle(&mut scene, PointerEvent::Cancel)
            .expect("cancel failed");
        assert_eq!(scene.get(id).map(|e| e.position), Some(Point::default()));

        controller
            .handle(&mut scene, PointerEvent::Down(Point::new(95.0, 45.0)))
            .expect("down failed");
        controller
            .handle(&mut scene, PointerEvent::Move(Point::new(40.0, 0.0)))
            .expect("move failed");
        controller
            .handle(&mut scene, PointerEvent::Cancel)
            .expect("cancel failed");
        assert_eq!(scene.get(id).and_then(|e| e.size), None);
        assert!(controller.is_idle());
    }

    #[test]
    fn pressing_empty_canvas_clears_selection() {
        let (mut scene, id) = scene_with_image();
        scene.select(Some(id)).expect("select failed");
        let mut controller = InteractionController::new();

        let state = controller
            .handle(&mut scene, PointerEvent::Down(Point::new(700.0, 500.0)))
            .expect("down failed");

        assert_eq!(state, InteractionState::Idle);
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn removed_target_resets_to_idle() {
        let (mut scene, id) = scene_with_image();
        let mut controller = InteractionController::new();
        controller
            .handle(&mut scene, PointerEvent::Down(Point::new(5.0, 5.0)))
            .expect("down failed");

        scene.remove(id).expect("remove failed");
        let result = controller.handle(&mut scene, PointerEvent::Move(Point::new(9.0, 9.0)));

        assert!(matches!(result, Err(SceneError::NotFound(_))));
        assert!(controller.is_idle());
    }
}
