//! # 场景光栅化
//!
//! ## 设计思路
//!
//! `SceneRasterizer` 是导出流水线的采集协作者：把场景快照按设备像素比绘制成位图。
//! 快照在采集时读取一次，之后编辑区的修改不影响本次导出。
//!
//! ## 实现思路
//!
//! 1. 分配 `画布尺寸 × 像素比` 的位图（受像素上限约束），填充浅色画布背景
//! 2. 按绘制顺序（`order_key` 升序、同级按插入顺序）绘制元素
//!    - 图片：先与画布求交，只把可见部分对应的源图窗口缩放到可见区域，再做 alpha 叠加。
//!      元素再大，单次重采样的输出也不会超过画布本身
//!    - 文本：在内边距内绘制字形（需要字体）
//! 3. 最后绘制 1px 深色边框
//!
//! 缩放手柄属于编辑器控件，不进入导出画面。

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::RgbaImage;

use crate::export::{Bitmap, ExportError, Rasterizer};

use super::text::TEXT_PADDING;
use super::{Element, ElementKind, Size, TextMetrics};

/// 画布背景色（`#f8f9fa`）。
pub const CANVAS_BACKGROUND: [u8; 4] = [0xf8, 0xf9, 0xfa, 0xff];
/// 画布边框色（`#212529`）。
pub const CANVAS_BORDER: [u8; 4] = [0x21, 0x25, 0x29, 0xff];
/// 光栅化画布默认的像素上限。
pub const DEFAULT_MAX_CANVAS_PIXELS: u64 = 100_000_000;
/// 文本颜色。
pub const TEXT_COLOR: [u8; 3] = [0x21, 0x25, 0x29];

/// 场景的只读快照。
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    canvas: Size,
    elements: Vec<Element>,
    metrics: TextMetrics,
}

impl SceneSnapshot {
    pub(crate) fn new(canvas: Size, elements: Vec<Element>, metrics: TextMetrics) -> Self {
        Self {
            canvas,
            elements,
            metrics,
        }
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// 按绘制顺序排列的元素。
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn display_size(&self, element: &Element) -> Size {
        element.display_size(&self.metrics)
    }
}

/// 场景快照的软件光栅化器。
#[derive(Debug, Clone, Copy)]
pub struct SceneRasterizer {
    pixel_ratio: f32,
    draw_border: bool,
    max_canvas_pixels: u64,
}

impl Default for SceneRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRasterizer {
    pub fn new() -> Self {
        Self {
            pixel_ratio: 1.0,
            draw_border: true,
            max_canvas_pixels: DEFAULT_MAX_CANVAS_PIXELS,
        }
    }

    /// 设备像素比，类似高分屏上的截图倍率。
    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn with_border(mut self, draw_border: bool) -> Self {
        self.draw_border = draw_border;
        self
    }

    /// 光栅化画布的像素上限（`width * height`）。
    pub fn with_max_canvas_pixels(mut self, max_canvas_pixels: u64) -> Self {
        self.max_canvas_pixels = max_canvas_pixels;
        self
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// 把图片元素画到画布上，只对落在画布内的可见部分重采样。
    fn draw_image(
        &self,
        canvas: &mut RgbaImage,
        element: &Element,
        pixels: &RgbaImage,
        size: Size,
    ) -> Result<(), ExportError> {
        let ratio = f64::from(self.pixel_ratio);
        let dest_x = f64::from(element.position.x) * ratio;
        let dest_y = f64::from(element.position.y) * ratio;
        let dest_width = f64::from(size.width) * ratio;
        let dest_height = f64::from(size.height) * ratio;
        if ![dest_x, dest_y, dest_width, dest_height].iter().all(|v| v.is_finite()) {
            return Err(ExportError::ResourceLimit(format!(
                "元素 {} 的几何参数无效：({}, {}) {}x{}",
                element.id, dest_x, dest_y, dest_width, dest_height
            )));
        }

        let Some(visible) = visible_part(
            (dest_x, dest_y, dest_width, dest_height),
            pixels.dimensions(),
            canvas.dimensions(),
        ) else {
            return Ok(());
        };

        let patch = resample_visible(pixels, &visible)?;
        image::imageops::overlay(canvas, &patch, i64::from(visible.dest_left), i64::from(visible.dest_top));
        Ok(())
    }

    fn draw_border(&self, canvas: &mut RgbaImage) {
        let thickness = (self.pixel_ratio.round() as u32).max(1);
        let (width, height) = canvas.dimensions();
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            if x < thickness
                || y < thickness
                || x + thickness >= width
                || y + thickness >= height
            {
                pixel.0 = CANVAS_BORDER;
            }
        }
    }
}

impl Rasterizer for SceneRasterizer {
    type Region = SceneSnapshot;

    fn rasterize(&self, snapshot: &SceneSnapshot) -> Result<Bitmap, ExportError> {
        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(ExportError::Capture(format!("像素比无效：{}", self.pixel_ratio)));
        }

        let width = (snapshot.canvas.width * self.pixel_ratio).round();
        let height = (snapshot.canvas.height * self.pixel_ratio).round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(ExportError::Capture(format!(
                "画布尺寸为空：{}x{}",
                snapshot.canvas.width, snapshot.canvas.height
            )));
        }
        let pixels = f64::from(width) * f64::from(height);
        if pixels > self.max_canvas_pixels as f64 {
            return Err(ExportError::ResourceLimit(format!(
                "画布过大：{}x{} = {} 像素（限制：{} 像素）",
                width, height, pixels, self.max_canvas_pixels
            )));
        }

        let mut canvas = RgbaImage::from_pixel(width as u32, height as u32, image::Rgba(CANVAS_BACKGROUND));
        let mut skipped_text = 0usize;

        for element in snapshot.elements() {
            let size = snapshot.display_size(element);
            match &element.kind {
                ElementKind::Image { pixels } => self.draw_image(&mut canvas, element, pixels, size)?,
                ElementKind::Text { content } => {
                    let origin = (
                        (element.position.x + TEXT_PADDING) * self.pixel_ratio,
                        (element.position.y + TEXT_PADDING) * self.pixel_ratio,
                    );
                    if !snapshot
                        .metrics
                        .draw(&mut canvas, content, origin, self.pixel_ratio, TEXT_COLOR)
                    {
                        skipped_text += 1;
                    }
                }
            }
        }

        if skipped_text > 0 {
            log::warn!("⚠️ 未配置字体，跳过 {} 个文本元素的字形绘制", skipped_text);
        }

        if self.draw_border {
            self.draw_border(&mut canvas);
        }

        log::debug!(
            "📸 场景光栅化完成：{} 个元素 -> {}x{}（pixel_ratio={}）",
            snapshot.elements().len(),
            canvas.width(),
            canvas.height(),
            self.pixel_ratio
        );

        Ok(Bitmap::from(canvas))
    }
}

/// 图片元素在画布上的可见部分，以及它对应的源图窗口。
#[derive(Debug, Clone, Copy, PartialEq)]
struct VisiblePart {
    dest_left: u32,
    dest_top: u32,
    dest_width: u32,
    dest_height: u32,
    src_left: f64,
    src_top: f64,
    src_width: f64,
    src_height: f64,
}

/// 计算元素目标矩形（设备像素）与画布的交集，并反推源图窗口。
fn visible_part(
    dest: (f64, f64, f64, f64),
    source: (u32, u32),
    canvas: (u32, u32),
) -> Option<VisiblePart> {
    let (dest_x, dest_y, dest_width, dest_height) = dest;
    if dest_width <= 0.0 || dest_height <= 0.0 || source.0 == 0 || source.1 == 0 {
        return None;
    }

    let left = dest_x.round().max(0.0);
    let top = dest_y.round().max(0.0);
    let right = (dest_x + dest_width).round().min(f64::from(canvas.0));
    let bottom = (dest_y + dest_height).round().min(f64::from(canvas.1));
    if right <= left || bottom <= top {
        return None;
    }

    let scale_x = f64::from(source.0) / dest_width;
    let scale_y = f64::from(source.1) / dest_height;
    let src_left = ((left - dest_x) * scale_x).clamp(0.0, f64::from(source.0));
    let src_top = ((top - dest_y) * scale_y).clamp(0.0, f64::from(source.1));
    let src_width = ((right - left) * scale_x).min(f64::from(source.0) - src_left);
    let src_height = ((bottom - top) * scale_y).min(f64::from(source.1) - src_top);
    if src_width <= 0.0 || src_height <= 0.0 {
        return None;
    }

    Some(VisiblePart {
        dest_left: left as u32,
        dest_top: top as u32,
        dest_width: (right - left) as u32,
        dest_height: (bottom - top) as u32,
        src_left,
        src_top,
        src_width,
        src_height,
    })
}

/// 把源图窗口重采样到可见区域尺寸。
///
/// 1:1 且对齐到整数像素时直接拷贝；否则用 `fast_image_resize` 的裁剪缩放，
/// 失败时回退到 `image` 的整数窗口缩放。
fn resample_visible(pixels: &RgbaImage, visible: &VisiblePart) -> Result<RgbaImage, ExportError> {
    let (width, height) = (visible.dest_width, visible.dest_height);

    let is_identity = visible.src_left.fract() == 0.0
        && visible.src_top.fract() == 0.0
        && visible.src_width == f64::from(width)
        && visible.src_height == f64::from(height);
    if is_identity {
        return Ok(image::imageops::crop_imm(
            pixels,
            visible.src_left as u32,
            visible.src_top as u32,
            width,
            height,
        )
        .to_image());
    }

    match resize_window_fast(pixels, visible) {
        Ok(patch) => Ok(patch),
        Err(err) => {
            log::warn!("⚠️ 元素窗口缩放失败，回退 image::imageops::resize：{}", err);
            Ok(resize_window_imageops(pixels, visible))
        }
    }
}

fn resize_window_fast(pixels: &RgbaImage, visible: &VisiblePart) -> Result<RgbaImage, ExportError> {
    let src_image = fr::images::Image::from_vec_u8(
        pixels.width(),
        pixels.height(),
        pixels.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ExportError::Capture(format!("构建元素图像缓冲失败：{}", e)))?;
    let mut dst_image = fr::images::Image::new(visible.dest_width, visible.dest_height, fr::PixelType::U8x4);

    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear))
        .crop(visible.src_left, visible.src_top, visible.src_width, visible.src_height);

    fr::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ExportError::Capture(format!("元素窗口缩放失败：{}", e)))?;

    RgbaImage::from_raw(visible.dest_width, visible.dest_height, dst_image.into_vec())
        .ok_or_else(|| ExportError::Capture("元素窗口缩放输出缓冲长度异常".to_string()))
}

fn resize_window_imageops(pixels: &RgbaImage, visible: &VisiblePart) -> RgbaImage {
    let left = (visible.src_left.floor() as u32).min(pixels.width() - 1);
    let top = (visible.src_top.floor() as u32).min(pixels.height() - 1);
    let width = (visible.src_width.ceil() as u32).clamp(1, pixels.width() - left);
    let height = (visible.src_height.ceil() as u32).clamp(1, pixels.height() - top);
    let window = image::imageops::crop_imm(pixels, left, top, width, height).to_image();
    image::imageops::resize(&window, visible.dest_width, visible.dest_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Point, SceneGraph};

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, image::Rgba(color))
    }

    fn assert_close(actual: Option<[u8; 4]>, expected: [u8; 4]) {
        let actual = actual.expect("pixel out of bounds");
        assert!(
            actual.iter().zip(expected.iter()).all(|(a, e)| a.abs_diff(*e) <= 2),
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn empty_scene_renders_background_and_border() {
        let scene = SceneGraph::new(40.0, 30.0);
        let bitmap = SceneRasterizer::new()
            .rasterize(&scene.snapshot())
            .expect("rasterize failed");

        assert_eq!(bitmap.dimensions(), (40, 30));
        assert_eq!(bitmap.pixel(0, 0), Some(CANVAS_BORDER));
        assert_eq!(bitmap.pixel(39, 29), Some(CANVAS_BORDER));
        assert_eq!(bitmap.pixel(20, 15), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn zero_sized_canvas_is_capture_error() {
        let scene = SceneGraph::new(0.0, 30.0);
        let result = SceneRasterizer::new().rasterize(&scene.snapshot());

        assert!(matches!(result, Err(ExportError::Capture(_))));
    }

    #[test]
    fn higher_order_key_paints_on_top() {
        let mut scene = SceneGraph::new(50.0, 50.0);
        let red = scene.add_image(solid(20, 20, [255, 0, 0, 255])).expect("add failed");
        let blue = scene.add_image(solid(20, 20, [0, 0, 255, 255])).expect("add failed");
        scene.move_to(red, Point::new(10.0, 10.0)).expect("move failed");
        scene.move_to(blue, Point::new(10.0, 10.0)).expect("move failed");
        let rasterizer = SceneRasterizer::new();

        let bitmap = rasterizer.rasterize(&scene.snapshot()).expect("rasterize failed");
        assert_eq!(bitmap.pixel(15, 15), Some([0, 0, 255, 255]));

        scene.raise(red).expect("raise failed");
        let bitmap = rasterizer.rasterize(&scene.snapshot()).expect("rasterize failed");
        assert_eq!(bitmap.pixel(15, 15), Some([255, 0, 0, 255]));
    }

    #[test]
    fn pixel_ratio_scales_canvas_and_elements() {
        let mut scene = SceneGraph::new(50.0, 40.0);
        let id = scene.add_image(solid(10, 10, [0, 255, 0, 255])).expect("add failed");
        scene.move_to(id, Point::new(5.0, 5.0)).expect("move failed");

        let bitmap = SceneRasterizer::new()
            .with_pixel_ratio(2.0)
            .rasterize(&scene.snapshot())
            .expect("rasterize failed");

        assert_eq!(bitmap.dimensions(), (100, 80));
        assert_close(bitmap.pixel(11, 11), [0, 255, 0, 255]);
        assert_close(bitmap.pixel(29, 29), [0, 255, 0, 255]);
        assert_eq!(bitmap.pixel(31, 31), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn resized_image_uses_display_size() {
        let mut scene = SceneGraph::new(100.0, 100.0);
        let id = scene.add_image(solid(10, 5, [0, 0, 0, 255])).expect("add failed");
        scene.move_to(id, Point::new(10.0, 10.0)).expect("move failed");
        scene.resize_image(id, 40.0).expect("resize failed");

        let bitmap = SceneRasterizer::new()
            .with_border(false)
            .rasterize(&scene.snapshot())
            .expect("rasterize failed");

        assert_close(bitmap.pixel(48, 28), [0, 0, 0, 255]);
        assert_eq!(bitmap.pixel(51, 31), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn elements_outside_canvas_are_clipped() {
        let mut scene = SceneGraph::new(30.0, 30.0);
        let id = scene.add_image(solid(20, 20, [9, 9, 9, 255])).expect("add failed");
        scene.move_to(id, Point::new(-10.0, 20.0)).expect("move failed");

        let bitmap = SceneRasterizer::new()
            .with_border(false)
            .rasterize(&scene.snapshot())
            .expect("rasterize failed");

        assert_eq!(bitmap.dimensions(), (30, 30));
        assert_eq!(bitmap.pixel(5, 25), Some([9, 9, 9, 255]));
        assert_eq!(bitmap.pixel(15, 25), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn oversized_element_is_clipped_to_canvas() {
        let mut scene = SceneGraph::new(800.0, 600.0);
        let id = scene.add_image(solid(200, 100, [220, 20, 20, 255])).expect("add failed");
        scene.move_to(id, Point::new(700.0, 500.0)).expect("move failed");
        scene.resize_image(id, 1.0e9).expect("resize failed");

        let bitmap = SceneRasterizer::new()
            .with_border(false)
            .rasterize(&scene.snapshot())
            .expect("rasterize failed");

        assert_eq!(bitmap.dimensions(), (800, 600));
        assert_close(bitmap.pixel(750, 550), [220, 20, 20, 255]);
        assert_close(bitmap.pixel(799, 599), [220, 20, 20, 255]);
        assert_eq!(bitmap.pixel(650, 550), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn oversized_canvas_is_resource_limit() {
        let scene = SceneGraph::new(100_000.0, 100_000.0);
        let result = SceneRasterizer::new().rasterize(&scene.snapshot());
        assert!(matches!(result, Err(ExportError::ResourceLimit(_))));

        let small = SceneGraph::new(40.0, 30.0);
        let result = SceneRasterizer::new()
            .with_max_canvas_pixels(1_000)
            .rasterize(&small.snapshot());
        assert!(matches!(result, Err(ExportError::ResourceLimit(_))));
    }

    #[test]
    fn visible_part_maps_back_to_source_window() {
        // 100x50 的图片放大到 400x200，左上角落在画布外 (-100, -50)
        let visible = visible_part((-100.0, -50.0, 400.0, 200.0), (100, 50), (300, 120))
            .expect("element should be visible");

        assert_eq!(
            (visible.dest_left, visible.dest_top, visible.dest_width, visible.dest_height),
            (0, 0, 300, 120)
        );
        assert_eq!((visible.src_left, visible.src_top), (25.0, 12.5));
        assert_eq!((visible.src_width, visible.src_height), (75.0, 30.0));

        assert_eq!(visible_part((400.0, 0.0, 10.0, 10.0), (10, 10), (300, 120)), None);
    }
}
