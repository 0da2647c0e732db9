//! # 场景文档
//!
//! 以 JSON 描述的画布内容，供命令行一次性构建场景：
//!
//! ```json
//! {
//!   "canvas": { "width": 800, "height": 600 },
//!   "elements": [
//!     { "type": "text", "text": "Hello", "x": 40, "y": 30 },
//!     { "type": "image", "src": "photo.png", "x": 120, "y": 80, "width": 320, "z": 1 }
//!   ]
//! }
//! ```
//!
//! `src` 以 `data:` 开头时按 Data URL 解析，否则视为相对于文档所在目录的路径。
//! 构建过程只调用 `SceneGraph` 的公开操作，文档中的顺序即插入顺序。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ImageLoadLimits, ImageSource, Point, SceneError, SceneGraph, TextMetrics, load_image};

/// 画布尺寸（CSS 像素）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSpec {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasSpec {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// 文档中的单个元素。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementSpec {
    Text {
        text: String,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        z: i32,
    },
    Image {
        src: String,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f32>,
        #[serde(default)]
        z: i32,
    },
}

/// JSON 场景文档。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub canvas: CanvasSpec,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

impl SceneDocument {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        serde_json::from_str(json)
            .map_err(|e| SceneError::InvalidFormat(format!("场景文档解析失败：{}", e)))
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SceneError::InvalidFormat(format!("场景文档序列化失败：{}", e)))
    }

    /// 读取并解析场景文档文件。
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SceneError::FileSystem(format!("无法读取场景文档 {}：{}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// 文本元素数量。
    pub fn text_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|element| matches!(element, ElementSpec::Text { .. }))
            .count()
    }

    /// 文档含文本时要求字体可用，避免导出结果里文本被整段省略。
    pub fn require_font(&self, metrics: &TextMetrics) -> Result<(), SceneError> {
        match self.text_count() {
            0 => Ok(()),
            _ if metrics.has_font() => Ok(()),
            count => Err(SceneError::MissingFont(count)),
        }
    }

    /// 按文档内容构建场景图，图片路径相对于 `base_dir` 解析。
    pub fn build(
        &self,
        base_dir: &Path,
        metrics: TextMetrics,
        limits: &ImageLoadLimits,
    ) -> Result<SceneGraph, SceneError> {
        let mut scene = SceneGraph::new(self.canvas.width, self.canvas.height).with_text_metrics(metrics);

        for spec in &self.elements {
            match spec {
                ElementSpec::Text { text, x, y, z } => {
                    let id = scene.add_text(text)?;
                    scene.move_to(id, Point::new(*x, *y))?;
                    scene.set_order_key(id, *z)?;
                }
                ElementSpec::Image {
                    src,
                    x,
                    y,
                    width,
                    z,
                } => {
                    let pixels = load_image(&resolve_source(src, base_dir), limits)?;
                    let id = scene.add_image(pixels)?;
                    scene.move_to(id, Point::new(*x, *y))?;
                    scene.set_order_key(id, *z)?;
                    if let Some(width) = width {
                        scene.resize_image(id, *width)?;
                    }
                }
            }
        }

        log::info!(
            "🧩 场景构建完成：{}x{}，{} 个元素",
            self.canvas.width,
            self.canvas.height,
            scene.len()
        );
        Ok(scene)
    }
}

fn resolve_source(src: &str, base_dir: &Path) -> ImageSource {
    if src.trim_start().starts_with("data:") {
        return ImageSource::Base64(src.to_string());
    }
    let path = PathBuf::from(src);
    if path.is_absolute() {
        ImageSource::FilePath(path)
    } else {
        ImageSource::FilePath(base_dir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose};
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255])))
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("encode failed");
        cursor.into_inner()
    }

    #[test]
    fn parses_tagged_elements_with_defaults() {
        let doc = SceneDocument::from_json(
            r#"{
                "canvas": { "width": 640, "height": 480 },
                "elements": [
                    { "type": "text", "text": "hi", "x": 4 },
                    { "type": "image", "src": "a.png", "width": 100, "z": 2 }
                ]
            }"#,
        )
        .expect("parse failed");

        assert_eq!(doc.canvas, CanvasSpec { width: 640.0, height: 480.0 });
        assert_eq!(
            doc.elements[0],
            ElementSpec::Text {
                text: "hi".to_string(),
                x: 4.0,
                y: 0.0,
                z: 0
            }
        );
        assert!(matches!(
            doc.elements[1],
            ElementSpec::Image { width: Some(w), z: 2, .. } if w == 100.0
        ));
    }

    #[test]
    fn unknown_element_type_is_invalid_format() {
        let result = SceneDocument::from_json(r#"{ "elements": [ { "type": "video" } ] }"#);
        assert!(matches!(result, Err(SceneError::InvalidFormat(_))));
    }

    #[test]
    fn builds_scene_from_relative_path_and_data_url() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        std::fs::write(dir.path().join("pic.png"), png_bytes(40, 20)).expect("write failed");
        let data_url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png_bytes(8, 8))
        );

        let doc = SceneDocument {
            canvas: CanvasSpec::default(),
            elements: vec![
                ElementSpec::Image {
                    src: "pic.png".to_string(),
                    x: 10.0,
                    y: 20.0,
                    width: Some(80.0),
                    z: 1,
                },
                ElementSpec::Image {
                    src: data_url,
                    x: 0.0,
                    y: 0.0,
                    width: None,
                    z: 0,
                },
                ElementSpec::Text {
                    text: "caption".to_string(),
                    x: 5.0,
                    y: 5.0,
                    z: 0,
                },
            ],
        };

        let scene = doc
            .build(dir.path(), TextMetrics::default(), &ImageLoadLimits::default())
            .expect("build failed");

        assert_eq!(scene.len(), 3);
        let order: Vec<_> = scene.render_order().map(|e| e.order_key).collect();
        assert_eq!(order, vec![0, 0, 1]);

        let top = scene.render_order().last().expect("scene is empty");
        let bounds = scene.bounds(top.id).expect("missing bounds");
        assert_eq!(bounds.origin, Point::new(10.0, 20.0));
        assert_eq!(bounds.size.width, 80.0);
        assert_eq!(bounds.size.height, 40.0);
    }

    #[test]
    fn blank_text_fails_build() {
        let doc = SceneDocument {
            canvas: CanvasSpec::default(),
            elements: vec![ElementSpec::Text {
                text: "  ".to_string(),
                x: 0.0,
                y: 0.0,
                z: 0,
            }],
        };

        let result = doc.build(Path::new("."), TextMetrics::default(), &ImageLoadLimits::default());
        assert!(matches!(result, Err(SceneError::EmptyText)));
    }

    #[test]
    fn load_reads_file_and_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("scene.json");
        let doc = SceneDocument {
            canvas: CanvasSpec {
                width: 320.0,
                height: 200.0,
            },
            elements: Vec::new(),
        };
        std::fs::write(&path, doc.to_json().expect("serialize failed")).expect("write failed");

        assert_eq!(SceneDocument::load(&path).expect("load failed"), doc);
        assert!(matches!(
            SceneDocument::load(&dir.path().join("missing.json")),
            Err(SceneError::FileSystem(_))
        ));
    }

    #[test]
    fn text_without_font_is_refused() {
        let with_text = SceneDocument {
            canvas: CanvasSpec::default(),
            elements: vec![
                ElementSpec::Text {
                    text: "title".to_string(),
                    x: 0.0,
                    y: 0.0,
                    z: 0,
                },
                ElementSpec::Image {
                    src: "a.png".to_string(),
                    x: 0.0,
                    y: 0.0,
                    width: None,
                    z: 0,
                },
            ],
        };
        let images_only = SceneDocument {
            canvas: CanvasSpec::default(),
            elements: with_text.elements[1..].to_vec(),
        };

        assert_eq!(with_text.text_count(), 1);
        assert!(matches!(
            with_text.require_font(&TextMetrics::default()),
            Err(SceneError::MissingFont(1))
        ));
        assert!(images_only.require_font(&TextMetrics::default()).is_ok());
    }
}
