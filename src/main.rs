//! # 画布导出工具 — 命令行入口
//!
//! 读取场景文档，按“默认值 → 设置文件 → 命令行参数”的顺序叠加导出配置，
//! 执行一次导出并写出 PNG。业务逻辑分布在库的各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use canvas_export::error::AppError;
use canvas_export::export::{
    Alignment, DownloadSink, ExportQualityProfile, ExportService, FileSink, Resolution,
};
use canvas_export::scene::{ImageLoadLimits, SceneDocument, SceneRasterizer, TextMetrics};
use canvas_export::settings::{self, AppSettings};

#[derive(Debug, Parser)]
#[command(name = "canvas-export", version, about = "Export a canvas scene to a fixed-resolution PNG")]
struct Cli {
    /// Scene document (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Target resolution: 4K, 1080p or 720p
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Font file used to draw text elements (required when the scene has text)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Quality profile: quality, balanced or speed
    #[arg(long)]
    profile: Option<String>,

    /// Crop alignment: top-left or centered
    #[arg(long)]
    align: Option<Alignment>,

    /// Background colour as #rrggbb
    #[arg(long)]
    background: Option<String>,

    /// Settings file (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Device pixel ratio used when rasterizing the scene
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,

    /// Also print the PNG as a data URI
    #[arg(long)]
    data_uri: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let stored = match &cli.settings {
        Some(path) => settings::load_settings(path)?.unwrap_or_default(),
        None => AppSettings::default(),
    };

    let service = ExportService::new();
    stored.apply_to(&service)?;
    apply_flags(&cli, &service)?;

    let resolution = cli.resolution.or(stored.resolution).unwrap_or_default();
    let out_dir = cli
        .out
        .clone()
        .or_else(|| stored.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let metrics = match &cli.font {
        Some(path) => TextMetrics::from_font_file(path)?,
        None => TextMetrics::default(),
    };
    let document = SceneDocument::load(&cli.scene)?;
    document.require_font(&metrics)?;
    let base_dir = cli.scene.parent().unwrap_or_else(|| Path::new("."));
    let scene = document.build(base_dir, metrics, &ImageLoadLimits::default())?;

    let rasterizer = Arc::new(SceneRasterizer::new().with_pixel_ratio(cli.pixel_ratio));
    let sink = FileSink::new(out_dir);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    if cli.data_uri {
        let artifact = runtime.block_on(service.export(rasterizer, scene.snapshot(), resolution))?;
        let location = sink.download(&artifact.bytes, &artifact.file_name)?;
        log::info!("💾 已写出 {}", location);
        println!("{}", artifact.to_data_uri());
    } else {
        let receipt = runtime.block_on(service.export_and_download(
            rasterizer,
            scene.snapshot(),
            resolution,
            &sink,
        ))?;
        log::info!(
            "💾 已写出 {}（{}x{}，{} 字节）",
            receipt.location,
            receipt.width,
            receipt.height,
            receipt.size_bytes
        );
        println!("{}", receipt.location);
    }

    Ok(())
}

fn apply_flags(cli: &Cli, service: &ExportService) -> Result<(), AppError> {
    if let Some(profile) = &cli.profile {
        service.set_quality_profile(ExportQualityProfile::from_str(profile)?)?;
    }
    if let Some(alignment) = cli.align {
        service.set_alignment(alignment)?;
    }
    if let Some(background) = &cli.background {
        service.set_background(settings::parse_hex_color(background)?)?;
    }
    Ok(())
}
