use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::{BackendRegistry, SyntheticFaceBackend};
use crate::ingest::{LensFacing, SyntheticConfig};
use crate::orientation::RotationState;
use crate::overlay::{Color, OverlayStyle};
use crate::pipeline::PipelineSettings;
use crate::SurfaceSize;

const DEFAULT_SOURCE_URL: &str = "stub://front_camera";
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_SENSOR_ORIENTATION: u16 = 270;
const DEFAULT_POOL_SIZE: usize = 4;
const DEFAULT_SURFACE_WIDTH: u32 = 1080;
const DEFAULT_SURFACE_HEIGHT: u32 = 1920;
const DEFAULT_BACKEND: &str = "synthetic";
const DEFAULT_POINT_RADIUS: f32 = 5.0;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    source: Option<SourceConfigFile>,
    surface: Option<SurfaceConfigFile>,
    detector: Option<DetectorConfigFile>,
    overlay: Option<StyleConfigFile>,
    shutdown_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
    sensor_orientation: Option<u16>,
    lens_facing: Option<LensFacing>,
    pool_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct SurfaceConfigFile {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    fail_every: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct StyleConfigFile {
    point_radius: Option<f32>,
    color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub source: SourceSettings,
    pub surface: SurfaceSize,
    pub detector: DetectorSettings,
    pub style: OverlayStyle,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
    pub sensor_orientation: u16,
    pub lens_facing: LensFacing,
    pub pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    /// Inject a failure every n-th detection (synthetic backend only).
    pub fail_every: Option<u32>,
}

impl OverlayConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OVERLAY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OverlayConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            url: source_file
                .url
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            sensor_orientation: source_file
                .sensor_orientation
                .unwrap_or(DEFAULT_SENSOR_ORIENTATION),
            lens_facing: source_file.lens_facing.unwrap_or_default(),
            pool_size: source_file.pool_size.unwrap_or(DEFAULT_POOL_SIZE),
        };
        let surface = SurfaceSize::new(
            file.surface
                .as_ref()
                .and_then(|surface| surface.width)
                .unwrap_or(DEFAULT_SURFACE_WIDTH),
            file.surface
                .as_ref()
                .and_then(|surface| surface.height)
                .unwrap_or(DEFAULT_SURFACE_HEIGHT),
        );
        let detector = DetectorSettings {
            backend: file
                .detector
                .as_ref()
                .and_then(|detector| detector.backend.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            fail_every: file.detector.and_then(|detector| detector.fail_every),
        };
        let style_file = file.overlay.unwrap_or_default();
        let style = OverlayStyle {
            point_radius: style_file.point_radius.unwrap_or(DEFAULT_POINT_RADIUS),
            color: match style_file.color.as_deref() {
                Some(hex) => Color::parse_hex(hex)?,
                None => Color::WHITE,
            },
        };
        let shutdown_timeout = Duration::from_millis(
            file.shutdown_timeout_ms
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_MS),
        );
        Ok(Self {
            source,
            surface,
            detector,
            style,
            shutdown_timeout,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("OVERLAY_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(fps) = std::env::var("OVERLAY_FPS") {
            self.source.target_fps = fps
                .trim()
                .parse()
                .map_err(|_| anyhow!("OVERLAY_FPS must be an integer frame rate"))?;
        }
        if let Ok(lens) = std::env::var("OVERLAY_LENS") {
            self.source.lens_facing = LensFacing::parse(&lens)?;
        }
        if let Ok(surface) = std::env::var("OVERLAY_SURFACE") {
            self.surface = parse_surface_size(&surface)
                .map_err(|e| anyhow!("OVERLAY_SURFACE: {}", e))?;
        }
        if let Ok(backend) = std::env::var("OVERLAY_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var("OVERLAY_SHUTDOWN_TIMEOUT_MS") {
            let millis: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("OVERLAY_SHUTDOWN_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.shutdown_timeout = Duration::from_millis(millis);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source.target_fps must be at least 1"));
        }
        RotationState::from_degrees(self.source.sensor_orientation)
            .map_err(|_| anyhow!("source.sensor_orientation must be 0, 90, 180 or 270"))?;
        // One buffer in flight plus one being captured.
        if self.source.pool_size < 2 {
            return Err(anyhow!("source.pool_size must be at least 2"));
        }
        if self.surface.is_empty() {
            return Err(anyhow!("surface dimensions must be non-zero"));
        }
        if !self.style.point_radius.is_finite() || self.style.point_radius <= 0.0 {
            return Err(anyhow!("overlay.point_radius must be positive"));
        }
        if self.detector.fail_every == Some(0) {
            self.detector.fail_every = None;
        }
        self.detector.backend = self.detector.backend.to_lowercase();
        Ok(())
    }

    pub fn synthetic_source(&self) -> SyntheticConfig {
        SyntheticConfig {
            url: self.source.url.clone(),
            width: self.source.width,
            height: self.source.height,
            target_fps: self.source.target_fps,
            sensor_orientation: self.source.sensor_orientation,
            lens: self.source.lens_facing,
            pool_size: self.source.pool_size,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            mirrored: self.source.lens_facing.is_mirrored(),
            style: self.style,
            shutdown_timeout: self.shutdown_timeout,
            ..PipelineSettings::default()
        }
    }
}

impl DetectorSettings {
    /// Built-in backends, with failure injection applied to `synthetic`.
    pub fn registry(&self) -> BackendRegistry {
        let mut registry = BackendRegistry::with_builtin();
        if let Some(n) = self.fail_every {
            registry.register(SyntheticFaceBackend::new().with_failure_every(n));
        }
        registry
    }
}

/// Parse `WIDTHxHEIGHT`, e.g. `1080x1920`.
pub fn parse_surface_size(value: &str) -> Result<SurfaceSize> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT (got '{}')", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|_| anyhow!("expected WIDTHxHEIGHT (got '{}')", value))
    };
    let size = SurfaceSize::new(parse(width)?, parse(height)?);
    if size.is_empty() {
        return Err(anyhow!("surface dimensions must be non-zero (got '{}')", value));
    }
    Ok(size)
}

fn read_config_file(path: &Path) -> Result<OverlayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
