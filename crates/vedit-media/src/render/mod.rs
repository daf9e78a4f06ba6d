//! Frame rendering: drive a [`RenderSurface`] and capture a bounded,
//! time-ordered frame sequence into the workspace.

#[cfg(feature = "chromium")]
mod chromium;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumRenderer;

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use vedit_models::scene::CONTAINER_CLASS;
use vedit_models::{Frame, Scene};

use crate::capability::{FrameRenderer, RenderSurface};
use crate::error::{MediaError, MediaResult};
use crate::workspace::Workspace;

/// Capture cadence.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub frame_count: u32,
    pub frame_rate: u32,
    /// Warm-up after the document loads, before the first capture.
    pub settle: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            frame_count: 60,
            frame_rate: 20,
            settle: Duration::from_secs(1),
        }
    }
}

impl CaptureSettings {
    /// Sleep between captures. Capture latency is not subtracted.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }
}

/// A capture attempt that produced no frame.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureFailure {
    pub index: u32,
    pub error: String,
}

/// Outcome of a render pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderReport {
    /// Captured frames, ascending by index.
    pub frames: Vec<Frame>,
    pub failures: Vec<CaptureFailure>,
}

impl RenderReport {
    pub fn indices(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.index).collect()
    }
}

/// Script forcing the page and scene container onto a transparent background.
pub fn transparent_background_script() -> String {
    format!(
        "(() => {{ for (const el of [document.documentElement, document.body, ...document.querySelectorAll('.{}')]) {{ if (el) el.style.background = 'rgba(0,0,0,0)'; }} }})()",
        CONTAINER_CLASS
    )
}

/// Render `scene` and capture frames into `workspace`.
///
/// Fails only when the surface cannot be opened. Individual capture
/// failures are recorded in the report and the loop moves on.
pub async fn render_scene(
    renderer: &dyn FrameRenderer,
    workspace: &Workspace,
    scene: &Scene,
    settings: &CaptureSettings,
) -> MediaResult<RenderReport> {
    scene.validate().map_err(MediaError::invalid_input)?;
    let document = workspace.write_document(&scene.to_html()).await?;

    info!(
        renderer = renderer.name(),
        document = %document.display(),
        width = scene.width,
        height = scene.height,
        "Opening render surface"
    );
    let mut surface = renderer.open(&document, scene).await?;

    if let Err(e) = surface.evaluate(&transparent_background_script()).await {
        warn!(error = %e, "Could not force transparent background");
    }

    tokio::time::sleep(settings.settle).await;

    let report = capture_frames(surface.as_mut(), workspace, settings).await;

    if let Err(e) = surface.close().await {
        warn!(error = %e, "Render surface did not close cleanly");
    }

    info!(
        captured = report.frames.len(),
        failed = report.failures.len(),
        "Frame capture finished"
    );
    Ok(report)
}

/// Make exactly `frame_count` capture attempts, indexed `0..frame_count`.
pub async fn capture_frames(
    surface: &mut dyn RenderSurface,
    workspace: &Workspace,
    settings: &CaptureSettings,
) -> RenderReport {
    let mut report = RenderReport::default();
    let interval = settings.interval();

    for index in 0..settings.frame_count {
        match capture_one(surface, workspace, index, settings).await {
            Ok(frame) => {
                debug!(frame = index, path = %frame.path.display(), "Captured frame");
                report.frames.push(frame);
            }
            Err(e) => {
                warn!(frame = index, error = %e, "Frame capture failed");
                report.failures.push(CaptureFailure {
                    index,
                    error: e.to_string(),
                });
            }
        }
        tokio::time::sleep(interval).await;
    }

    report
}

async fn capture_one(
    surface: &mut dyn RenderSurface,
    workspace: &Workspace,
    index: u32,
    settings: &CaptureSettings,
) -> MediaResult<Frame> {
    let data = surface.capture().await?;
    if data.is_empty() {
        return Err(MediaError::capture_failed("surface returned no data"));
    }

    let path = workspace.frame_path(index, settings.frame_count);
    tokio::fs::write(&path, &data).await?;
    Ok(Frame::new(index, settings.frame_rate, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Returns no data for the listed capture attempts.
    struct ScriptedSurface {
        attempt: u32,
        empty_on: Vec<u32>,
        scripts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RenderSurface for ScriptedSurface {
        async fn evaluate(&mut self, script: &str) -> MediaResult<()> {
            self.scripts.lock().unwrap().push(script.to_string());
            Ok(())
        }

        async fn capture(&mut self) -> MediaResult<Vec<u8>> {
            let attempt = self.attempt;
            self.attempt += 1;
            if self.empty_on.contains(&attempt) {
                Ok(Vec::new())
            } else {
                Ok(format!("png-{attempt}").into_bytes())
            }
        }

        async fn close(&mut self) -> MediaResult<()> {
            Ok(())
        }
    }

    struct ScriptedRenderer {
        empty_on: Vec<u32>,
        scripts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl FrameRenderer for ScriptedRenderer {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn open(&self, document: &Path, _scene: &Scene) -> MediaResult<Box<dyn RenderSurface>> {
            assert!(document.exists());
            Ok(Box::new(ScriptedSurface {
                attempt: 0,
                empty_on: self.empty_on.clone(),
                scripts: self.scripts.clone(),
            }))
        }
    }

    fn fast_settings(frame_count: u32) -> CaptureSettings {
        CaptureSettings {
            frame_count,
            frame_rate: 1000,
            settle: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_capture_gaps_are_recorded_and_indices_unique() {
        let dir = TempDir::new().unwrap();
        let ws = Workspace::acquire(dir.path().join("frames")).await.unwrap();
        let scripts = Arc::new(Mutex::new(Vec::new()));
        let renderer = ScriptedRenderer {
            empty_on: vec![1, 3],
            scripts: scripts.clone(),
        };

        let report = render_scene(&renderer, &ws, &Scene::default(), &fast_settings(6))
            .await
            .unwrap();

        assert_eq!(report.indices(), vec![0, 2, 4, 5]);
        assert_eq!(
            report.failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(ws.frame_path(2, 6).exists());
        assert!(!ws.frame_path(1, 6).exists());
        assert_eq!(std::fs::read(ws.frame_path(4, 6)).unwrap(), b"png-4");
        assert!(scripts.lock().unwrap()[0].contains("rgba(0,0,0,0)"));

        ws.release().await;
    }

    #[test]
    fn test_interval_and_timestamps() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.interval(), Duration::from_millis(50));
        assert!((Frame::new(59, settings.frame_rate, "f").timestamp - 2.95).abs() < 1e-9);
    }
}
