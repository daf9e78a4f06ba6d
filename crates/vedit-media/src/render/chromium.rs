//! Headless Chromium rendering surface over the DevTools protocol.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::debug;

use vedit_models::Scene;

use crate::capability::{FrameRenderer, RenderSurface};
use crate::error::{MediaError, MediaResult};

/// Launches a local headless Chromium per render.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific browser binary instead of auto-detection.
    pub fn with_executable(mut self, path: Option<PathBuf>) -> Self {
        self.executable = path;
        self
    }
}

#[async_trait]
impl FrameRenderer for ChromiumRenderer {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn open(&self, document: &Path, scene: &Scene) -> MediaResult<Box<dyn RenderSurface>> {
        let document = tokio::fs::canonicalize(document).await?;
        let url = format!("file://{}", document.display());

        let mut builder = BrowserConfig::builder()
            .window_size(scene.width, scene.height)
            .viewport(Viewport {
                width: scene.width,
                height: scene.height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });
        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(MediaError::browser_failed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| MediaError::browser_failed(format!("Failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(url = %url, "Navigating render surface");
        let page = match open_page(&browser, &url).await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e);
            }
        };

        Ok(Box::new(ChromiumSurface {
            browser,
            page,
            handler_task,
        }))
    }
}

async fn open_page(browser: &Browser, url: &str) -> MediaResult<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| MediaError::browser_failed(format!("Failed to open page: {e}")))?;
    page.goto(url)
        .await
        .map_err(|e| MediaError::browser_failed(format!("Failed to navigate to {url}: {e}")))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| MediaError::browser_failed(format!("Page did not finish loading: {e}")))?;
    Ok(page)
}

struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl RenderSurface for ChromiumSurface {
    async fn evaluate(&mut self, script: &str) -> MediaResult<()> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| MediaError::browser_failed(format!("Script evaluation failed: {e}")))?;
        Ok(())
    }

    async fn capture(&mut self) -> MediaResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .from_surface(true)
            .capture_beyond_viewport(true)
            .omit_background(true)
            .build();

        self.page
            .screenshot(params)
            .await
            .map_err(|e| MediaError::capture_failed(e.to_string()))
    }

    async fn close(&mut self) -> MediaResult<()> {
        let result = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        result
            .map(|_| ())
            .map_err(|e| MediaError::browser_failed(format!("Failed to close browser: {e}")))
    }
}
