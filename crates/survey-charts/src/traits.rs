//! Chart renderer trait definitions.

use async_trait::async_trait;
use std::path::Path;
use survey_common::{Distribution, ReportError, Result};

/// Turns one question's distribution into an encoded image.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Renders `distribution` under `title` and returns the PNG bytes.
    async fn render_to_bytes(&self, title: &str, distribution: &Distribution) -> Result<Vec<u8>>;

    /// Renders and writes the image to `path`.
    async fn render_to_file(
        &self,
        title: &str,
        distribution: &Distribution,
        path: &Path,
    ) -> Result<()> {
        let bytes = self.render_to_bytes(title, distribution).await?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| ReportError::io_with_source(format!("writing {}", path.display()), e))
    }

    /// Gets the name of this chart type.
    fn name(&self) -> &'static str;
}
