use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{RepChartError, Result};
use crate::render::RenderedFigure;

/// Encode a figure as an RGB8 PNG held in memory
pub fn encode_png(figure: &RenderedFigure) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            figure.pixels(),
            figure.width(),
            figure.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RepChartError::Encode(format!("{}: {}", figure.kind(), e)))?;
    Ok(buffer)
}

/// Write a figure to `path` as PNG and return the number of bytes written
///
/// Missing parent directories are created. The image is encoded before the
/// file is opened, so an encoding failure leaves nothing on disk.
pub fn write_png(figure: &RenderedFigure, path: &Path) -> Result<u64> {
    let bytes = encode_png(figure)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            debug!(directory = %parent.display(), "Creating output directory");
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, &bytes)?;
    info!(
        chart = %figure.kind(),
        path = %path.display(),
        bytes = bytes.len(),
        "Chart written"
    );
    Ok(bytes.len() as u64)
}
