//! PDF rasterization via MuPDF
//!
//! Converts uploaded PDF bytes into one PNG per page at a fixed target
//! resolution. MuPDF's fz_context is not thread-safe and the rendering is
//! CPU-bound, so the whole document is processed inside `spawn_blocking`
//! with a document instance owned by that one task.

use std::path::PathBuf;

use mupdf::{Colorspace, Document, Matrix};

use crate::error::{AppError, Result};

/// PDF pages are laid out at 72 points per inch; scale up from there.
const PDF_BASE_DPI: f32 = 72.0;

/// Rendering parameters for one document
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Target resolution; pages are scaled by dpi / 72.
    pub dpi: f32,
    /// When set, rendered pages are written to a timestamped subdirectory
    /// for inspection. Dump failures are logged and ignored.
    pub debug_dir: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            debug_dir: None,
        }
    }
}

/// Rasterize every page of a PDF into PNG bytes, in page order.
pub async fn render_pdf_to_images(bytes: Vec<u8>, options: RenderOptions) -> Result<Vec<Vec<u8>>> {
    let result = tokio::task::spawn_blocking(move || render_blocking(&bytes, &options))
        .await
        .map_err(|e| AppError::Internal(format!("Render task panicked: {}", e)))?;

    result
}

fn render_blocking(bytes: &[u8], options: &RenderOptions) -> Result<Vec<Vec<u8>>> {
    let doc = Document::from_bytes(bytes, "application/pdf")
        .map_err(|e| AppError::Render(format!("Not a valid PDF: {}", e)))?;

    let page_count = doc
        .page_count()
        .map_err(|e| AppError::Render(e.to_string()))? as usize;

    let scale = options.dpi / PDF_BASE_DPI;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();

    let mut images = Vec::with_capacity(page_count);

    for page_num in 0..page_count {
        let page = doc
            .load_page(page_num as i32)
            .map_err(|e| AppError::Render(format!("Failed to load page {}: {}", page_num + 1, e)))?;

        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, false)
            .map_err(|e| AppError::Render(format!("Failed to render page {}: {}", page_num + 1, e)))?;

        let png = encode_pixmap_png(&pixmap)?;

        tracing::debug!(
            page = page_num + 1,
            width = pixmap.width(),
            height = pixmap.height(),
            bytes = png.len(),
            "Rendered page"
        );

        images.push(png);
    }

    if let Some(dir) = &options.debug_dir {
        dump_debug_images(dir, &images);
    }

    Ok(images)
}

/// Encode a MuPDF pixmap as PNG via the image crate
fn encode_pixmap_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize; // components per pixel

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(0);
            let g = samples.get(offset + 1).copied().unwrap_or(0);
            let b = samples.get(offset + 2).copied().unwrap_or(0);
            rgb_buffer.extend_from_slice(&[r, g, b]);
        }
    }

    let img = image::RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| AppError::Render("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut output),
            image::ImageFormat::Png,
        )
        .map_err(|e| AppError::Render(format!("PNG encoding failed: {}", e)))?;

    Ok(output)
}

/// Write rendered pages to `<dir>/<timestamp>/page_N.png`. Debug aid only;
/// never fails the render.
fn dump_debug_images(dir: &std::path::Path, images: &[Vec<u8>]) {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let target = dir.join(timestamp);

    if let Err(e) = std::fs::create_dir_all(&target) {
        tracing::warn!("Failed to create debug image dir {}: {}", target.display(), e);
        return;
    }

    for (i, png) in images.iter().enumerate() {
        let path = target.join(format!("page_{}.png", i + 1));
        if let Err(e) = std::fs::write(&path, png) {
            tracing::warn!("Failed to write debug image {}: {}", path.display(), e);
        }
    }

    tracing::debug!(count = images.len(), dir = %target.display(), "Saved debug images");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal but well-formed PDF with the given number of blank
    /// pages, computing real xref offsets.
    fn minimal_pdf(page_count: usize) -> Vec<u8> {
        let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + i)).collect();

        let mut objects: Vec<String> = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                page_count
            ),
        ];
        for _ in 0..page_count {
            objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] >>".to_string());
        }

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, obj) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, obj));
        }

        let xref_pos = out.len();
        out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        out.push_str("0000000000 65535 f \n");
        for off in &offsets {
            out.push_str(&format!("{:010} 00000 n \n", off));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_pos
        ));

        out.into_bytes()
    }

    #[tokio::test]
    async fn renders_one_image_per_page() {
        for pages in [1usize, 3] {
            let images = render_pdf_to_images(minimal_pdf(pages), RenderOptions::default())
                .await
                .unwrap();
            assert_eq!(images.len(), pages);
        }
    }

    #[tokio::test]
    async fn output_is_png() {
        let images = render_pdf_to_images(minimal_pdf(1), RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(&images[0][..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn dpi_controls_output_size() {
        // 200pt page at 150 DPI → 200 * 150/72 ≈ 417px
        let images = render_pdf_to_images(minimal_pdf(1), RenderOptions::default())
            .await
            .unwrap();
        let img = image::load_from_memory(&images[0]).unwrap();
        assert!((415..=419).contains(&img.width()));
    }

    #[tokio::test]
    async fn invalid_bytes_fail_with_render_error() {
        let result =
            render_pdf_to_images(b"not a pdf at all".to_vec(), RenderOptions::default()).await;
        assert!(matches!(result, Err(AppError::Render(_))));
    }

    #[tokio::test]
    async fn debug_dump_writes_page_files() {
        let dir = tempfile::tempdir().unwrap();
        let options = RenderOptions {
            dpi: 150.0,
            debug_dir: Some(dir.path().to_path_buf()),
        };
        render_pdf_to_images(minimal_pdf(2), options).await.unwrap();

        let subdir = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        assert!(subdir.join("page_1.png").exists());
        assert!(subdir.join("page_2.png").exists());
    }
}
