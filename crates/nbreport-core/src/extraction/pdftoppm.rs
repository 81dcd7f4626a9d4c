use crate::error::ReportError;
use crate::extraction::{PageRaster, Rasterizer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const PAGE_PREFIX: &str = "page";

/// Rasterization backend using pdftoppm (from poppler-utils).
///
/// Page images are cached under `cache_root/<template hash>-<dpi>dpi/`, so a
/// template is only rendered once per resolution.
pub struct PdftoppmRasterizer {
    cache_root: PathBuf,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(cache_root: impl Into<PathBuf>, dpi: u32) -> Self {
        PdftoppmRasterizer {
            cache_root: cache_root.into(),
            dpi,
        }
    }

    /// Default cache location under the system temp directory.
    pub fn default_cache_root() -> PathBuf {
        std::env::temp_dir().join("nbreport-template-img")
    }

    /// Cache directory for a given template.
    pub fn cache_dir(&self, pdf_bytes: &[u8]) -> PathBuf {
        self.cache_root
            .join(format!("{}-{}dpi", template_key(pdf_bytes), self.dpi))
    }

    fn render_into(&self, pdf_bytes: &[u8], target: &Path) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.cache_root)?;
        // Render into a scratch directory next to the target, then move it in
        // one step so a half-written cache is never picked up.
        let scratch = tempfile::Builder::new()
            .prefix(".render-")
            .tempdir_in(&self.cache_root)?;

        let pdf_path = scratch.path().join("template.pdf");
        std::fs::File::create(&pdf_path)?.write_all(pdf_bytes)?;

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&pdf_path)
            .arg(scratch.path().join(PAGE_PREFIX))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReportError::ToolNotFound { tool: "pdftoppm" }
                } else {
                    ReportError::Raster(format!("pdftoppm failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ReportError::ToolFailed {
                tool: "pdftoppm",
                code,
                stderr,
            });
        }

        std::fs::remove_file(&pdf_path)?;
        if page_images(scratch.path())?.is_empty() {
            return Err(ReportError::Raster("pdftoppm produced no page images".into()));
        }

        match std::fs::rename(scratch.path(), target) {
            Ok(()) => Ok(()),
            // Another run filled the cache first.
            Err(_) if target.is_dir() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_bytes: &[u8]) -> Result<Vec<PageRaster>, ReportError> {
        let dir = self.cache_dir(pdf_bytes);
        if dir.is_dir() {
            debug!(cache = %dir.display(), "using cached template images");
        } else {
            info!(cache = %dir.display(), dpi = self.dpi, "rasterizing template");
            self.render_into(pdf_bytes, &dir)?;
        }

        page_images(&dir)?
            .into_iter()
            .map(|(page_number, path)| -> Result<PageRaster, ReportError> {
                let image = image::open(&path)?.to_rgb8();
                Ok(PageRaster { page_number, image })
            })
            .collect()
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// Stable identity of a template: BLAKE3 of its bytes, first 16 hex digits.
fn template_key(pdf_bytes: &[u8]) -> String {
    let hex = blake3::hash(pdf_bytes).to_hex();
    hex[..16].to_string()
}

/// `page-1.png`, `page-01.png`, ... sorted by page number.
///
/// pdftoppm zero-pads the page number to the width of the page count.
fn page_images(dir: &Path) -> Result<Vec<(usize, PathBuf)>, ReportError> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(number) = page_number(name) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages)
}

fn page_number(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number("page-1.png"), Some(1));
        assert_eq!(page_number("page-07.png"), Some(7));
        assert_eq!(page_number("page-12.png"), Some(12));
        assert_eq!(page_number("page-1.ppm"), None);
        assert_eq!(page_number("template.pdf"), None);
    }

    #[test]
    fn test_template_key_is_fixed_digest() {
        // BLAKE3 of the empty input
        assert_eq!(template_key(b""), "af1349b9f5f9a1a6");
        assert_eq!(template_key(b"%PDF-1").len(), 16);
    }

    #[test]
    fn test_cache_dir_keyed_by_content_and_dpi() {
        let a = PdftoppmRasterizer::new("/tmp/cache", 150);
        let b = PdftoppmRasterizer::new("/tmp/cache", 300);
        assert_eq!(a.cache_dir(b"%PDF-1"), a.cache_dir(b"%PDF-1"));
        assert_ne!(a.cache_dir(b"%PDF-1"), a.cache_dir(b"%PDF-2"));
        assert_ne!(a.cache_dir(b"%PDF-1"), b.cache_dir(b"%PDF-1"));
    }

    #[test]
    fn test_cached_pages_loaded_in_order() {
        let root = tempfile::tempdir().unwrap();
        let raster = PdftoppmRasterizer::new(root.path(), 150);
        let pdf = b"%PDF-1.4 cached";
        let dir = raster.cache_dir(pdf);
        std::fs::create_dir_all(&dir).unwrap();
        for (n, width) in [(2usize, 3u32), (10, 5), (1, 2)] {
            let img = image::RgbImage::from_pixel(width, 1, image::Rgb([255, 255, 255]));
            img.save(dir.join(format!("page-{n:02}.png"))).unwrap();
        }

        let pages = raster.rasterize(pdf).unwrap();
        let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(pages[2].image.width(), 5);
    }
}
