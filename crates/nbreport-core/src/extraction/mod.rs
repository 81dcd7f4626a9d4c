pub mod pdftoppm;
pub mod pdftotext;

use crate::error::ReportError;
use serde::{Deserialize, Serialize};

/// Rectangle in PDF points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Smallest box enclosing all of `boxes`.
    pub fn union<'a, I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes.into_iter().fold(None, |acc: Option<BBox>, b| {
            Some(match acc {
                None => *b,
                Some(a) => BBox {
                    x_min: a.x_min.min(b.x_min),
                    y_min: a.y_min.min(b.y_min),
                    x_max: a.x_max.max(b.x_max),
                    y_max: a.y_max.max(b.y_max),
                },
            })
        })
    }
}

/// A rendered word and where it sits on its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

/// Text layout of a single page of a PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: usize,
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
}

impl PageLayout {
    /// First word whose text is exactly `text`.
    pub fn find_word(&self, text: &str) -> Option<&Word> {
        self.words.iter().find(|w| w.text == text)
    }

    /// Words whose top edge lies within `tolerance` of `y_min`, left to right.
    pub fn line_words(&self, y_min: f32, tolerance: f32) -> Vec<&Word> {
        let mut line: Vec<&Word> = self
            .words
            .iter()
            .filter(|w| (w.bbox.y_min - y_min).abs() <= tolerance)
            .collect();
        line.sort_by(|a, b| a.bbox.x_min.total_cmp(&b.bbox.x_min));
        line
    }
}

/// Text layout of a whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Page by 1-based number.
    pub fn page(&self, page_number: usize) -> Option<&PageLayout> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }
}

/// Trait for word-layout extraction backends.
pub trait LayoutExtractor: Send + Sync {
    /// Extract page sizes and word boxes from PDF bytes.
    fn extract_layout(&self, pdf_bytes: &[u8]) -> Result<DocumentLayout, ReportError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// One page rendered to pixels.
#[derive(Debug, Clone)]
pub struct PageRaster {
    pub page_number: usize,
    pub image: image::RgbImage,
}

/// Trait for page rasterization backends.
pub trait Rasterizer: Send + Sync {
    /// Render every page of the PDF, in page order.
    fn rasterize(&self, pdf_bytes: &[u8]) -> Result<Vec<PageRaster>, ReportError>;

    /// Name of this rasterization backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Word {
        Word {
            text: text.into(),
            bbox: BBox { x_min, y_min, x_max, y_max },
        }
    }

    #[test]
    fn test_bbox_union() {
        let boxes = [
            BBox { x_min: 10.0, y_min: 5.0, x_max: 20.0, y_max: 9.0 },
            BBox { x_min: 2.0, y_min: 6.0, x_max: 12.0, y_max: 11.0 },
        ];
        let u = BBox::union(&boxes).unwrap();
        assert_eq!(u, BBox { x_min: 2.0, y_min: 5.0, x_max: 20.0, y_max: 11.0 });
        assert!(BBox::union(&[] as &[BBox]).is_none());
    }

    #[test]
    fn test_line_words_within_tolerance_sorted() {
        let page = PageLayout {
            page_number: 1,
            width: 100.0,
            height: 100.0,
            words: vec![
                word("right", 50.0, 10.3, 60.0, 18.0),
                word("left", 5.0, 10.0, 20.0, 17.5),
                word("below", 5.0, 11.0, 20.0, 19.0),
            ],
        };
        let line: Vec<&str> = page
            .line_words(10.0, 0.7)
            .iter()
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(line, vec!["left", "right"]);
        assert_eq!(page.find_word("below").unwrap().bbox.y_min, 11.0);
    }
}
