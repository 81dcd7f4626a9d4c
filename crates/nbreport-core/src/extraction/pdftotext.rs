use crate::error::ReportError;
use crate::extraction::{BBox, DocumentLayout, LayoutExtractor, PageLayout, Word};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;
use tracing::debug;

/// Layout extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -bbox` to get every word with its bounding box.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutExtractor for PdftotextExtractor {
    fn extract_layout(&self, pdf_bytes: &[u8]) -> Result<DocumentLayout, ReportError> {
        // Write PDF bytes to a temp file
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| ReportError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| ReportError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReportError::ToolNotFound { tool: "pdftotext" }
                } else {
                    ReportError::Extraction(format!("pdftotext -bbox failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ReportError::ToolFailed {
                tool: "pdftotext",
                code,
                stderr,
            });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let layout = parse_bbox_xhtml(&xml)?;
        debug!(
            pages = layout.pages.len(),
            words = layout.pages.iter().map(|p| p.words.len()).sum::<usize>(),
            "extracted template layout"
        );
        Ok(layout)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Parse the XHTML written by `pdftotext -bbox`.
///
/// ```text
/// <page width="841.92" height="595.32">
///   <word xMin="56.8" yMin="61.2" xMax="98.1" yMax="73.2">백업용량</word>
/// ```
pub fn parse_bbox_xhtml(xml: &str) -> Result<DocumentLayout, ReportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<PageLayout> = Vec::new();
    let mut current_word: Option<(BBox, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ReportError::Extraction(format!("malformed pdftotext output: {e}")))?;

        match event {
            Event::Start(tag) | Event::Empty(tag) if tag.local_name().as_ref() == b"page" => {
                pages.push(PageLayout {
                    page_number: pages.len() + 1,
                    width: attr_f32(&tag, "width")?,
                    height: attr_f32(&tag, "height")?,
                    words: Vec::new(),
                });
            }
            Event::Start(tag) if tag.local_name().as_ref() == b"word" => {
                let bbox = BBox {
                    x_min: attr_f32(&tag, "xMin")?,
                    y_min: attr_f32(&tag, "yMin")?,
                    x_max: attr_f32(&tag, "xMax")?,
                    y_max: attr_f32(&tag, "yMax")?,
                };
                current_word = Some((bbox, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, buf)) = current_word.as_mut() {
                    let unescaped = text.unescape().map_err(|e| {
                        ReportError::Extraction(format!("malformed word text: {e}"))
                    })?;
                    buf.push_str(&unescaped);
                }
            }
            Event::End(tag) if tag.local_name().as_ref() == b"word" => {
                if let (Some((bbox, text)), Some(page)) = (current_word.take(), pages.last_mut()) {
                    let text = text.trim();
                    if !text.is_empty() {
                        page.words.push(Word {
                            text: text.to_string(),
                            bbox,
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if pages.is_empty() {
        return Err(ReportError::Extraction(
            "no pages in pdftotext -bbox output".into(),
        ));
    }

    Ok(DocumentLayout { pages })
}

fn attr_f32(tag: &BytesStart<'_>, name: &str) -> Result<f32, ReportError> {
    let attr = tag
        .try_get_attribute(name)
        .map_err(|e| ReportError::Extraction(format!("bad attribute '{name}': {e}")))?
        .ok_or_else(|| ReportError::Extraction(format!("missing attribute '{name}'")))?;
    let value = attr
        .unescape_value()
        .map_err(|e| ReportError::Extraction(format!("bad attribute '{name}': {e}")))?;
    value
        .trim()
        .parse()
        .map_err(|_| ReportError::Extraction(format!("attribute '{name}' is not a number: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN"
"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="Microsoft Word"/>
</head>
<body>
<doc>
  <page width="841.920000" height="595.320000">
    <word xMin="56.800000" yMin="61.200000" xMax="98.100000" yMax="73.200000">Cover</word>
  </page>
  <page width="841.920000" height="595.320000">
    <word xMin="300.000000" yMin="100.000000" xMax="340.000000" yMax="110.000000">백업용량</word>
    <word xMin="40.000000" yMin="120.000000" xMax="90.000000" yMax="130.000000">E-HR_WAS</word>
    <word xMin="95.000000" yMin="120.000000" xMax="99.000000" yMax="130.000000">&amp;</word>
    <word xMin="1" yMin="1" xMax="2" yMax="2">   </word>
  </page>
</doc>
</body>
</html>
"#;

    #[test]
    fn test_parse_bbox_xhtml_pages_and_words() {
        let layout = parse_bbox_xhtml(SAMPLE).unwrap();
        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.pages[0].page_number, 1);
        assert_eq!(layout.pages[0].width, 841.92);
        assert_eq!(layout.pages[0].height, 595.32);

        let page2 = layout.page(2).unwrap();
        assert_eq!(page2.words.len(), 3);
        let header = page2.find_word("백업용량").unwrap();
        assert_eq!(header.bbox.x_min, 300.0);
        assert_eq!(header.bbox.y_max, 110.0);
        assert_eq!(page2.words[2].text, "&");
    }

    #[test]
    fn test_no_pages_is_error() {
        let err = parse_bbox_xhtml("<html><body><doc></doc></body></html>").unwrap_err();
        assert!(matches!(err, ReportError::Extraction(_)));
    }

    #[test]
    fn test_missing_coordinate_is_error() {
        let xml = r#"<doc><page width="10" height="10"><word xMin="1" yMin="1" xMax="2">x</word></page></doc>"#;
        assert!(parse_bbox_xhtml(xml).is_err());
    }
}
