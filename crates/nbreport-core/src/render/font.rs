use crate::error::ReportError;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo, UnicodeCmap};
use pdf_writer::{Filter, Finish, Name, Pdf, Rect, Ref, Str};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resource name the overlay text uses on every page.
pub const FONT_RESOURCE: Name<'static> = Name(b"F1");

const SYSTEM_INFO: SystemInfo<'static> = SystemInfo {
    registry: Str(b"Adobe"),
    ordering: Str(b"Identity"),
    supplement: 0,
};

/// Font used for the overlay values.
pub enum OverlayFont {
    /// Standard Helvetica, not embedded.
    Helvetica,
    /// TrueType program embedded as a Type0 font with Identity-H encoding.
    Embedded(EmbeddedFont),
}

impl OverlayFont {
    /// Embedded font from `path`, or Helvetica when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, ReportError> {
        match path {
            None => Ok(OverlayFont::Helvetica),
            Some(path) => EmbeddedFont::from_file(path).map(OverlayFont::Embedded),
        }
    }

    /// Bytes to pass to `Tj` for `text`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            OverlayFont::Helvetica => text.bytes().filter(u8::is_ascii).collect(),
            OverlayFont::Embedded(font) => font.encode(text),
        }
    }

    /// Write the font objects, returning the reference for page resources.
    ///
    /// `texts` lists every string shown with this font; the embedded variant
    /// records widths and Unicode mappings for their glyphs only.
    pub fn write(&self, pdf: &mut Pdf, alloc: &mut Ref, texts: &[String]) -> Result<Ref, ReportError> {
        match self {
            OverlayFont::Helvetica => {
                let id = alloc.bump();
                pdf.type1_font(id)
                    .base_font(Name(b"Helvetica"))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                Ok(id)
            }
            OverlayFont::Embedded(font) => font.write(pdf, alloc, texts),
        }
    }
}

/// A parsed TrueType font file.
pub struct EmbeddedFont {
    path: PathBuf,
    data: Vec<u8>,
    base_name: String,
}

impl EmbeddedFont {
    pub fn from_file(path: &Path) -> Result<Self, ReportError> {
        let data = std::fs::read(path).map_err(|e| ReportError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(path, data)
    }

    pub fn from_bytes(path: &Path, data: Vec<u8>) -> Result<Self, ReportError> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| ReportError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let base_name = postscript_name(&face).unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Embedded")
                .to_string()
        });
        debug!(font = %base_name, path = %path.display(), "loaded overlay font");
        Ok(EmbeddedFont {
            path: path.to_path_buf(),
            data,
            base_name: sanitize_name(&base_name),
        })
    }

    fn face(&self) -> Result<ttf_parser::Face<'_>, ReportError> {
        ttf_parser::Face::parse(&self.data, 0).map_err(|e| ReportError::Font {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Big-endian glyph ids; characters without a glyph map to `.notdef`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let Ok(face) = self.face() else {
            return Vec::new();
        };
        text.chars()
            .flat_map(|c| {
                let gid = face.glyph_index(c).map(|g| g.0).unwrap_or_else(|| {
                    warn!(char = %c, font = %self.base_name, "glyph missing from overlay font");
                    0
                });
                gid.to_be_bytes()
            })
            .collect()
    }

    fn write(&self, pdf: &mut Pdf, alloc: &mut Ref, texts: &[String]) -> Result<Ref, ReportError> {
        let face = self.face()?;
        let scale = 1000.0 / f32::from(face.units_per_em().max(1));

        // glyph id -> (char, advance in 1/1000 em)
        let mut glyphs: BTreeMap<u16, (char, f32)> = BTreeMap::new();
        for c in texts.iter().flat_map(|t| t.chars()) {
            if let Some(gid) = face.glyph_index(c) {
                let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                glyphs.insert(gid.0, (c, f32::from(advance) * scale));
            }
        }

        let type0_id = alloc.bump();
        let cid_id = alloc.bump();
        let descriptor_id = alloc.bump();
        let cmap_id = alloc.bump();
        let file_id = alloc.bump();
        let name = Name(self.base_name.as_bytes());

        pdf.type0_font(type0_id)
            .base_font(name)
            .encoding_predefined(Name(b"Identity-H"))
            .descendant_font(cid_id)
            .to_unicode(cmap_id);

        let mut cid = pdf.cid_font(cid_id);
        cid.subtype(CidFontType::Type2)
            .base_font(name)
            .system_info(SYSTEM_INFO)
            .font_descriptor(descriptor_id)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        {
            let mut widths = cid.widths();
            for (gid, (_, advance)) in &glyphs {
                widths.consecutive(*gid, [*advance]);
            }
        }
        cid.finish();

        let bbox = face.global_bounding_box();
        pdf.font_descriptor(descriptor_id)
            .name(name)
            .flags(FontFlags::NON_SYMBOLIC)
            .bbox(Rect::new(
                f32::from(bbox.x_min) * scale,
                f32::from(bbox.y_min) * scale,
                f32::from(bbox.x_max) * scale,
                f32::from(bbox.y_max) * scale,
            ))
            .italic_angle(0.0)
            .ascent(f32::from(face.ascender()) * scale)
            .descent(f32::from(face.descender()) * scale)
            .cap_height(f32::from(face.capital_height().unwrap_or(face.ascender())) * scale)
            .stem_v(80.0)
            .font_file2(file_id);

        let mut cmap = UnicodeCmap::new(Name(b"Custom"), SYSTEM_INFO);
        for (gid, (c, _)) in &glyphs {
            cmap.pair(*gid, *c);
        }
        pdf.cmap(cmap_id, &cmap.finish());

        let compressed = super::deflate(&self.data)?;
        pdf.stream(file_id, &compressed)
            .filter(Filter::FlateDecode)
            .pair(Name(b"Length1"), self.data.len() as i32);

        Ok(type0_id)
    }
}

fn postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .find_map(|n| n.to_string())
}

/// PDF names must not contain whitespace or delimiters.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect();
    if cleaned.is_empty() {
        "Embedded".into()
    } else {
        cleaned
    }
}
