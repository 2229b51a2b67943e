//! Top-level `Reader`/`Page` API (§6): resolves the page tree (with
//! inherited `/Resources`, `/MediaBox`/`/CropBox`, `/Rotate`), decodes a
//! page's content streams, builds its font table, and wires L3 (content
//! parser) through L4 (interpretation), L6 (images) and L7-L12 (table
//! reconstruction) into five public extraction surfaces.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::codec;
use crate::error::{PdfError, Result};
use crate::font::{self, FontDecoder, FontDecoderConfig};
use crate::image::{self, Image};
use crate::interp::{self, FontEntry, FontMetrics, Fonts};
use crate::layout::{self, Table, TableRegion};
use crate::model::geometry::Rectangle;
use crate::model::objects::{PDFObjRef, PDFObject};
use crate::model::state::{GraphicsElement, TextElement};
use crate::parser::content;
use crate::parser::object_parser::Parser;
use crate::parser::xref::{Xref, XrefEntry};

/// Page attributes that inherit down the `/Pages` tree per ISO 32000-1
/// §7.7.3.4: a descendant's own dictionary entry wins; otherwise the
/// nearest ancestor's value applies.
#[derive(Debug, Clone, Default)]
struct InheritedAttrs {
    resources: Option<HashMap<String, PDFObject>>,
    media_box: Option<[f64; 4]>,
    crop_box: Option<[f64; 4]>,
    rotate: Option<i64>,
}

impl InheritedAttrs {
    fn merged_with(&self, dict: &HashMap<String, PDFObject>, reader: &Reader) -> Self {
        Self {
            resources: reader.dict_resources(dict).or_else(|| self.resources.clone()),
            media_box: reader.dict_rect(dict, "MediaBox").or(self.media_box),
            crop_box: reader.dict_rect(dict, "CropBox").or(self.crop_box),
            rotate: dict
                .get("Rotate")
                .and_then(|o| reader.resolve_obj(o))
                .and_then(|o| o.as_int().ok())
                .or(self.rotate),
        }
    }
}

/// A leaf `/Page` node discovered while walking the tree, with its
/// inherited attributes already resolved.
struct PageNode {
    objid: u32,
    attrs: InheritedAttrs,
}

/// One page's resolved attributes and decoded content, ready for
/// interpretation. Immutable once built; per §3's Lifecycle, nothing here
/// outlives the extraction call that produced it.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    /// `/MediaBox`, inherited if absent on the page itself.
    pub media_box: Rectangle,
    /// `/CropBox` intersected with `/MediaBox`, or `media_box` alone when
    /// no `/CropBox` is present anywhere up the tree.
    pub bounds: Rectangle,
    /// `/Rotate`, normalized into `[0, 360)`; recorded but not baked into
    /// emitted text/graphics geometry.
    pub rotation: i64,
    pub resources: HashMap<String, PDFObject>,
    content: Vec<u8>,
}

/// A PDF reader: owns the file bytes, the cross-reference index, and a
/// lazily-populated object cache. Safe to share across threads (the cache
/// is mutex-guarded for single-writer/multi-reader access per §5); it is
/// not meant to be shared across separate `Reader`s.
pub struct Reader {
    data: Vec<u8>,
    xref: Xref,
    object_cache: Mutex<HashMap<u32, PDFObject>>,
    pages: Vec<PageNode>,
}

impl Reader {
    /// Open a PDF file, reading it fully into memory. The file handle is
    /// released as soon as the read completes (§5's "scoped acquisition"
    /// is satisfied by never holding one past construction).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Build a reader from already-loaded PDF bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let xref = Xref::build(&data)?;
        let mut reader = Self {
            data,
            xref,
            object_cache: Mutex::new(HashMap::new()),
            pages: Vec::new(),
        };
        reader.pages = reader.discover_pages()?;
        Ok(reader)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Resolve one indirect reference, following classical in-use offsets,
    /// object-stream (`/Type /ObjStm`) compressed entries, or the lazily
    /// populated cache. Free entries and anything unreadable resolve to
    /// `None`.
    pub fn resolve(&self, r: PDFObjRef) -> Option<PDFObject> {
        if let Ok(cache) = self.object_cache.lock()
            && let Some(obj) = cache.get(&r.objid)
        {
            return Some(obj.clone());
        }
        let resolved = self.resolve_uncached(r)?;
        if let Ok(mut cache) = self.object_cache.lock() {
            cache.insert(r.objid, resolved.clone());
        }
        Some(resolved)
    }

    fn resolve_uncached(&self, r: PDFObjRef) -> Option<PDFObject> {
        match self.xref.get(r.objid)? {
            XrefEntry::InUse { offset, .. } => {
                let mut parser = Parser::at(&self.data, offset as usize);
                let (_, _, obj) = parser.parse_indirect_object().ok()?;
                Some(obj)
            }
            XrefEntry::Compressed { stream_objid, index } => self.resolve_compressed(stream_objid, index),
            XrefEntry::Free { .. } => None,
        }
    }

    /// Pull one object out of an object stream: decode the stream, read
    /// its `N` `(objid, offset)` header pairs, and parse the object at
    /// `First + offset` for the given member index.
    fn resolve_compressed(&self, stream_objid: u32, index: u32) -> Option<PDFObject> {
        let stream_obj = self.resolve(PDFObjRef::new(stream_objid, 0))?;
        let stream = stream_obj.as_stream().ok()?;
        let decoded = codec::decode_stream_filters(&stream.raw_data, &stream.dict).ok()?;
        let n = stream.get("N").and_then(|o| o.as_int().ok())? as usize;
        let first = stream.get("First").and_then(|o| o.as_int().ok())? as usize;

        let mut header = Parser::new(&decoded);
        let mut offsets = Vec::with_capacity(n);
        for _ in 0..n {
            let _objid = header.parse_object().ok()?.as_int().ok()?;
            let offset = header.parse_object().ok()?.as_int().ok()? as usize;
            offsets.push(offset);
        }
        let rel_offset = *offsets.get(index as usize)?;

        let mut body = Parser::new(&decoded);
        body.set_pos(first + rel_offset);
        body.parse_object().ok()
    }

    /// One-hop dereference: an indirect reference resolves through
    /// [`Self::resolve`]; any other object is handed back as-is.
    fn resolve_obj(&self, obj: &PDFObject) -> Option<PDFObject> {
        match obj {
            PDFObject::IndirectReference(r) => self.resolve(*r),
            other => Some(other.clone()),
        }
    }

    fn dict_resources(&self, dict: &HashMap<String, PDFObject>) -> Option<HashMap<String, PDFObject>> {
        let obj = dict.get("Resources")?;
        self.resolve_obj(obj)?.as_dict().ok().cloned()
    }

    fn dict_rect(&self, dict: &HashMap<String, PDFObject>, key: &str) -> Option<[f64; 4]> {
        let obj = dict.get(key)?;
        let arr = self.resolve_obj(obj)?.as_array().ok()?.to_vec();
        if arr.len() != 4 {
            return None;
        }
        let mut out = [0.0; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.resolve_obj(&arr[i])?.as_num().ok()?;
        }
        Some(out)
    }

    /// Walk `/Root/Pages` collecting leaf `/Page` nodes in document order,
    /// merging inherited attributes down each branch. Guards against
    /// `/Kids` cycles with a visited-set, since a malformed file could
    /// otherwise loop forever.
    fn discover_pages(&self) -> Result<Vec<PageNode>> {
        let root_ref = self
            .xref
            .trailer
            .get("Root")
            .and_then(|o| o.as_ref().ok())
            .ok_or_else(|| PdfError::XrefError("trailer is missing /Root".into()))?;
        let root = self
            .resolve(root_ref)
            .ok_or_else(|| PdfError::XrefError("unresolved /Root catalog".into()))?;
        let catalog = root.as_dict()?;
        let pages_ref = catalog
            .get("Pages")
            .ok_or_else(|| PdfError::XrefError("catalog is missing /Pages".into()))?
            .as_ref()
            .map_err(|_| PdfError::XrefError("/Pages must be an indirect reference".into()))?;

        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.walk_page_tree(pages_ref, &InheritedAttrs::default(), &mut visited, &mut out);
        Ok(out)
    }

    fn walk_page_tree(
        &self,
        node_ref: PDFObjRef,
        inherited: &InheritedAttrs,
        visited: &mut HashSet<u32>,
        out: &mut Vec<PageNode>,
    ) {
        if !visited.insert(node_ref.objid) {
            return;
        }
        let Some(obj) = self.resolve(node_ref) else {
            return;
        };
        let Ok(dict) = obj.as_dict() else {
            return;
        };
        let merged = inherited.merged_with(dict, self);

        if let Some(kids) = dict.get("Kids").and_then(|k| self.resolve_obj(k)) {
            let Ok(kids) = kids.as_array().map(|s| s.to_vec()) else {
                return;
            };
            for kid in &kids {
                if let Ok(kid_ref) = kid.as_ref() {
                    self.walk_page_tree(kid_ref, &merged, visited, out);
                }
            }
            return;
        }

        out.push(PageNode {
            objid: node_ref.objid,
            attrs: merged,
        });
    }

    /// Build one page's resolved attributes and decoded content. Rebuilt
    /// fresh on every call, per §3's Lifecycle guarantee that nothing
    /// outlives a single page extraction.
    pub fn page(&self, index: usize) -> Result<Page> {
        let node = self
            .pages
            .get(index)
            .ok_or_else(|| PdfError::InvalidArgument(format!("page index {index} out of range")))?;
        let obj = self
            .resolve(PDFObjRef::new(node.objid, 0))
            .ok_or_else(|| PdfError::XrefError(format!("unresolved page object {}", node.objid)))?;
        let dict = obj.as_dict()?;

        let media_box = node.attrs.media_box.unwrap_or([0.0, 0.0, 612.0, 792.0]);
        let media_rect = Rectangle::from_corners(media_box[0], media_box[1], media_box[2], media_box[3]);
        let bounds = match node.attrs.crop_box {
            Some(cb) => media_rect.intersect(&Rectangle::from_corners(cb[0], cb[1], cb[2], cb[3])),
            None => media_rect,
        };
        let rotation = node.attrs.rotate.unwrap_or(0).rem_euclid(360);
        let resources = node.attrs.resources.clone().unwrap_or_default();
        let content = self.decode_page_contents(dict)?;

        Ok(Page {
            index,
            media_box: media_rect,
            bounds,
            rotation,
            resources,
            content,
        })
    }

    /// Decode `/Contents` (a single stream or an array of streams) and
    /// concatenate the results with a single space, per §4.4's "Nested
    /// streams" rule — this preserves operator order across the join.
    fn decode_page_contents(&self, dict: &HashMap<String, PDFObject>) -> Result<Vec<u8>> {
        let Some(contents) = dict.get("Contents") else {
            return Ok(Vec::new());
        };
        let resolved = self
            .resolve_obj(contents)
            .ok_or_else(|| PdfError::XrefError("unresolved /Contents".into()))?;
        let streams: Vec<PDFObject> = match resolved {
            PDFObject::Array(arr) => arr,
            other => vec![other],
        };

        let mut out = Vec::new();
        for (i, entry) in streams.iter().enumerate() {
            let Some(resolved) = self.resolve_obj(entry) else {
                continue;
            };
            let Ok(stream) = resolved.as_stream() else {
                continue;
            };
            if i > 0 {
                out.push(b' ');
            }
            out.extend(codec::decode_stream_filters(&stream.raw_data, &stream.dict)?);
        }
        Ok(out)
    }

    /// Build the page-scoped font table (§4.5's inputs) from
    /// `/Resources/Font`. A font that cannot be built is skipped and
    /// logged, mirroring L6's per-XObject swallow policy — one bad font
    /// resource should not block every other font on the page.
    fn build_fonts(&self, resources: &HashMap<String, PDFObject>) -> Fonts {
        let mut fonts = Fonts::new();
        let Some(font_dict) = resources.get("Font").and_then(|o| self.resolve_obj(o)) else {
            return fonts;
        };
        let Ok(font_dict) = font_dict.as_dict() else {
            return fonts;
        };
        for (name, font_ref) in font_dict {
            let Some(font_obj) = self.resolve_obj(font_ref) else {
                continue;
            };
            let Ok(fdict) = font_obj.as_dict() else {
                continue;
            };
            fonts.insert(name.clone(), self.build_font_entry(fdict));
        }
        fonts
    }

    fn build_font_entry(&self, fdict: &HashMap<String, PDFObject>) -> FontEntry {
        let subtype = fdict.get("Subtype").and_then(|o| o.as_name().ok()).unwrap_or("");
        let (base_encoding, custom_encoding) = self.font_encoding(fdict);
        let cmap = self.font_tounicode(fdict);
        let config = FontDecoderConfig {
            cmap,
            base_encoding,
            use_two_byte_glyphs: subtype == "Type0",
            custom_encoding,
        };
        FontEntry {
            decoder: FontDecoder::new(config),
            metrics: self.font_metrics(fdict),
        }
    }

    /// `/Encoding`: either a bare base-encoding name, or a dictionary
    /// carrying `/BaseEncoding` plus a `/Differences` array that builds a
    /// custom glyph-id -> Unicode table via the Adobe Glyph List.
    fn font_encoding(&self, fdict: &HashMap<String, PDFObject>) -> (String, Option<HashMap<u32, char>>) {
        let Some(enc) = fdict.get("Encoding").and_then(|o| self.resolve_obj(o)) else {
            return (String::new(), None);
        };
        match enc {
            PDFObject::Name(n) => (n, None),
            PDFObject::Dictionary(d) => {
                let base = d.get("BaseEncoding").and_then(|o| o.as_name().ok()).unwrap_or("").to_string();
                let custom = d
                    .get("Differences")
                    .and_then(|o| o.as_array().ok())
                    .map(font::differences_to_custom_encoding);
                (base, custom)
            }
            _ => (String::new(), None),
        }
    }

    fn font_tounicode(&self, fdict: &HashMap<String, PDFObject>) -> Option<HashMap<u32, char>> {
        let obj = self.resolve_obj(fdict.get("ToUnicode")?)?;
        let stream = obj.as_stream().ok()?;
        let decoded = codec::decode_stream_filters(&stream.raw_data, &stream.dict).ok()?;
        font::parse_tounicode(&decoded).ok()
    }

    /// `/FirstChar`/`/Widths`/`/MissingWidth` for a simple font. Composite
    /// (`Type0`) fonts carry no metrics here; the interpretation engine
    /// falls back to its `len(text) * font_size * 0.5` approximation for
    /// those, per §4.4's text emission contract.
    fn font_metrics(&self, fdict: &HashMap<String, PDFObject>) -> Option<FontMetrics> {
        let first_char = fdict.get("FirstChar").and_then(|o| o.as_int().ok())? as u32;
        let widths = self.resolve_obj(fdict.get("Widths")?)?.as_array().ok()?.to_vec();
        let widths = widths.iter().filter_map(|o| o.as_num().ok()).collect();
        let default_width = fdict.get("MissingWidth").and_then(|o| o.as_num().ok()).unwrap_or(0.0);
        Some(FontMetrics {
            first_char,
            widths,
            default_width,
        })
    }

    fn interpret_page(&self, page_index: usize) -> Result<(Vec<TextElement>, Vec<GraphicsElement>)> {
        let page = self.page(page_index)?;
        let fonts = self.build_fonts(&page.resources);
        let ops = content::parse(&page.content)?;
        Ok(interp::interpret(&ops, &fonts))
    }

    /// `extract_text(page_index) → [TextElement]`, ordered by operator
    /// sequence.
    pub fn extract_text(&self, page_index: usize) -> Result<Vec<TextElement>> {
        Ok(self.interpret_page(page_index)?.0)
    }

    /// `extract_graphics(page_index) → [GraphicsElement]`, ordered by
    /// paint operator.
    pub fn extract_graphics(&self, page_index: usize) -> Result<Vec<GraphicsElement>> {
        Ok(self.interpret_page(page_index)?.1)
    }

    /// `extract_images(page_index) → [Image]`, in XObject enumeration
    /// order.
    pub fn extract_images(&self, page_index: usize) -> Result<Vec<Image>> {
        let page = self.page(page_index)?;
        Ok(image::extract_images(&page.resources, &|r| self.resolve(r)))
    }

    /// `detect_tables(page_index) → [TableRegion]`, per §4.10.
    pub fn detect_tables(&self, page_index: usize) -> Result<Vec<TableRegion>> {
        let (text, graphics) = self.interpret_page(page_index)?;
        Ok(layout::detect_tables(&text, &graphics))
    }

    /// `extract_tables(page_index) → [Table]`, per §4.12.
    pub fn extract_tables(&self, page_index: usize) -> Result<Vec<Table>> {
        let (text, graphics) = self.interpret_page(page_index)?;
        let regions = layout::detect_tables(&text, &graphics);
        regions.iter().map(|r| layout::extract_table(r, &text)).collect()
    }

    /// Extract tables from every page in parallel. §5 requires that pages
    /// extracted on different threads each do so through an independent
    /// `Reader` (independent xref cache, independent lexer position), so
    /// each rayon task builds its own `Reader` from a fresh clone of the
    /// original bytes rather than sharing `self` across the pool.
    pub fn extract_tables_all_pages(&self) -> Vec<Result<Vec<Table>>> {
        let data = &self.data;
        (0..self.page_count())
            .into_par_iter()
            .map(|i| Reader::from_bytes(data.clone())?.extract_tables(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal one-page PDF by hand: a Catalog, a Pages node
    /// carrying shared `/Resources`/`/MediaBox`, one child Page with its
    /// own content stream, a simple WinAnsi font, and a classical xref
    /// table/trailer — enough to drive the whole L2-L12 pipeline.
    fn sample_pdf() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.7\n");

        let mut offsets = vec![0u64; 6];

        offsets[1] = data.len() as u64;
        data.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets[2] = data.len() as u64;
        data.extend_from_slice(
            b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] \
              /Resources << /Font << /F1 4 0 R >> >> >>\nendobj\n",
        );

        offsets[3] = data.len() as u64;
        data.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /Contents 5 0 R >>\nendobj\n");

        offsets[4] = data.len() as u64;
        data.extend_from_slice(
            b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
              /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        let stream_body = b"BT /F1 12 Tf 10 50 Td (Hi) Tj ET\n0 0 50 20 re S";
        offsets[5] = data.len() as u64;
        data.extend_from_slice(format!("5 0 obj\n<< /Length {} >>\nstream\n", stream_body.len()).as_bytes());
        data.extend_from_slice(stream_body);
        data.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_off = data.len();
        data.extend_from_slice(b"xref\n0 6\n");
        data.extend_from_slice(b"0000000000 65535 f \n");
        for off in &offsets[1..] {
            data.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
        data.extend_from_slice(b"trailer\n<< /Size 6 /Root 1 0 R >>\n");
        data.extend_from_slice(format!("startxref\n{xref_off}\n%%EOF").as_bytes());
        data
    }

    #[test]
    fn discovers_one_page_with_inherited_mediabox_and_resources() {
        let reader = Reader::from_bytes(sample_pdf()).unwrap();
        assert_eq!(reader.page_count(), 1);
        let page = reader.page(0).unwrap();
        assert_eq!(page.bounds, Rectangle::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(page.rotation, 0);
        assert!(page.resources.contains_key("Font"));
    }

    #[test]
    fn extract_text_decodes_the_simple_font() {
        let reader = Reader::from_bytes(sample_pdf()).unwrap();
        let text = reader.extract_text(0).unwrap();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].text, "Hi");
    }

    #[test]
    fn extract_graphics_emits_the_rectangle() {
        let reader = Reader::from_bytes(sample_pdf()).unwrap();
        let graphics = reader.extract_graphics(0).unwrap();
        assert_eq!(graphics.len(), 1);
        assert_eq!(graphics[0].kind, crate::model::state::GraphicsKind::Rectangle);
    }

    #[test]
    fn out_of_range_page_index_is_an_error() {
        let reader = Reader::from_bytes(sample_pdf()).unwrap();
        assert!(reader.page(5).is_err());
    }

    #[test]
    fn detect_and_extract_tables_run_without_a_table_present() {
        let reader = Reader::from_bytes(sample_pdf()).unwrap();
        assert!(reader.detect_tables(0).unwrap().is_empty());
        assert!(reader.extract_tables(0).unwrap().is_empty());
    }
}
