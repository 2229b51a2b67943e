//! Image XObject extraction (L6).

use std::collections::HashMap;

use crate::codec;
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObjRef, PDFObject, PDFStream};

/// A decoded (or, for `DCTDecode`, still-encoded) image XObject plus the
/// metadata needed to interpret its bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Raw still-compressed bytes for `DCTDecode`; decompressed bytes
    /// otherwise.
    pub data: Vec<u8>,
    pub width: i64,
    pub height: i64,
    pub color_space: String,
    pub bits_per_component: i64,
    pub filter: String,
    /// The resource name this XObject was found under.
    pub name: String,
}

/// Walk `/Resources/XObject`, decode every XObject whose `/Subtype` is
/// `Image`, and return them in XObject enumeration order.
///
/// `resolve` dereferences a single indirect reference — the object/stream
/// layer's job (L2); this component does not own an xref index. Individual
/// XObject failures (unsupported filter, malformed stream) are swallowed
/// and logged so one broken image does not abort the rest of the page.
pub fn extract_images(
    resources: &HashMap<String, PDFObject>,
    resolve: &dyn Fn(PDFObjRef) -> Option<PDFObject>,
) -> Vec<Image> {
    let mut out = Vec::new();
    let Some(xobjects) = resources.get("XObject").and_then(|o| resolve_dict(o, resolve)) else {
        return out;
    };

    for (name, value) in &xobjects {
        let Some(resolved) = resolve_object(value, resolve) else {
            continue;
        };
        let Ok(stream) = resolved.as_stream() else {
            continue;
        };
        if stream.get("Subtype").and_then(PDFObject::as_first_name) != Some("Image") {
            continue;
        }
        match build_image(name, stream) {
            Ok(image) => out.push(image),
            Err(e) => eprintln!("pdf-tables: skipping image XObject {name:?}: {e}"),
        }
    }
    out
}

fn resolve_object(obj: &PDFObject, resolve: &dyn Fn(PDFObjRef) -> Option<PDFObject>) -> Option<PDFObject> {
    match obj {
        PDFObject::IndirectReference(r) => resolve(*r),
        other => Some(other.clone()),
    }
}

fn resolve_dict(
    obj: &PDFObject,
    resolve: &dyn Fn(PDFObjRef) -> Option<PDFObject>,
) -> Option<HashMap<String, PDFObject>> {
    resolve_object(obj, resolve).and_then(|o| o.as_dict().ok().cloned())
}

fn build_image(name: &str, stream: &PDFStream) -> Result<Image> {
    let width = stream.get("Width").and_then(|w| w.as_int().ok()).unwrap_or(0);
    let height = stream.get("Height").and_then(|h| h.as_int().ok()).unwrap_or(0);
    let bits_per_component = stream
        .get("BitsPerComponent")
        .and_then(|b| b.as_int().ok())
        .unwrap_or(8);
    let color_space = stream
        .get("ColorSpace")
        .and_then(PDFObject::as_first_name)
        .unwrap_or("DeviceRGB")
        .to_string();
    let filter = stream
        .get("Filter")
        .and_then(PDFObject::as_first_name)
        .unwrap_or("")
        .to_string();

    let data = match filter.as_str() {
        "DCTDecode" => stream.raw_data.clone(),
        "FlateDecode" => codec::decode_stream_filters(&stream.raw_data, &stream.dict)?,
        "" => stream.raw_data.clone(),
        other => return Err(PdfError::UnsupportedFilter(other.to_string())),
    };

    Ok(Image {
        data,
        width,
        height,
        color_space,
        bits_per_component,
        filter,
        name: name.to_string(),
    })
}
