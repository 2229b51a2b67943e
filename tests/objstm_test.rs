//! End-to-end resolution of objects stored inside an object stream
//! (`/Type /ObjStm`), addressed through a cross-reference *stream* rather
//! than a classical `xref` table — the path `document.rs::resolve_compressed`
//! exists for. Exercises the whole chain: xref-stream binary entries ->
//! `XrefEntry::Compressed` -> object-stream header parsing -> page
//! discovery -> text extraction.

use pdf_tables::Reader;

/// Pack one xref-stream record: 1-byte type, 2-byte field 2, 1-byte field 3.
fn record(f1: u8, f2: u64, f3: u8) -> [u8; 4] {
    [f1, (f2 >> 8) as u8, f2 as u8, f3]
}

/// Build a PDF whose Catalog (object 1) and Page (object 3) live inside a
/// single uncompressed object stream (object 6), addressed via a
/// cross-reference stream (object 7) instead of a classical `xref` table.
fn build_objstm_pdf() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"%PDF-1.7\n");

    let body1 = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
    let body3 = b"<< /Type /Page /Parent 2 0 R /Contents 5 0 R >>".to_vec();
    let header = format!("1 0 3 {}", body1.len() + 1);
    let first = header.len() + 1;
    let mut decoded = Vec::new();
    decoded.extend_from_slice(header.as_bytes());
    decoded.push(b'\n');
    decoded.extend_from_slice(&body1);
    decoded.push(b' ');
    decoded.extend_from_slice(&body3);

    let off2 = data.len() as u64;
    data.extend_from_slice(
        b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 100] \
          /Resources << /Font << /F1 4 0 R >> >> >>\nendobj\n",
    );

    let off4 = data.len() as u64;
    data.extend_from_slice(
        b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
          /Encoding /WinAnsiEncoding >>\nendobj\n",
    );

    let content = b"BT /F1 12 Tf 10 50 Td (Hi) Tj ET";
    let off5 = data.len() as u64;
    data.extend_from_slice(format!("5 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes());
    data.extend_from_slice(content);
    data.extend_from_slice(b"\nendstream\nendobj\n");

    let off6 = data.len() as u64;
    data.extend_from_slice(
        format!("6 0 obj\n<< /Type /ObjStm /N 2 /First {first} /Length {} >>\nstream\n", decoded.len()).as_bytes(),
    );
    data.extend_from_slice(&decoded);
    data.extend_from_slice(b"\nendstream\nendobj\n");

    let off7 = data.len() as u64;
    let mut entries = Vec::new();
    entries.extend_from_slice(&record(0, 0, 0)); // obj 0: free
    entries.extend_from_slice(&record(2, 6, 0)); // obj 1: compressed in obj 6, index 0
    entries.extend_from_slice(&record(1, off2, 0)); // obj 2
    entries.extend_from_slice(&record(2, 6, 1)); // obj 3: compressed in obj 6, index 1
    entries.extend_from_slice(&record(1, off4, 0)); // obj 4
    entries.extend_from_slice(&record(1, off5, 0)); // obj 5
    entries.extend_from_slice(&record(1, off6, 0)); // obj 6
    entries.extend_from_slice(&record(1, off7, 0)); // obj 7 (the xref stream itself)

    data.extend_from_slice(
        format!(
            "7 0 obj\n<< /Type /XRef /Size 8 /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
            entries.len()
        )
        .as_bytes(),
    );
    data.extend_from_slice(&entries);
    data.extend_from_slice(b"\nendstream\nendobj\n");

    data.extend_from_slice(format!("startxref\n{off7}\n%%EOF").as_bytes());
    data
}

#[test]
fn resolves_catalog_and_page_from_an_object_stream() {
    let reader = Reader::from_bytes(build_objstm_pdf()).unwrap();
    assert_eq!(reader.page_count(), 1);

    let page = reader.page(0).unwrap();
    assert!(page.resources.contains_key("Font"));

    let text = reader.extract_text(0).unwrap();
    assert_eq!(text.len(), 1);
    assert_eq!(text[0].text, "Hi");
}
