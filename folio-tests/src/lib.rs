//! Fixture documents shared by the integration tests.

use pdf_writer::{Name, Pdf, Rect, Ref, Str, TextStr};

/// A document with a catalog and an empty page tree, written by hand.
pub const MINIMAL: &[u8] = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [] /Count 0 >>
endobj
xref
0 3
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
trailer
<< /Size 3 /Root 1 0 R >>
startxref
110
%%EOF
";

/// A document with two update layers that both define object `3 0`.
pub const INCREMENTAL: &[u8] = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [] /Count 0 >>
endobj
3 0 obj
(first)
endobj
xref
0 4
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000110 00000 n
trailer
<< /Size 4 /Root 1 0 R >>
startxref
133
%%EOF
3 0 obj
(second)
endobj
xref
3 1
0000000272 00000 n
trailer
<< /Size 4 /Root 1 0 R /Prev 133 >>
startxref
296
%%EOF
";

/// A document whose stream has a wrong `/Length` and which contains an unparsable object.
pub const BROKEN: &[u8] = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [] /Count 0 >>
endobj
3 0 obj
<< /Length 100 >>
stream
abc
endstream
endobj
4 0 obj
<< /Broken ]
endobj
5 0 obj
42
endobj
trailer
<< /Size 6 /Root 1 0 R >>
%%EOF
";

/// A linearized document with one page. The linearization dictionary and the cross-reference
/// section for the first page come before the rest of the file.
pub const LINEARIZED: &[u8] = b"%PDF-1.6
1 0 obj
<< /Linearized 1 /L 558 /H [87 120] /O 4 /E 427 /N 1 /T 464 >>
endobj
xref
1 4
0000000009 00000 n \n\
0000000250 00000 n \n\
0000000299 00000 n \n\
0000000356 00000 n \n\
trailer
<< /Size 6 /Root 2 0 R /Info 5 0 R /Prev 464 >>
startxref
0
%%EOF
2 0 obj
<< /Type /Catalog /Pages 3 0 R >>
endobj
3 0 obj
<< /Type /Pages /Kids [4 0 R] /Count 1 >>
endobj
4 0 obj
<< /Type /Page /Parent 3 0 R /MediaBox [0 0 200 200] >>
endobj
5 0 obj
<< /Title (Linear) >>
endobj
xref
0 1
0000000000 65535 f \n\
5 1
0000000427 00000 n \n\
trailer
<< /Size 6 >>
startxref
87
%%EOF
";

/// A document with `page_count` pages that share a single font, written with `pdf-writer`.
///
/// Every page has its own content stream, the media box is inherited from the page tree.
pub fn pages_with_shared_font(page_count: usize) -> Vec<u8> {
    let mut next_ref = Ref::new(1);
    let catalog_id = next_ref.bump();
    let tree_id = next_ref.bump();
    let font_id = next_ref.bump();
    let info_id = next_ref.bump();

    let mut pdf = Pdf::new();
    pdf.set_version(1, 7);
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.document_info(info_id)
        .title(TextStr("Shared font"))
        .producer(TextStr("folio-tests"));
    pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

    let mut page_ids = vec![];

    for i in 0..page_count {
        let page_id = next_ref.bump();
        let content_id = next_ref.bump();
        page_ids.push(page_id);

        let mut page = pdf.page(page_id);
        page.parent(tree_id).contents(content_id);
        page.resources().fonts().pair(Name(b"F1"), font_id);
        drop(page);

        let content = format!("BT /F1 24 Tf 72 720 Td (Page {}) Tj ET", i + 1);
        pdf.stream(content_id, content.as_bytes());
    }

    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(i32::try_from(page_count).unwrap())
        .pair(Name(b"MediaBox"), Rect::new(0.0, 0.0, 595.0, 842.0));

    pdf.finish()
}

/// A document whose catalog holds a string with all kinds of special characters.
pub fn special_strings() -> Vec<u8> {
    let mut next_ref = Ref::new(1);
    let catalog_id = next_ref.bump();
    let tree_id = next_ref.bump();

    let mut pdf = Pdf::new();
    let mut catalog = pdf.catalog(catalog_id);
    catalog.pages(tree_id);
    catalog
        .insert(Name(b"Special"))
        .primitive(Str(b"paren ( ) backslash \\ newline \n end"));
    catalog.insert(Name(b"Odd Name")).primitive(Name(b"A B#C"));
    drop(catalog);

    pdf.pages(tree_id).kids(std::iter::empty()).count(0);

    pdf.finish()
}
