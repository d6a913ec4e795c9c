//! Parsing the bytes of a PDF file into update layers and flattening them into a [`Context`].

use crate::context::{Context, Header};
use crate::error::ParseError;
use crate::object::dict::keys::{ENCRYPT, ID, INFO, OBJ_STM, ROOT, TYPE, XREF};
use crate::object::{Dict, DictKind, IndirectObject, NamePool, ObjRef, Object};
use crate::object_stream;
use crate::reader::{Reader, ReaderContext};
use crate::trivia::{is_eol_character, is_white_space_character};
use crate::xref::{XRefEntries, decode_xref_stream, read_xref_table};
use log::{debug, error, warn};
use memchr::memmem;
use rustc_hash::{FxHashMap, FxHashSet};

/// How far into the file the header is searched for.
const HEADER_SEARCH_LIMIT: usize = 1024;

/// How much effort the parser puts into repairing malformed files.
///
/// Each speed corresponds to a budget of costly repair heuristics (stream length repair,
/// resynchronizing after garbage, recovering a missing catalog). Once the budget is spent,
/// the parser gives up on elements that would need repairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ParseSpeed {
    /// Attempt every repair.
    Slowest,
    /// Attempt up to 10000 repairs.
    #[default]
    Slow,
    /// Attempt up to 500 repairs.
    Medium,
    /// Attempt up to 100 repairs.
    Fast,
    /// Never attempt repairs.
    Fastest,
}

impl ParseSpeed {
    /// The number of repair heuristics the parser may attempt.
    pub fn heuristic_budget(&self) -> usize {
        match self {
            Self::Slowest => usize::MAX,
            Self::Slow => 10_000,
            Self::Medium => 500,
            Self::Fast => 100,
            Self::Fastest => 0,
        }
    }
}

/// Options for parsing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// How much effort to put into repairing malformed files.
    pub parse_speed: ParseSpeed,
    /// Whether to abort parsing when an object can't be parsed, instead of skipping it.
    pub throw_on_invalid_object: bool,
    /// Whether to clamp number literals that are out of range instead of rejecting them.
    pub cap_numbers: bool,
    /// Whether to accept encrypted documents. The objects are not decrypted.
    pub ignore_encryption: bool,
}

/// One version of a document, as written by a single (incremental) save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateLayer {
    /// The objects of the layer, in the order in which they appear in the file.
    ///
    /// Objects from object streams are included with generation number 0, right after the
    /// object stream containing them.
    pub objects: Vec<(ObjRef, Object)>,
    /// The entries of the cross-reference table or stream(s) of the layer.
    pub xref: XRefEntries,
    /// The trailer dictionary. For layers using cross-reference streams, this is the
    /// dictionary of the stream.
    pub trailer: Dict,
    /// Object streams, cross-reference streams and the linearization dictionary of the layer.
    pub containers: Vec<ObjRef>,
}

/// A parser that splits a file into its update layers.
pub struct Parser<'a> {
    data: &'a [u8],
    options: ParseOptions,
    names: NamePool,
    heuristics: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser.
    pub fn new(data: &'a [u8], options: ParseOptions) -> Self {
        Self {
            data,
            heuristics: options.parse_speed.heuristic_budget(),
            options,
            names: NamePool::default(),
        }
    }

    /// Parse the header and all update layers of the file, oldest first.
    pub fn parse_layers(&mut self) -> Result<(Header, Vec<UpdateLayer>), ParseError> {
        let (header, body_start) = read_header(self.data).ok_or_else(|| {
            error!("no PDF header found");

            ParseError::MissingHeader
        })?;

        let mut r = Reader::new_with(self.data, body_start);
        let mut ctx = ReaderContext::new(&mut self.names, self.options.cap_numbers);
        ctx.heuristics = self.heuristics;

        let mut layers = vec![];

        loop {
            let mut layer = UpdateLayer::default();
            let start = r.offset();

            read_body(&mut r, &mut ctx, &self.options, &mut layer)?;
            let has_footer = read_footer(&mut r, &mut ctx, &self.options, &mut layer)?;

            if layer.objects.is_empty() && !has_footer {
                break;
            }

            debug!(
                "read update layer with {} objects at {start}..{}",
                layer.objects.len(),
                r.offset()
            );
            layers.push(layer);

            if r.offset() == start {
                break;
            }
        }

        self.heuristics = ctx.heuristics;

        Ok((header, layers))
    }

    /// Flatten the layers into a context, sharing the name pool and the remaining repair
    /// budget of this parser.
    pub fn finish(self, header: Header, layers: Vec<UpdateLayer>) -> Result<Context, ParseError> {
        flatten(
            header,
            layers,
            &self.options,
            self.names,
            self.heuristics,
        )
    }
}

/// Parse a document into a context.
pub fn parse_document(data: &[u8], options: &ParseOptions) -> Result<Context, ParseError> {
    let mut parser = Parser::new(data, options.clone());
    let (header, layers) = parser.parse_layers()?;

    parser.finish(header, layers)
}

/// Flatten update layers into a single context.
///
/// Layers are replayed oldest first. Later definitions of an object number replace earlier
/// ones, whatever their generation. Container objects are dropped, and trailer entries of
/// later layers win.
pub fn normalize(
    header: Header,
    layers: Vec<UpdateLayer>,
    options: &ParseOptions,
) -> Result<Context, ParseError> {
    flatten(
        header,
        layers,
        options,
        NamePool::default(),
        options.parse_speed.heuristic_budget(),
    )
}

fn flatten(
    header: Header,
    layers: Vec<UpdateLayer>,
    options: &ParseOptions,
    names: NamePool,
    mut heuristics: usize,
) -> Result<Context, ParseError> {
    let mut ctx = Context::with_header(header);
    *ctx.names_mut() = names;

    let mut current_gen = FxHashMap::<u32, ObjRef>::default();

    for layer in layers {
        // A container only hides the object it defines in its own layer. Later layers may
        // reuse its number for an ordinary object.
        let containers = layer.containers.iter().copied().collect::<FxHashSet<_>>();

        for (r, object) in layer.objects {
            if containers.contains(&r) {
                continue;
            }

            if let Some(old) = current_gen.insert(r.obj_number, r)
                && old != r
            {
                debug!("object {r} replaces {old}");
                ctx.delete(old);
            }

            ctx.assign(r, object);
        }

        let trailer = layer.trailer;

        if let Some(root) = trailer.get_ref(ROOT) {
            ctx.set_root(Some(root));
        }

        if let Some(info) = trailer.get_ref(INFO) {
            ctx.set_info(Some(info));
        }

        if let Some(encrypt) = trailer.get(ENCRYPT) {
            ctx.set_encrypt(Some(encrypt.clone()));
        }

        if let Some(id) = trailer.get(ID) {
            ctx.set_id(Some(id.clone()));
        }
    }

    if ctx.catalog().ok().flatten().is_none() {
        recover_catalog(&mut ctx, &mut heuristics);
    }

    if ctx.encrypt().is_some() {
        if options.ignore_encryption {
            warn!("document is encrypted, its strings and streams will stay encrypted");
        } else {
            error!("document is encrypted");

            return Err(ParseError::Encrypted);
        }
    }

    Ok(ctx)
}

fn recover_catalog(ctx: &mut Context, heuristics: &mut usize) {
    if *heuristics == 0 {
        warn!("document has no catalog");

        return;
    }

    *heuristics -= 1;

    let recovered = ctx
        .enumerate_indirect_objects()
        .filter(|(_, o)| o.as_dict().is_some_and(|d| d.kind() == DictKind::Catalog))
        .map(|(r, _)| r)
        .last();

    match recovered {
        Some(root) => {
            warn!("document has no valid catalog reference, using {root} instead");
            ctx.set_root(Some(root));
        }
        None => warn!("document has no catalog"),
    }
}

/// Find the header, returning it together with the offset right after it.
fn read_header(data: &[u8]) -> Option<(Header, usize)> {
    let search_area = data.get(..data.len().min(HEADER_SEARCH_LIMIT))?;
    let start = memmem::find(search_area, b"%PDF-")?;

    let mut r = Reader::new_with(data, start + 5);
    let major = read_digit(&mut r)?;
    r.forward_tag(b".")?;
    let minor = read_digit(&mut r)?;

    // Skip the rest of the header line.
    r.forward_while(|b| b != b'\n' && b != b'\r');

    Some((Header::new(major, minor), r.offset()))
}

fn read_digit(r: &mut Reader<'_>) -> Option<u8> {
    r.eat(|b| b.is_ascii_digit()).map(|b| b - b'0')
}

/// Whether the reader is at a keyword that ends the body of a layer.
fn at_footer(r: &Reader<'_>) -> bool {
    r.peek_tag(b"xref").is_some()
        || r.peek_tag(b"trailer").is_some()
        || r.peek_tag(b"startxref").is_some()
}

/// Whether the reader is at something that looks like the start of an indirect object.
fn at_object_header(r: &Reader<'_>) -> bool {
    let mut r = r.clone();
    r.read_without_context::<u32>().is_some() && {
        r.skip_white_spaces_and_comments();
        r.read_without_context::<u16>().is_some()
    } && {
        r.skip_white_spaces_and_comments();
        r.peek_tag(b"obj").is_some()
    }
}

fn read_body(
    r: &mut Reader<'_>,
    ctx: &mut ReaderContext<'_>,
    options: &ParseOptions,
    layer: &mut UpdateLayer,
) -> Result<(), ParseError> {
    loop {
        r.skip_white_spaces_and_comments();

        if r.at_end() || at_footer(r) {
            return Ok(());
        }

        let start = r.offset();

        if let Some(object) = r.read::<IndirectObject>(ctx) {
            add_object(object, ctx, layer);
            continue;
        }

        if at_object_header(r) {
            if options.throw_on_invalid_object {
                error!("invalid object at offset {start}");

                return Err(ParseError::InvalidObject { offset: start });
            }

            warn!("skipping invalid object at offset {start}");

            match r.find(b"endobj") {
                Some(end) => r.jump(end + b"endobj".len()),
                None => r.jump_to_end(),
            }

            continue;
        }

        if !ctx.try_heuristic("resync after garbage") {
            warn!("garbage at offset {start}, stopping");
            r.jump_to_end();

            return Ok(());
        }

        warn!("skipping garbage at offset {start}");
        // Skip to the next token.
        r.forward();
        r.forward_while(|b| !is_white_space_character(b));
    }
}

fn add_object(object: IndirectObject, ctx: &mut ReaderContext<'_>, layer: &mut UpdateLayer) {
    let IndirectObject { id, object } = object;

    if let Object::Dict(dict) = &object
        && dict.kind() == DictKind::Linearization
    {
        debug!("found linearization dictionary {id}");
        layer.containers.push(id);
    }

    if let Object::Stream(stream) = &object {
        match stream.dict().get_name(TYPE).map(|n| n.as_bytes()) {
            Some(OBJ_STM) => {
                layer.containers.push(id);
                layer.objects.push((id, object.clone()));

                if let Some(members) = object_stream::expand(stream, id, ctx) {
                    layer.objects.extend(members);
                } else {
                    warn!("failed to expand object stream {id}");
                }

                return;
            }
            Some(XREF) => {
                layer.containers.push(id);

                match decode_xref_stream(stream) {
                    Some(entries) => layer.xref.extend(entries),
                    None => warn!("failed to decode xref stream {id}"),
                }

                for (key, value) in stream.dict() {
                    layer.trailer.insert(key.clone(), value.clone());
                }
            }
            _ => {}
        }
    }

    layer.objects.push((id, object));
}

/// Read the cross-reference table and trailer of a layer, returning whether any of it was
/// present.
fn read_footer(
    r: &mut Reader<'_>,
    ctx: &mut ReaderContext<'_>,
    options: &ParseOptions,
    layer: &mut UpdateLayer,
) -> Result<bool, ParseError> {
    let mut found = false;

    if r.peek_tag(b"xref").is_some() {
        found = true;
        let start = r.offset();

        match read_xref_table(r, ctx) {
            Some(entries) => layer.xref.extend(entries),
            None => {
                if options.throw_on_invalid_object {
                    error!("invalid xref table at offset {start}");

                    return Err(ParseError::InvalidXRef { offset: start });
                }

                warn!("invalid xref table at offset {start}");

                // Continue with the trailer, if there is one.
                r.jump(start + b"xref".len());
                let trailer = r.find(b"trailer");
                let next_object = next_object_header(r);

                match (trailer, next_object) {
                    (Some(t), Some(o)) if o < t => r.jump(o),
                    (Some(t), _) => r.jump(t),
                    (None, Some(o)) => r.jump(o),
                    (None, None) => r.jump_to_end(),
                }
            }
        }

        r.skip_white_spaces_and_comments();
    }

    if r.forward_tag(b"trailer").is_some() {
        found = true;
        r.skip_white_spaces_and_comments();

        match r.read::<Dict>(ctx) {
            Some(dict) => {
                for (key, value) in &dict {
                    layer.trailer.insert(key.clone(), value.clone());
                }
            }
            None => warn!("trailer without a dictionary, treating it as empty"),
        }

        r.skip_white_spaces_and_comments();
    }

    if r.forward_tag(b"startxref").is_some() {
        found = true;
        r.skip_white_spaces_and_comments();

        if r.read::<usize>(ctx).is_none() {
            warn!("startxref without an offset");
        }
    }

    // Also skips the `%%EOF` marker, which is a comment.
    r.skip_white_spaces_and_comments();

    Ok(found)
}

/// Find the offset of the next indirect object header, if any.
///
/// Only headers at the start of a line are considered.
fn next_object_header(r: &Reader<'_>) -> Option<usize> {
    let data = r.range(0..r.len())?;
    let mut probe = r.clone();

    while let Some(pos) = probe.find(b"obj") {
        let line_start = data
            .get(r.offset()..pos)?
            .iter()
            .rposition(|b| is_eol_character(*b))
            .map_or(r.offset(), |i| r.offset() + i + 1);

        let mut candidate = Reader::new_with(data, line_start);
        candidate.skip_white_spaces();

        if at_object_header(&candidate) {
            return Some(candidate.offset());
        }

        probe.jump(pos + b"obj".len());
    }

    None
}

#[cfg(test)]
mod tests {
    use crate::context::Header;
    use crate::error::ParseError;
    use crate::object::{ObjRef, Object};
    use crate::parser::{ParseOptions, ParseSpeed, Parser, normalize, parse_document, read_header};

    const SIMPLE: &[u8] = b"%PDF-1.4
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

    #[test]
    fn header() {
        assert_eq!(read_header(b"%PDF-1.7\n").unwrap().0, Header::new(1, 7));
        assert_eq!(
            read_header(b"garbage\n%PDF-2.0\r\n").unwrap(),
            (Header::new(2, 0), 16)
        );
        assert!(read_header(b"%PDX-1.7").is_none());
    }

    #[test]
    fn missing_header() {
        assert_eq!(
            parse_document(b"1 0 obj 1 endobj", &ParseOptions::default()).unwrap_err(),
            ParseError::MissingHeader
        );
    }

    #[test]
    fn simple_document() {
        let ctx = parse_document(SIMPLE, &ParseOptions::default()).unwrap();
        assert_eq!(ctx.header(), Header::new(1, 4));
        assert_eq!(ctx.root(), Some(ObjRef::new(1, 0)));
        assert!(ctx.catalog().unwrap().is_some());
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn layers() {
        let mut parser = Parser::new(SIMPLE, ParseOptions::default());
        let (_, layers) = parser.parse_layers().unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].xref.len(), 3);
        assert_eq!(layers[0].objects.len(), 2);
    }

    #[test]
    fn incremental_update_shadows() {
        let mut data = SIMPLE.to_vec();
        data.extend_from_slice(
            b"3 0 obj\n(first)\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n\
              3 0 obj\n(second)\nendobj\ntrailer\n<< >>\n%%EOF\n",
        );

        let mut parser = Parser::new(&data, ParseOptions::default());
        let (header, layers) = parser.parse_layers().unwrap();
        assert_eq!(layers.len(), 3);

        let ctx = normalize(header, layers, &ParseOptions::default()).unwrap();
        assert_eq!(
            ctx.lookup_ref(ObjRef::new(3, 0)).unwrap().as_string().unwrap().as_bytes(),
            b"second"
        );
        // Trailer fields not repeated in later layers are kept.
        assert_eq!(ctx.root(), Some(ObjRef::new(1, 0)));
    }

    #[test]
    fn newer_generation_replaces_older() {
        let data = b"%PDF-1.4\n4 0 obj 1 endobj\ntrailer << >>\n%%EOF\n4 1 obj 2 endobj\n";
        let ctx = parse_document(data, &ParseOptions::default()).unwrap();
        assert!(ctx.lookup_ref(ObjRef::new(4, 0)).is_none());
        assert_eq!(ctx.lookup_ref(ObjRef::new(4, 1)), Some(&Object::from(2)));
    }

    #[test]
    fn container_number_reused_by_later_update() {
        let data = b"%PDF-1.5
5 0 obj
<< /Type /ObjStm /N 1 /First 4 /Length 6 >>
stream
3 0 42
endstream
endobj
trailer
<< >>
%%EOF
5 0 obj
(updated)
endobj
trailer
<< >>
%%EOF
";
        let ctx = parse_document(data, &ParseOptions::default()).unwrap();
        assert_eq!(ctx.lookup_ref(ObjRef::new(3, 0)), Some(&Object::from(42)));
        assert_eq!(
            ctx.lookup_ref(ObjRef::new(5, 0)).unwrap().as_string().unwrap().as_bytes(),
            b"updated"
        );
    }

    #[test]
    fn invalid_object_lenient_and_strict() {
        let data = b"%PDF-1.4\n1 0 obj << /A ) >> endobj\n2 0 obj 5 endobj\n";

        let ctx = parse_document(data, &ParseOptions::default()).unwrap();
        assert!(ctx.lookup_ref(ObjRef::new(1, 0)).is_none());
        assert_eq!(ctx.lookup_ref(ObjRef::new(2, 0)), Some(&Object::from(5)));

        let strict = ParseOptions {
            throw_on_invalid_object: true,
            ..ParseOptions::default()
        };
        assert_eq!(
            parse_document(data, &strict).unwrap_err(),
            ParseError::InvalidObject { offset: 9 }
        );
    }

    #[test]
    fn garbage_is_skipped() {
        let data = b"%PDF-1.4\nsome garbage here\n1 0 obj 5 endobj\n";
        let ctx = parse_document(data, &ParseOptions::default()).unwrap();
        assert_eq!(ctx.lookup_ref(ObjRef::new(1, 0)), Some(&Object::from(5)));

        let fastest = ParseOptions {
            parse_speed: ParseSpeed::Fastest,
            ..ParseOptions::default()
        };
        assert!(parse_document(data, &fastest).unwrap().is_empty());
    }

    #[test]
    fn encrypted() {
        let data = b"%PDF-1.4\n1 0 obj << /Filter /Standard >> endobj\ntrailer << /Encrypt 1 0 R >>\n";
        assert_eq!(
            parse_document(data, &ParseOptions::default()).unwrap_err(),
            ParseError::Encrypted
        );

        let options = ParseOptions {
            ignore_encryption: true,
            ..ParseOptions::default()
        };
        assert!(parse_document(data, &options).unwrap().encrypt().is_some());
    }

    #[test]
    fn catalog_recovery() {
        let data = b"%PDF-1.4\n7 0 obj << /Type /Catalog >> endobj\ntrailer << >>\n";
        let ctx = parse_document(data, &ParseOptions::default()).unwrap();
        assert_eq!(ctx.root(), Some(ObjRef::new(7, 0)));

        let fastest = ParseOptions {
            parse_speed: ParseSpeed::Fastest,
            ..ParseOptions::default()
        };
        assert_eq!(parse_document(data, &fastest).unwrap().root(), None);
    }

    #[test]
    fn trailer_without_dict() {
        let data = b"%PDF-1.4\n1 0 obj 1 endobj\ntrailer\nstartxref\n0\n%%EOF\n";
        let mut parser = Parser::new(data, ParseOptions::default());
        let (_, layers) = parser.parse_layers().unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].trailer.is_empty());
    }

    #[test]
    fn broken_xref_table_lenient() {
        let data = b"%PDF-1.4\n1 0 obj 1 endobj\nxref\n0 5\n0000000000 65535 f \ntrailer << /Size 2 >>\n";
        let mut parser = Parser::new(data, ParseOptions::default());
        let (_, layers) = parser.parse_layers().unwrap();
        assert_eq!(layers[0].trailer.get_as::<i64>(b"Size"), Some(2));

        let mut strict = Parser::new(
            data,
            ParseOptions {
                throw_on_invalid_object: true,
                ..ParseOptions::default()
            },
        );
        assert_eq!(
            strict.parse_layers().unwrap_err(),
            ParseError::InvalidXRef { offset: 26 }
        );
    }
}
