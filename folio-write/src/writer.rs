//! Serializing a context into the bytes of a PDF file.

use crate::error::WriteError;
use folio_syntax::object::dict::keys::*;
use folio_syntax::object::{Array, Dict, Object, Stream};
use folio_syntax::write::{WriteDirect, display_len, write_display};
use folio_syntax::xref::field_width;
use folio_syntax::{Context, Header, ObjRef};
use log::{debug, error, warn};
use std::fmt::{self, Display};
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

/// Object streams were introduced with PDF 1.5.
const OBJECT_STREAM_VERSION: Header = Header::new(1, 5);
/// The bytes of the binary marker comment following the header.
const BINARY_MARKER: [u8; 4] = [0xe2, 0xe3, 0xcf, 0xd3];
const OBJ_END: &[u8] = b"\nendobj\n\n";
const FREE_ENTRY_GEN: u16 = 65535;

/// Options that control how a context is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Pack objects into compressed object streams and use a cross-reference stream instead
    /// of a classic cross-reference table.
    pub use_object_streams: bool,
    /// How many objects to emit before yielding to the executor when serializing
    /// asynchronously.
    pub objects_per_tick: usize,
    /// The maximum number of objects stored in a single object stream.
    pub objects_per_stream: usize,
    /// Compress streams that don't have any filter with the Flate filter.
    pub compress_streams: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            use_object_streams: false,
            objects_per_tick: 50,
            objects_per_stream: 50,
            compress_streams: false,
        }
    }
}

/// Serializes a context into a PDF file.
///
/// Objects are written in ascending order of their object number. Serializing the same
/// context twice yields the same bytes.
pub struct Writer<'a> {
    ctx: &'a Context,
    options: WriteOptions,
}

impl<'a> Writer<'a> {
    /// Prepare a context for serialization.
    ///
    /// This brings the `/Length` entries of all modified streams up to date and, if requested,
    /// compresses unfiltered streams. Apart from that, the context is not changed.
    pub fn for_context(ctx: &'a mut Context, options: WriteOptions) -> Self {
        if options.compress_streams {
            compress_streams(ctx);
        }

        ctx.finalize_for_write();

        Self { ctx, options }
    }

    /// Serialize the context.
    pub fn serialize_to_buffer(&self) -> Result<Vec<u8>, WriteError> {
        let layout = self.layout()?;
        let mut buf = Vec::with_capacity(layout.size);

        buf.extend_from_slice(&layout.head);

        for entry in &layout.entries {
            entry.write_to(&mut buf);
        }

        buf.extend_from_slice(&layout.tail);
        debug_assert_eq!(buf.len(), layout.size);

        Ok(buf)
    }

    /// Serialize the context, yielding to the executor every
    /// [`WriteOptions::objects_per_tick`] objects.
    pub async fn serialize_to_buffer_async(&self) -> Result<Vec<u8>, WriteError> {
        let layout = self.layout()?;
        let mut buf = Vec::with_capacity(layout.size);
        let per_tick = self.options.objects_per_tick.max(1);

        buf.extend_from_slice(&layout.head);

        for (i, entry) in layout.entries.iter().enumerate() {
            if i > 0 && i % per_tick == 0 {
                YieldNow::default().await;
            }

            entry.write_to(&mut buf);
        }

        buf.extend_from_slice(&layout.tail);
        debug_assert_eq!(buf.len(), layout.size);

        Ok(buf)
    }

    fn layout(&self) -> Result<Layout<'a>, WriteError> {
        let objects = self.indirect_objects()?;

        if self.options.use_object_streams {
            debug!("writing {} objects with object streams", objects.len());

            Ok(self.object_stream_layout(objects))
        } else {
            debug!("writing {} objects with a cross-reference table", objects.len());

            Ok(self.classic_layout(objects))
        }
    }

    /// The objects to write, sorted by reference.
    fn indirect_objects(&self) -> Result<Vec<(ObjRef, &'a Object)>, WriteError> {
        let root = self.ctx.root().ok_or_else(|| {
            error!("cannot write a document without a root");

            WriteError::MissingRoot
        })?;

        if !self.ctx.contains(root) {
            warn!("the root {root} of the document does not exist");
        }

        let mut objects: Vec<(ObjRef, &'a Object)> = vec![];

        for (r, object) in self.ctx.enumerate_indirect_objects() {
            if r.obj_number == 0 {
                warn!("skipping object {r}, the object number is reserved");

                continue;
            }

            if let Object::Stream(stream) = object
                && !stream.has_length()
            {
                error!("stream {r} has no length");

                return Err(WriteError::MissingLength(r));
            }

            // Only one generation of each object number can be listed in the
            // cross-reference section, the newest one wins.
            if let Some(last) = objects.last_mut()
                && last.0.obj_number == r.obj_number
            {
                warn!("dropping {} in favor of {r}", last.0);
                *last = (r, object);

                continue;
            }

            objects.push((r, object));
        }

        Ok(objects)
    }

    fn head(&self, header: Header) -> Vec<u8> {
        let mut head = Vec::new();
        head.extend_from_slice(b"%PDF-");
        write_display(&mut head, &header);
        head.extend_from_slice(b"\n%");
        head.extend_from_slice(&BINARY_MARKER);
        head.extend_from_slice(b"\n\n");

        head
    }

    fn trailer_dict(&self, size: u32) -> Dict {
        let mut dict = Dict::new();
        dict.insert(SIZE, size);

        if let Some(root) = self.ctx.root() {
            dict.insert(ROOT, root);
        }

        if let Some(info) = self.ctx.info() {
            dict.insert(INFO, info);
        }

        if let Some(id) = self.ctx.id() {
            dict.insert(ID, id.clone());
        }

        if let Some(encrypt) = self.ctx.encrypt() {
            dict.insert(ENCRYPT, encrypt.clone());
        }

        dict
    }

    fn classic_layout(&self, objects: Vec<(ObjRef, &'a Object)>) -> Layout<'a> {
        let head = self.head(self.ctx.header());
        let entries = objects
            .into_iter()
            .map(|(r, o)| Entry::Borrowed(r, o))
            .collect::<Vec<_>>();

        let mut offset = head.len();
        let mut rows = vec![XRefRow {
            obj_number: 0,
            kind: RowKind::Free,
        }];

        for entry in &entries {
            let r = entry.obj_ref();
            rows.push(XRefRow {
                obj_number: r.obj_number,
                kind: RowKind::InUse {
                    offset,
                    gen_number: r.gen_number,
                },
            });
            offset += entry.size();
        }

        let xref_offset = offset;
        let size = self
            .ctx
            .size()
            .max(rows.last().map(|r| r.obj_number + 1).unwrap_or(1));

        let mut tail = Vec::new();
        tail.extend_from_slice(b"xref\n");

        for run in contiguous_runs(&rows) {
            write_display(
                &mut tail,
                &format_args!("{} {}\n", run[0].obj_number, run.len()),
            );

            for row in run {
                write_display(&mut tail, row);
            }
        }

        tail.extend_from_slice(b"trailer\n");
        self.trailer_dict(size).write_to(&mut tail);
        write_display(
            &mut tail,
            &format_args!("\nstartxref\n{xref_offset}\n%%EOF\n"),
        );

        let size = offset + tail.len();

        Layout {
            head,
            entries,
            tail,
            size,
        }
    }

    fn object_stream_layout(&self, objects: Vec<(ObjRef, &'a Object)>) -> Layout<'a> {
        let header = self.ctx.header().max(OBJECT_STREAM_VERSION);
        let head = self.head(header);

        let (packed, loose): (Vec<_>, Vec<_>) = objects.into_iter().partition(|(r, o)| {
            r.gen_number == 0 && !matches!(o, Object::Stream(_)) && !self.is_encrypt_dict(*r)
        });

        let mut next_number = self.ctx.largest_object_number() + 1;
        let mut entries = loose
            .into_iter()
            .map(|(r, o)| Entry::Borrowed(r, o))
            .collect::<Vec<_>>();
        let mut rows = vec![XRefRow {
            obj_number: 0,
            kind: RowKind::Free,
        }];

        for chunk in packed.chunks(self.options.objects_per_stream.max(1)) {
            let container = ObjRef::new(next_number, 0);
            next_number += 1;

            for (index, (r, _)) in chunk.iter().enumerate() {
                rows.push(XRefRow {
                    obj_number: r.obj_number,
                    kind: RowKind::Compressed {
                        stream: container.obj_number,
                        index: u32::try_from(index).unwrap_or(u32::MAX),
                    },
                });
            }

            entries.push(Entry::Owned(container, Object::Stream(object_stream(chunk))));
        }

        let mut offset = head.len();

        for entry in &entries {
            let r = entry.obj_ref();
            rows.push(XRefRow {
                obj_number: r.obj_number,
                kind: RowKind::InUse {
                    offset,
                    gen_number: r.gen_number,
                },
            });
            offset += entry.size();
        }

        let xref_ref = ObjRef::new(next_number, 0);
        let xref_offset = offset;
        rows.push(XRefRow {
            obj_number: xref_ref.obj_number,
            kind: RowKind::InUse {
                offset: xref_offset,
                gen_number: 0,
            },
        });
        rows.sort_by_key(|r| r.obj_number);

        let mut dict = self.trailer_dict(xref_ref.obj_number + 1);
        dict.insert(TYPE, Object::Name(XREF.into()));
        let stream = xref_stream(dict, &rows);
        entries.push(Entry::Owned(xref_ref, Object::Stream(stream)));

        let xref_size = entries.last().map(Entry::size).unwrap_or(0);
        let mut tail = Vec::new();
        write_display(
            &mut tail,
            &format_args!("startxref\n{xref_offset}\n%%EOF\n"),
        );

        let size = xref_offset + xref_size + tail.len();

        Layout {
            head,
            entries,
            tail,
            size,
        }
    }

    fn is_encrypt_dict(&self, r: ObjRef) -> bool {
        self.ctx.encrypt().and_then(Object::as_obj_ref) == Some(r)
    }
}

/// Flate-compress every stream that doesn't have a filter yet.
fn compress_streams(ctx: &mut Context) {
    let mut compressed = 0;

    for (_, object) in ctx.objects_mut() {
        if let Object::Stream(stream) = object
            && !stream.dict().contains_key(FILTER)
            && !stream.is_external()
        {
            *stream = Stream::new_flate(stream.dict().clone(), stream.raw_data());
            compressed += 1;
        }
    }

    debug!("compressed {compressed} streams");
}

/// Pack objects into an object stream.
fn object_stream(members: &[(ObjRef, &Object)]) -> Stream {
    let mut header = Vec::new();
    let mut body = Vec::new();

    for (i, (r, object)) in members.iter().enumerate() {
        if i > 0 {
            header.push(b' ');
            body.push(b'\n');
        }

        write_display(
            &mut header,
            &format_args!("{} {}", r.obj_number, body.len()),
        );
        object.write_to(&mut body);
    }

    header.push(b'\n');
    let first = header.len();
    header.extend_from_slice(&body);

    let mut stream = Stream::new_flate(
        folio_syntax::dict! {
            TYPE => Object::Name(OBJ_STM.into()),
            N => members.len(),
            FIRST => first,
        },
        &header,
    );
    stream.finalize_for_write();

    stream
}

/// Build a cross-reference stream from sorted rows.
fn xref_stream(mut dict: Dict, rows: &[XRefRow]) -> Stream {
    let (max_second, max_third) = rows.iter().fold((0, 0), |(second, third), row| {
        let (_, s, t) = row.fields();
        (second.max(s), third.max(t))
    });
    let widths = [1, field_width(max_second), field_width(max_third)];

    let mut index = Array::new();
    let mut data = Vec::with_capacity(rows.len() * widths.iter().sum::<usize>());

    for run in contiguous_runs(rows) {
        index.push(run[0].obj_number);
        index.push(run.len());

        for row in run {
            let (first, second, third) = row.fields();

            for (value, width) in [first, second, third].into_iter().zip(widths) {
                data.extend_from_slice(&value.to_be_bytes()[8 - width..]);
            }
        }
    }

    dict.insert(W, widths.into_iter().collect::<Array>());
    dict.insert(INDEX, index);

    let mut stream = Stream::new_flate(dict, &data);
    stream.finalize_for_write();

    stream
}

/// Split sorted rows into runs of consecutive object numbers.
fn contiguous_runs(rows: &[XRefRow]) -> impl Iterator<Item = &[XRefRow]> {
    rows.chunk_by(|a, b| b.obj_number == a.obj_number + 1)
}

struct Layout<'a> {
    head: Vec<u8>,
    entries: Vec<Entry<'a>>,
    tail: Vec<u8>,
    /// The size of the whole file.
    size: usize,
}

enum Entry<'a> {
    Borrowed(ObjRef, &'a Object),
    Owned(ObjRef, Object),
}

impl Entry<'_> {
    fn obj_ref(&self) -> ObjRef {
        match self {
            Self::Borrowed(r, _) | Self::Owned(r, _) => *r,
        }
    }

    fn object(&self) -> &Object {
        match self {
            Self::Borrowed(_, o) => o,
            Self::Owned(_, o) => o,
        }
    }

    fn size(&self) -> usize {
        display_len(&ObjHeader(self.obj_ref())) + self.object().size_in_bytes() + OBJ_END.len()
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        write_display(buf, &ObjHeader(self.obj_ref()));
        self.object().write_to(buf);
        buf.extend_from_slice(OBJ_END);
    }
}

/// The `N G obj` line in front of an indirect object.
struct ObjHeader(ObjRef);

impl Display for ObjHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} obj", self.0.obj_number, self.0.gen_number)
    }
}

struct XRefRow {
    obj_number: u32,
    kind: RowKind,
}

enum RowKind {
    Free,
    InUse { offset: usize, gen_number: u16 },
    Compressed { stream: u32, index: u32 },
}

impl XRefRow {
    /// The three fields of the row in a cross-reference stream.
    fn fields(&self) -> (u64, u64, u64) {
        match self.kind {
            RowKind::Free => (0, 0, u64::from(FREE_ENTRY_GEN)),
            RowKind::InUse { offset, gen_number } => {
                (1, offset as u64, u64::from(gen_number))
            }
            RowKind::Compressed { stream, index } => (2, u64::from(stream), u64::from(index)),
        }
    }
}

/// A row of a classic cross-reference table, exactly 20 bytes long.
impl Display for XRefRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RowKind::Free => writeln!(f, "{:010} {FREE_ENTRY_GEN:05} f ", 0),
            RowKind::InUse { offset, gen_number } => {
                writeln!(f, "{offset:010} {gen_number:05} n ")
            }
            // Classic tables can't describe compressed objects.
            RowKind::Compressed { .. } => Ok(()),
        }
    }
}

/// A future that yields to the executor once.
#[derive(Default)]
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();

            Poll::Pending
        }
    }
}
