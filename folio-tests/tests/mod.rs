use folio_syntax::{Context, ParseOptions, parse_document};
use folio_write::{WriteOptions, Writer};

mod copy;

pub(crate) fn parse(data: &[u8]) -> Context {
    parse_document(data, &ParseOptions::default()).unwrap()
}

pub(crate) fn write(ctx: &mut Context, options: WriteOptions) -> Vec<u8> {
    Writer::for_context(ctx, options)
        .serialize_to_buffer()
        .unwrap()
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Check that two contexts hold the same objects, comparing them structurally.
///
/// References don't need to have the same numbers, only the same shape.
pub(crate) fn assert_isomorphic(a: &Context, b: &Context) {
    let (Some(root_a), Some(root_b)) = (a.root(), b.root()) else {
        panic!("both documents need a root");
    };

    let mut map = std::collections::HashMap::new();
    let mut pending = vec![(root_a, root_b)];

    while let Some((ra, rb)) = pending.pop() {
        if let Some(mapped) = map.insert(ra, rb) {
            assert_eq!(mapped, rb, "{ra} maps to both {mapped} and {rb}");
            continue;
        }

        let oa = a.lookup_ref(ra).unwrap();
        let ob = b.lookup_ref(rb).unwrap();
        compare(oa, ob, &mut pending);
    }
}

fn compare(
    a: &folio_syntax::object::Object,
    b: &folio_syntax::object::Object,
    pending: &mut Vec<(folio_syntax::ObjRef, folio_syntax::ObjRef)>,
) {
    use folio_syntax::object::Object;

    match (a, b) {
        (Object::Ref(ra), Object::Ref(rb)) => pending.push((*ra, *rb)),
        (Object::Array(aa), Object::Array(ab)) => {
            assert_eq!(aa.len(), ab.len());
            for (x, y) in aa.iter().zip(ab.iter()) {
                compare(x, y, pending);
            }
        }
        (Object::Dict(da), Object::Dict(db)) => compare_dicts(da, db, pending),
        (Object::Stream(sa), Object::Stream(sb)) => {
            assert_eq!(sa.raw_data(), sb.raw_data());
            compare_dicts(sa.dict(), sb.dict(), pending);
        }
        _ => assert_eq!(a, b),
    }
}

fn compare_dicts(
    a: &folio_syntax::object::Dict,
    b: &folio_syntax::object::Dict,
    pending: &mut Vec<(folio_syntax::ObjRef, folio_syntax::ObjRef)>,
) {
    assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");

    for (key, value) in a {
        let other = b.get(key).unwrap_or_else(|| panic!("missing key {key:?}"));
        compare(value, other, pending);
    }
}
