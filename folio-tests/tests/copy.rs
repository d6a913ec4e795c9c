use crate::{assert_isomorphic, parse};
use folio_syntax::object::Object;
use folio_syntax::{Context, ObjRef, dict, page};
use folio_tests::pages_with_shared_font;
use folio_write::{CopyError, ObjectCopier};

#[test]
fn aliases_map_to_the_same_reference() {
    let mut src = Context::new();
    let first = src.register(dict! { "Value" => 1 });
    let second = src.register(dict! { "Value" => 2 });
    let array = Object::from(vec![first, second, first]);

    let mut dest = Context::new();
    let copied = ObjectCopier::new(&src, &mut dest).copy(&array).unwrap();
    let items = copied.as_array().unwrap();

    assert_eq!(items[0], items[2]);
    assert_ne!(items[0], items[1]);
    assert_eq!(dest.len(), 2);
}

#[test]
fn self_reference_terminates() {
    let mut src = Context::new();
    let node = src.next_ref();
    src.assign(node, dict! { "Self" => node, "Kind" => "Loop" });

    let mut dest = Context::new();
    let copied = ObjectCopier::new(&src, &mut dest).copy_ref(node).unwrap();

    let dict = dest.lookup_ref(copied).unwrap().as_dict().unwrap();
    assert_eq!(dict.get_ref(b"Self"), Some(copied));
    assert_eq!(dest.len(), 1);
}

#[test]
fn copy_of_catalog_brings_the_page_tree() {
    let src = parse(&pages_with_shared_font(2));

    let mut dest = Context::new();
    let root = ObjectCopier::new(&src, &mut dest)
        .copy_ref(src.root().unwrap())
        .unwrap();
    dest.set_root(Some(root));

    let pages = page::pages(&dest);
    assert_eq!(pages.len(), 2);
    // Everything except the info dictionary.
    assert_eq!(dest.len(), src.len() - 1);

    let tree = dest.catalog().unwrap().unwrap().pages();
    for page in pages {
        let dict = dest.lookup_ref(page).unwrap().as_dict().unwrap();
        assert_eq!(dict.get_ref(b"Parent"), tree);
    }
}

#[test]
fn copied_pages_share_resources() {
    let src = parse(&pages_with_shared_font(3));
    let pages = page::pages(&src);

    let mut dest = Context::new();
    let mut copier = ObjectCopier::new(&src, &mut dest);
    let copied = pages
        .iter()
        .map(|p| copier.copy_ref(*p).unwrap())
        .collect::<Vec<_>>();
    drop(copier);

    // Three pages, three content streams, one font.
    assert_eq!(dest.len(), 7);

    let font = |page: ObjRef| {
        let resources = dest.lookup_ref(page).unwrap().as_dict().unwrap().get(b"Resources");
        let resources = dest.lookup(resources.unwrap()).unwrap().as_dict().unwrap();
        let fonts = dest.lookup(resources.get(b"Font").unwrap()).unwrap().as_dict().unwrap();
        fonts.get_ref(b"F1").unwrap()
    };
    assert_eq!(font(copied[0]), font(copied[2]));

    for page in copied {
        let dict = dest.lookup_ref(page).unwrap().as_dict().unwrap();
        assert!(dict.get(b"Parent").is_none());
        assert!(dict.get(b"MediaBox").is_some());
    }
}

#[test]
fn dangling_reference_fails_cleanly() {
    let mut src = Context::new();
    let inner = src.register(dict! { "Missing" => ObjRef::new(40, 0) });
    let outer = src.register(dict! { "Inner" => inner });

    let mut dest = Context::new();
    dest.register(Object::Null);

    assert_eq!(
        ObjectCopier::new(&src, &mut dest).copy_ref(outer),
        Err(CopyError::DanglingReference(ObjRef::new(40, 0)))
    );
    assert_eq!(dest.len(), 1);
}

#[test]
fn copy_then_round_trip() {
    let src = parse(&pages_with_shared_font(1));

    let mut first = Context::new();
    let root = ObjectCopier::new(&src, &mut first)
        .copy_ref(src.root().unwrap())
        .unwrap();
    first.set_root(Some(root));

    let mut second = Context::new();
    let root = ObjectCopier::new(&first, &mut second)
        .copy_ref(first.root().unwrap())
        .unwrap();
    second.set_root(Some(root));

    assert_isomorphic(&first, &second);
}
