//! Copying object graphs from one context into another.

use crate::error::CopyError;
use folio_syntax::object::dict::keys::PARENT;
use folio_syntax::object::{Array, Dict, DictKind, Object, Stream};
use folio_syntax::page::{INHERITABLE, inherited};
use folio_syntax::walk::RefWalk;
use folio_syntax::{Context, ObjRef};
use log::{debug, warn};
use rustc_hash::FxHashMap;

/// Copies objects together with everything they reference from a source context into a
/// destination context.
///
/// Every source reference is mapped to exactly one new reference in the destination, and the
/// mapping is kept across calls to [`ObjectCopier::copy`]. Objects shared between several
/// copied roots therefore stay shared in the destination.
///
/// A page that a call starts from is copied without its `/Parent` entry, and the attributes
/// it inherits from the page tree of the source document are stored on the copy directly.
/// Pages reached through other objects, for example the `/Kids` of a copied page tree, keep
/// their parent.
pub struct ObjectCopier<'a> {
    src: &'a Context,
    dest: &'a mut Context,
    ref_map: FxHashMap<ObjRef, ObjRef>,
    walk: RefWalk<'a>,
}

impl<'a> ObjectCopier<'a> {
    /// Create a new copier.
    pub fn new(src: &'a Context, dest: &'a mut Context) -> Self {
        Self {
            src,
            dest,
            ref_map: FxHashMap::default(),
            walk: RefWalk::new(src),
        }
    }

    /// Copy an object and everything reachable from it.
    ///
    /// Returns the copied object. Direct objects are returned as a copy, references as the
    /// reference to the copied object in the destination.
    ///
    /// If a reference doesn't resolve in the source, the copy fails and every object this
    /// call registered in the destination is removed again. Objects copied by earlier calls
    /// are left untouched.
    pub fn copy(&mut self, object: &Object) -> Result<Object, CopyError> {
        let mut allocated = vec![];
        let result = self.copy_graph(object, &mut allocated);

        if result.is_err() {
            debug!("rolling back {} copied objects", allocated.len());

            for (src_ref, dest_ref) in allocated {
                self.ref_map.remove(&src_ref);
                self.walk.unvisit(src_ref);
                self.dest.delete(dest_ref);
            }

            self.walk.clear_pending();
        }

        result
    }

    /// Copy the object behind a reference and everything reachable from it.
    pub fn copy_ref(&mut self, r: ObjRef) -> Result<ObjRef, CopyError> {
        self.copy(&Object::Ref(r))?
            .as_obj_ref()
            .ok_or(CopyError::DanglingReference(r))
    }

    /// The reference a source reference was copied to, if any.
    pub fn mapped(&self, r: ObjRef) -> Option<ObjRef> {
        self.ref_map.get(&r).copied()
    }

    fn copy_graph(
        &mut self,
        object: &Object,
        allocated: &mut Vec<(ObjRef, ObjRef)>,
    ) -> Result<Object, CopyError> {
        let start = object.as_obj_ref();
        let copied = self.copy_direct(object, None, allocated)?;

        while let Some((src_ref, object)) = self.walk.next() {
            let dest_ref = self
                .mapped(src_ref)
                .ok_or(CopyError::DanglingReference(src_ref))?;
            let detach = (start == Some(src_ref)).then_some(src_ref);
            let copied = self.copy_direct(object, detach, allocated)?;
            self.dest.assign(dest_ref, copied);
        }

        Ok(copied)
    }

    /// Map a source reference to its destination reference, allocating a new one on first
    /// encounter. The referenced object is copied later.
    fn map_ref(
        &mut self,
        r: ObjRef,
        allocated: &mut Vec<(ObjRef, ObjRef)>,
    ) -> Result<ObjRef, CopyError> {
        if let Some(mapped) = self.mapped(r) {
            return Ok(mapped);
        }

        if !self.src.contains(r) {
            warn!("failed to copy dangling reference {r}");

            return Err(CopyError::DanglingReference(r));
        }

        let new_ref = self.dest.next_ref();
        self.ref_map.insert(r, new_ref);
        self.walk.push(r);
        allocated.push((r, new_ref));

        Ok(new_ref)
    }

    /// Copy an object without following references. `detach` is set to the source reference
    /// of a page that should be cut loose from its page tree.
    fn copy_direct(
        &mut self,
        object: &Object,
        detach: Option<ObjRef>,
        allocated: &mut Vec<(ObjRef, ObjRef)>,
    ) -> Result<Object, CopyError> {
        Ok(match object {
            Object::Ref(r) => Object::Ref(self.map_ref(*r, allocated)?),
            Object::Name(n) => Object::Name(self.dest.intern_name(n)),
            Object::Array(array) => Object::Array(
                array
                    .iter()
                    .map(|o| self.copy_direct(o, None, allocated))
                    .collect::<Result<Array, _>>()?,
            ),
            Object::Dict(dict) => Object::Dict(self.copy_dict(dict, detach, allocated)?),
            Object::Stream(stream) => {
                let dict = self.copy_dict(stream.dict(), None, allocated)?;

                Object::Stream(Stream::new(dict, stream.raw_data().to_vec()))
            }
            other => other.clone(),
        })
    }

    fn copy_dict(
        &mut self,
        dict: &Dict,
        detach: Option<ObjRef>,
        allocated: &mut Vec<(ObjRef, ObjRef)>,
    ) -> Result<Dict, CopyError> {
        let page = detach.filter(|_| dict.kind() == DictKind::Page);
        let mut copied = Dict::new();

        for (key, value) in dict {
            if page.is_some() && key.as_bytes() == PARENT {
                continue;
            }

            let key = self.dest.intern_name(key);
            copied.insert(key, self.copy_direct(value, None, allocated)?);
        }

        if let Some(page_ref) = page {
            let src = self.src;

            for key in INHERITABLE {
                if dict.contains_key(key) {
                    continue;
                }

                if let Some(value) = inherited(src, page_ref, key) {
                    copied.insert(key, self.copy_direct(value, None, allocated)?);
                }
            }
        }

        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use crate::copy::ObjectCopier;
    use crate::error::CopyError;
    use folio_syntax::object::{Object, Stream};
    use folio_syntax::{Context, ObjRef, dict};

    #[test]
    fn shared_references_stay_shared() {
        let mut src = Context::new();
        let a = src.register(1);
        let b = src.register(2);
        let array = Object::from(vec![a, b, a]);

        let mut dest = Context::new();
        dest.register(Object::Null);
        let copied = ObjectCopier::new(&src, &mut dest).copy(&array).unwrap();

        let items = copied.as_array().unwrap();
        assert_eq!(items[0], items[2]);
        assert_ne!(items[0], items[1]);
        assert_eq!(items[0].as_obj_ref(), Some(ObjRef::new(2, 0)));
        assert_eq!(dest.lookup(&items[1]).and_then(Object::as_i64), Some(2));
    }

    #[test]
    fn cycles_terminate() {
        let mut src = Context::new();
        let first = src.next_ref();
        let second = src.register(dict! { "Next" => first });
        src.assign(first, dict! { "Next" => second, "Me" => first });

        let mut dest = Context::new();
        let copied = ObjectCopier::new(&src, &mut dest).copy_ref(first).unwrap();

        assert_eq!(dest.len(), 2);
        let dict = dest.lookup_ref(copied).unwrap().as_dict().unwrap();
        assert_eq!(dict.get_ref(b"Me"), Some(copied));
        let next = dict.get_ref(b"Next").unwrap();
        assert_eq!(
            dest.lookup_ref(next).unwrap().as_dict().unwrap().get_ref(b"Next"),
            Some(copied)
        );
    }

    #[test]
    fn memo_persists_across_calls() {
        let mut src = Context::new();
        let font = src.register(dict! { "Type" => "Font" });
        let one = src.register(dict! { "Font" => font });
        let two = src.register(dict! { "Font" => font });

        let mut dest = Context::new();
        let mut copier = ObjectCopier::new(&src, &mut dest);
        let one = copier.copy_ref(one).unwrap();
        let two = copier.copy_ref(two).unwrap();
        let font_copy = copier.mapped(font).unwrap();
        drop(copier);

        assert_eq!(dest.len(), 3);
        for r in [one, two] {
            assert_eq!(
                dest.lookup_ref(r).unwrap().as_dict().unwrap().get_ref(b"Font"),
                Some(font_copy)
            );
        }
    }

    #[test]
    fn dangling_reference_rolls_back() {
        let mut src = Context::new();
        let good = src.register(dict! { "Value" => 1 });
        let bad = src.register(dict! {
            "Good" => good,
            "Missing" => ObjRef::new(99, 0),
        });

        let mut dest = Context::new();
        let mut copier = ObjectCopier::new(&src, &mut dest);
        assert_eq!(
            copier.copy_ref(bad),
            Err(CopyError::DanglingReference(ObjRef::new(99, 0)))
        );
        assert_eq!(copier.mapped(good), None);

        assert_eq!(copier.mapped(bad), None);

        let copied = copier.copy_ref(good).unwrap();
        assert!(copier.copy_ref(bad).is_err());
        drop(copier);

        assert_eq!(dest.len(), 1);
        assert!(dest.contains(copied));
    }

    #[test]
    fn streams_keep_their_data() {
        let mut src = Context::new();
        let stream = src.register(Stream::new(dict! { "Length" => 3 }, b"abc".to_vec()));

        let mut dest = Context::new();
        let copied = ObjectCopier::new(&src, &mut dest).copy_ref(stream).unwrap();
        let copied = dest.lookup_ref(copied).unwrap().as_stream().unwrap();

        assert_eq!(copied.raw_data(), b"abc");
        assert_eq!(copied.dict().get_as::<i64>(b"Length"), Some(3));
    }

    #[test]
    fn pages_are_detached_from_their_tree() {
        let mut src = Context::new();
        let tree = src.next_ref();
        let resources = src.register(dict! { "Font" => dict! {} });
        let page = src.register(dict! { "Type" => "Page", "Parent" => tree, "Rotate" => 90 });
        src.assign(
            tree,
            dict! {
                "Type" => "Pages",
                "Kids" => vec![page],
                "Count" => 1,
                "Resources" => resources,
                "MediaBox" => vec![0, 0, 200, 300],
                "Rotate" => 180,
            },
        );

        let mut dest = Context::new();
        let copied = ObjectCopier::new(&src, &mut dest).copy_ref(page).unwrap();
        let dict = dest.lookup_ref(copied).unwrap().as_dict().unwrap();

        assert!(dict.get(b"Parent").is_none());
        assert_eq!(dict.get_as::<i64>(b"Rotate"), Some(90));
        assert_eq!(dict.get(b"MediaBox").unwrap().as_array().unwrap().len(), 4);
        assert!(dest.lookup(dict.get(b"Resources").unwrap()).is_some());
        // The page and its resources, but not the page tree.
        assert_eq!(dest.len(), 2);
    }

    #[test]
    fn pages_inside_a_copied_tree_keep_their_parent() {
        let mut src = Context::new();
        let tree = src.next_ref();
        let page = src.register(dict! { "Type" => "Page", "Parent" => tree });
        src.assign(
            tree,
            dict! { "Type" => "Pages", "Kids" => vec![page], "Count" => 1, "Rotate" => 90 },
        );
        let catalog = src.register(dict! { "Type" => "Catalog", "Pages" => tree });

        let mut dest = Context::new();
        let mut copier = ObjectCopier::new(&src, &mut dest);
        copier.copy_ref(catalog).unwrap();
        let tree_copy = copier.mapped(tree).unwrap();
        let page_copy = copier.mapped(page).unwrap();
        drop(copier);

        let dict = dest.lookup_ref(page_copy).unwrap().as_dict().unwrap();
        assert_eq!(dict.get_ref(b"Parent"), Some(tree_copy));
        // Inherited attributes stay on the tree.
        assert!(dict.get(b"Rotate").is_none());
    }
}
