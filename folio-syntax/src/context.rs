//! The registry of indirect objects that make up a document.

use crate::error::LookupError;
use crate::object::{Catalog, MAX_OBJECT_NUMBER, Name, NamePool, ObjRef, Object, ObjectLike};
use crate::walk;
use indexmap::IndexMap;
use log::{debug, warn};
use rustc_hash::FxBuildHasher;
use std::fmt::{Display, Formatter};

/// The version from the header of a PDF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Header {
    /// The major version.
    pub major: u8,
    /// The minor version.
    pub minor: u8,
}

impl Header {
    /// Create a new header.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(1, 7)
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// An owned registry of indirect objects, together with the trailer information of the
/// document.
///
/// References inside of objects are never resolved eagerly, use [`Context::lookup`] to follow
/// them. A reference that is not registered is not an error, it simply resolves to nothing.
#[derive(Debug, Clone, Default)]
pub struct Context {
    header: Header,
    objects: IndexMap<ObjRef, Object, FxBuildHasher>,
    largest_object_number: u32,
    names: NamePool,
    root: Option<ObjRef>,
    info: Option<ObjRef>,
    encrypt: Option<Object>,
    id: Option<Object>,
}

impl Context {
    /// Create a new, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new, empty context with the given version.
    pub fn with_header(header: Header) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    /// The version of the document.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Set the version of the document.
    pub fn set_header(&mut self, header: Header) {
        self.header = header;
    }

    /// Register a new object under a freshly allocated reference.
    pub fn register(&mut self, object: impl Into<Object>) -> ObjRef {
        let r = self.next_ref();
        self.objects.insert(r, object.into());

        r
    }

    /// Allocate a new reference without storing anything under it.
    ///
    /// Object numbers are handed out monotonically and never reused, not even after
    /// [`Context::delete`].
    pub fn next_ref(&mut self) -> ObjRef {
        self.largest_object_number += 1;

        ObjRef::new(self.largest_object_number, 0)
    }

    /// Store an object under a given reference, replacing any previous object.
    ///
    /// References whose object number exceeds [`MAX_OBJECT_NUMBER`] are rejected and nothing
    /// is stored.
    pub fn assign(&mut self, r: ObjRef, object: impl Into<Object>) {
        if r.obj_number > MAX_OBJECT_NUMBER {
            warn!("not storing object {r}, its object number is out of range");

            return;
        }

        self.largest_object_number = self.largest_object_number.max(r.obj_number);
        self.objects.insert(r, object.into());
    }

    /// Resolve one level of indirection.
    ///
    /// Returns the object itself if it is not a reference and `None` if it is a reference that
    /// is not registered.
    pub fn lookup<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Ref(r) => self.lookup_ref(*r),
            other => Some(other),
        }
    }

    /// Return the object registered under a reference.
    pub fn lookup_ref(&self, r: ObjRef) -> Option<&Object> {
        self.objects.get(&r)
    }

    /// Return the object registered under a reference mutably.
    pub fn lookup_ref_mut(&mut self, r: ObjRef) -> Option<&mut Object> {
        self.objects.get_mut(&r)
    }

    /// Resolve one level of indirection and view the result as a specific type.
    ///
    /// Missing objects and `null` are reported as `Ok(None)`, an object of another type as
    /// [`LookupError::TypeMismatch`].
    pub fn lookup_as<'a, T: ObjectLike<'a>>(
        &'a self,
        object: &'a Object,
    ) -> Result<Option<T>, LookupError> {
        match self.lookup(object) {
            None | Some(Object::Null) => Ok(None),
            Some(resolved) => T::cast(resolved)
                .map(Some)
                .ok_or_else(|| LookupError::TypeMismatch {
                    expected: T::STATIC_NAME,
                    found: describe(resolved),
                }),
        }
    }

    /// Like [`Context::lookup_as`], but starting from a reference.
    pub fn lookup_ref_as<'a, T: ObjectLike<'a>>(
        &'a self,
        r: ObjRef,
    ) -> Result<Option<T>, LookupError> {
        match self.lookup_ref(r) {
            None => Ok(None),
            Some(object) => self.lookup_as(object),
        }
    }

    /// Remove an object from the registry. Objects referencing it are left untouched.
    pub fn delete(&mut self, r: ObjRef) -> Option<Object> {
        self.objects.shift_remove(&r)
    }

    /// Whether an object is registered under the reference.
    pub fn contains(&self, r: ObjRef) -> bool {
        self.objects.contains_key(&r)
    }

    /// Convert a native value into an object.
    ///
    /// Names created through the context are interned in its name pool.
    pub fn obj(&mut self, value: impl Into<Object>) -> Object {
        match value.into() {
            Object::Name(n) => Object::Name(self.names.intern(n.as_bytes())),
            other => other,
        }
    }

    /// Return the interned name with the given text.
    pub fn name(&mut self, name: &str) -> Name {
        self.names.intern(name.as_bytes())
    }

    /// Return the interned version of an existing name.
    pub fn intern_name(&mut self, name: &Name) -> Name {
        self.names.intern(name.as_bytes())
    }

    /// The name pool of the context.
    pub fn names(&self) -> &NamePool {
        &self.names
    }

    pub(crate) fn names_mut(&mut self) -> &mut NamePool {
        &mut self.names
    }

    /// Iterate over all registered objects, sorted by object and generation number.
    pub fn enumerate_indirect_objects(&self) -> impl Iterator<Item = (ObjRef, &Object)> + '_ {
        let mut entries = self.objects.iter().map(|(r, o)| (*r, o)).collect::<Vec<_>>();
        entries.sort_unstable_by_key(|(r, _)| *r);

        entries.into_iter()
    }

    /// Iterate over all registered objects mutably, in registration order.
    pub fn objects_mut(&mut self) -> impl Iterator<Item = (ObjRef, &mut Object)> + '_ {
        self.objects.iter_mut().map(|(r, o)| (*r, o))
    }

    /// The number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are registered.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The largest object number allocated so far.
    pub fn largest_object_number(&self) -> u32 {
        self.largest_object_number
    }

    /// The value of the `/Size` entry of the trailer.
    pub fn size(&self) -> u32 {
        self.largest_object_number + 1
    }

    /// The reference to the document catalog.
    pub fn root(&self) -> Option<ObjRef> {
        self.root
    }

    #[allow(missing_docs)]
    pub fn set_root(&mut self, root: Option<ObjRef>) {
        self.root = root;
    }

    /// The reference to the document information dictionary.
    pub fn info(&self) -> Option<ObjRef> {
        self.info
    }

    #[allow(missing_docs)]
    pub fn set_info(&mut self, info: Option<ObjRef>) {
        self.info = info;
    }

    /// The `/Encrypt` entry of the trailer.
    pub fn encrypt(&self) -> Option<&Object> {
        self.encrypt.as_ref()
    }

    #[allow(missing_docs)]
    pub fn set_encrypt(&mut self, encrypt: Option<Object>) {
        self.encrypt = encrypt;
    }

    /// The `/ID` entry of the trailer.
    pub fn id(&self) -> Option<&Object> {
        self.id.as_ref()
    }

    #[allow(missing_docs)]
    pub fn set_id(&mut self, id: Option<Object>) {
        self.id = id;
    }

    /// Return the document catalog.
    pub fn catalog(&self) -> Result<Option<Catalog<'_>>, LookupError> {
        match self.root {
            Some(root) => self.lookup_ref_as::<Catalog<'_>>(root),
            None => Ok(None),
        }
    }

    /// Bring the `/Length` entries of all streams up to date.
    pub fn finalize_for_write(&mut self) {
        for object in self.objects.values_mut() {
            if let Object::Stream(stream) = object {
                stream.finalize_for_write();
            }
        }
    }

    /// Delete every object that can't be reached from the trailer, returning how many objects
    /// were removed.
    pub fn prune_unreachable(&mut self) -> usize {
        let reachable = walk::reachable(self, self.trailer_refs());
        let before = self.objects.len();

        self.objects.retain(|r, _| reachable.contains(r));
        let removed = before - self.objects.len();
        debug!("pruned {removed} unreachable objects");

        removed
    }

    /// The references held by the trailer.
    pub fn trailer_refs(&self) -> Vec<ObjRef> {
        let mut refs = vec![];
        refs.extend(self.root);
        refs.extend(self.info);

        for object in [&self.encrypt, &self.id].into_iter().flatten() {
            object.for_each_ref(&mut |r| refs.push(r));
        }

        refs
    }
}

/// The type of an object, with dictionaries described by their role.
fn describe(object: &Object) -> &'static str {
    match object {
        Object::Dict(dict) => dict.kind().as_str(),
        other => other.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::dict;
    use crate::error::LookupError;
    use crate::object::{Catalog, Dict, MAX_OBJECT_NUMBER, ObjRef, Object, Page};

    #[test]
    fn sequential_registration() {
        let mut ctx = Context::new();
        assert_eq!(ctx.register(1), ObjRef::new(1, 0));
        assert_eq!(ctx.register(2), ObjRef::new(2, 0));
        assert_eq!(ctx.size(), 3);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let mut ctx = Context::new();
        ctx.assign(ObjRef::new(u32::MAX, 0), 1);
        ctx.assign(ObjRef::new(MAX_OBJECT_NUMBER, 0), 2);

        assert!(!ctx.contains(ObjRef::new(u32::MAX, 0)));
        assert_eq!(ctx.largest_object_number(), MAX_OBJECT_NUMBER);
        assert_eq!(ctx.register(3), ObjRef::new(MAX_OBJECT_NUMBER + 1, 0));
    }

    #[test]
    fn numbers_are_not_reused() {
        let mut ctx = Context::new();
        let r = ctx.register(Object::Null);
        ctx.delete(r);
        assert_eq!(ctx.register(Object::Null), ObjRef::new(2, 0));
    }

    #[test]
    fn assign_bumps_allocator() {
        let mut ctx = Context::new();
        ctx.assign(ObjRef::new(10, 0), 5);
        assert_eq!(ctx.next_ref(), ObjRef::new(11, 0));
        // A reference that was allocated but never assigned resolves to nothing.
        assert!(ctx.lookup_ref(ObjRef::new(11, 0)).is_none());
    }

    #[test]
    fn lookup_dangling() {
        let mut ctx = Context::new();
        let dict = dict! { "A" => ObjRef::new(5, 0) };
        ctx.register(dict.clone());
        assert!(ctx.lookup(dict.get(b"A").unwrap()).is_none());
    }

    #[test]
    fn lookup_direct() {
        let ctx = Context::new();
        let obj = Object::from(3);
        assert_eq!(ctx.lookup(&obj), Some(&obj));
    }

    #[test]
    fn lookup_as_mismatch() {
        let mut ctx = Context::new();
        let r = ctx.register(dict! { "Type" => "Catalog" });

        assert!(
            ctx.lookup_as::<Catalog<'_>>(&Object::Ref(r))
                .unwrap()
                .is_some()
        );
        assert_eq!(
            ctx.lookup_as::<Page<'_>>(&Object::Ref(r)),
            Err(LookupError::TypeMismatch {
                expected: "Page",
                found: "Catalog"
            })
        );
        assert_eq!(
            ctx.lookup_as::<&Dict>(&Object::from(1)),
            Err(LookupError::TypeMismatch {
                expected: "Dict",
                found: "Number"
            })
        );
    }

    #[test]
    fn lookup_as_null_is_absent() {
        let mut ctx = Context::new();
        let r = ctx.register(Object::Null);
        assert_eq!(ctx.lookup_ref_as::<&Dict>(r), Ok(None));
        assert_eq!(ctx.lookup_ref_as::<&Dict>(ObjRef::new(9, 0)), Ok(None));
    }

    #[test]
    fn enumerate_sorted() {
        let mut ctx = Context::new();
        ctx.assign(ObjRef::new(3, 0), 3);
        ctx.assign(ObjRef::new(1, 0), 1);
        ctx.assign(ObjRef::new(2, 0), 2);

        let numbers = ctx
            .enumerate_indirect_objects()
            .map(|(r, _)| r.obj_number)
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn obj_interns_names() {
        let mut ctx = Context::new();
        let a = ctx.obj("Type");
        let b = ctx.obj("Type");
        assert!(a.as_name().unwrap().ptr_eq(b.as_name().unwrap()));
        assert_eq!(ctx.names().len(), 1);
    }

    #[test]
    fn catalog() {
        let mut ctx = Context::new();
        assert_eq!(ctx.catalog(), Ok(None));

        let pages = ctx.register(dict! { "Type" => "Pages", "Kids" => Vec::<Object>::new(), "Count" => 0 });
        let root = ctx.register(dict! { "Type" => "Catalog", "Pages" => pages });
        ctx.set_root(Some(root));
        assert_eq!(ctx.catalog().unwrap().unwrap().pages(), Some(pages));
    }

    #[test]
    fn prune() {
        let mut ctx = Context::new();
        let leaf = ctx.register(1);
        let root = ctx.register(dict! { "Type" => "Catalog", "A" => leaf });
        let orphan = ctx.register(2);
        ctx.set_root(Some(root));

        assert_eq!(ctx.prune_unreachable(), 1);
        assert!(!ctx.contains(orphan));
        assert!(ctx.contains(leaf));
    }
}
