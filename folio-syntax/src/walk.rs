//! Walking the reference graph of a context.

use crate::context::Context;
use crate::object::{ObjRef, Object};
use rustc_hash::FxHashSet;

/// A memoized depth-first walk over the references of a context.
///
/// Every reference is yielded at most once, so cycles terminate. The walk doesn't decide
/// which references to follow on its own: after receiving an object, push the references you
/// are interested in with [`RefWalk::push`] or [`RefWalk::push_refs_of`].
///
/// References that are not registered in the context are not yielded, but collected in
/// [`RefWalk::missing`].
pub struct RefWalk<'a> {
    ctx: &'a Context,
    visited: FxHashSet<ObjRef>,
    stack: Vec<ObjRef>,
    missing: Vec<ObjRef>,
}

impl<'a> RefWalk<'a> {
    /// Create a new walk without any pending references.
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            visited: FxHashSet::default(),
            stack: vec![],
            missing: vec![],
        }
    }

    /// Schedule a reference, unless it was already visited.
    pub fn push(&mut self, r: ObjRef) {
        if !self.visited.contains(&r) {
            self.stack.push(r);
        }
    }

    /// Schedule every reference contained in an object.
    pub fn push_refs_of(&mut self, object: &Object) {
        object.for_each_ref(&mut |r| self.push(r));
    }

    /// Mark a reference as visited without yielding it.
    ///
    /// Returns `true` if the reference wasn't visited before.
    pub fn visit(&mut self, r: ObjRef) -> bool {
        self.visited.insert(r)
    }

    /// Forget that a reference was visited, so that it can be yielded again.
    pub fn unvisit(&mut self, r: ObjRef) {
        self.visited.remove(&r);
    }

    /// Drop all pending references.
    pub fn clear_pending(&mut self) {
        self.stack.clear();
    }

    /// Whether the reference was already visited.
    pub fn is_visited(&self, r: ObjRef) -> bool {
        self.visited.contains(&r)
    }

    /// The references that were encountered but could not be resolved.
    pub fn missing(&self) -> &[ObjRef] {
        &self.missing
    }

    /// Consume the walk, returning the set of visited references.
    pub fn into_visited(self) -> FxHashSet<ObjRef> {
        self.visited
    }
}

impl<'a> Iterator for RefWalk<'a> {
    type Item = (ObjRef, &'a Object);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(r) = self.stack.pop() {
            if !self.visited.insert(r) {
                continue;
            }

            match self.ctx.lookup_ref(r) {
                Some(object) => return Some((r, object)),
                None => self.missing.push(r),
            }
        }

        None
    }
}

/// Return every registered reference that is reachable from `roots`.
pub fn reachable(ctx: &Context, roots: impl IntoIterator<Item = ObjRef>) -> FxHashSet<ObjRef> {
    let mut walk = RefWalk::new(ctx);
    roots.into_iter().for_each(|r| walk.push(r));

    while let Some((_, object)) = walk.next() {
        walk.push_refs_of(object);
    }

    let missing = walk.missing().to_vec();
    let mut visited = walk.into_visited();

    for r in missing {
        visited.remove(&r);
    }

    visited
}
