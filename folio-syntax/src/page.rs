//! Reading and editing the page tree.

use crate::context::Context;
use crate::error::PageError;
use crate::object::dict::keys::*;
use crate::object::{Array, Dict, DictKind, ObjRef, Object};
use crate::walk::RefWalk;
use log::warn;

/// Attributes a page inherits from its ancestors if it doesn't define them itself.
pub const INHERITABLE: [&[u8]; 4] = [RESOURCES, MEDIA_BOX, CROP_BOX, ROTATE];

/// Page trees nested deeper than this are considered malformed.
const MAX_TREE_DEPTH: usize = 64;

/// A leaf of the page tree together with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Leaf {
    page: ObjRef,
    /// The nodes from the root down to the direct parent of the page.
    path: Vec<ObjRef>,
    /// The position of the page in the `/Kids` array of its parent.
    position: usize,
}

/// Return the references to all pages of the document, in order.
///
/// Cycles and overly deep trees are cut off.
pub fn pages(ctx: &Context) -> Vec<ObjRef> {
    leaves(ctx).into_iter().map(|l| l.page).collect()
}

fn page_tree_root(ctx: &Context) -> Option<ObjRef> {
    ctx.catalog().ok().flatten()?.pages()
}

fn leaves(ctx: &Context) -> Vec<Leaf> {
    let mut leaves = vec![];

    if let Some(root) = page_tree_root(ctx) {
        let mut walk = RefWalk::new(ctx);
        walk.visit(root);
        collect_leaves(ctx, root, &mut vec![root], &mut walk, &mut leaves);
    }

    leaves
}

fn collect_leaves(
    ctx: &Context,
    node: ObjRef,
    path: &mut Vec<ObjRef>,
    walk: &mut RefWalk<'_>,
    leaves: &mut Vec<Leaf>,
) {
    if path.len() > MAX_TREE_DEPTH {
        warn!("page tree is too deep, ignoring node {node}");

        return;
    }

    let Some(kids) = ctx
        .lookup_ref(node)
        .and_then(Object::as_dict)
        .and_then(|d| d.get(KIDS))
        .and_then(|k| ctx.lookup(k))
        .and_then(Object::as_array)
    else {
        warn!("page tree node {node} has no kids");

        return;
    };

    for (position, kid) in kids.iter().enumerate() {
        let Some(kid) = kid.as_obj_ref() else {
            warn!("ignoring direct object in kids of {node}");

            continue;
        };

        if !walk.visit(kid) {
            warn!("page tree contains a cycle at {kid}");

            continue;
        }

        let Some(dict) = ctx.lookup_ref(kid).and_then(Object::as_dict) else {
            warn!("page tree entry {kid} is missing or not a dictionary");

            continue;
        };

        // Nodes without a type are treated as pages, unless they have kids.
        let is_node = match dict.kind() {
            DictKind::PageTree => true,
            DictKind::Page => false,
            _ => dict.contains_key(KIDS),
        };

        if is_node {
            path.push(kid);
            collect_leaves(ctx, kid, path, walk, leaves);
            path.pop();
        } else {
            leaves.push(Leaf {
                page: kid,
                path: path.clone(),
                position,
            });
        }
    }
}

/// Look up an attribute of a page, taking inheritance from the ancestors into account.
pub fn inherited<'a>(ctx: &'a Context, page: ObjRef, key: &[u8]) -> Option<&'a Object> {
    let mut walk = RefWalk::new(ctx);
    let mut current = page;

    for _ in 0..=MAX_TREE_DEPTH {
        if !walk.visit(current) {
            return None;
        }

        let dict = ctx.lookup_ref(current)?.as_dict()?;

        if let Some(value) = dict.get(key) {
            return Some(value);
        }

        current = dict.get_ref(PARENT)?;
    }

    None
}

/// Make sure the catalog has a page tree, creating an empty one if necessary.
fn ensure_page_tree(ctx: &mut Context) -> Result<ObjRef, PageError> {
    if let Some(root) = page_tree_root(ctx) {
        return Ok(root);
    }

    let catalog = ctx.root().ok_or(PageError::MissingCatalog)?;

    if ctx.catalog().ok().flatten().is_none() {
        return Err(PageError::MissingCatalog);
    }

    let tree = ctx.register(Dict::from_iter([
        (TYPE, Object::Name(PAGES.into())),
        (KIDS, Object::Array(Array::new())),
        (COUNT, Object::from(0)),
    ]));

    if let Some(dict) = ctx.lookup_ref_mut(catalog).and_then(Object::as_dict_mut) {
        dict.insert(PAGES, tree);
    }

    Ok(tree)
}

/// Return the `/Kids` array of a node mutably, following one level of indirection.
fn kids_mut(ctx: &mut Context, node: ObjRef) -> Option<&mut Array> {
    let indirect = ctx
        .lookup_ref(node)?
        .as_dict()?
        .get(KIDS)
        .and_then(Object::as_obj_ref);

    let kids = match indirect {
        Some(r) => ctx.lookup_ref_mut(r)?,
        None => ctx.lookup_ref_mut(node)?.as_dict_mut()?.get_mut(KIDS)?,
    };

    kids.as_array_mut()
}

fn adjust_counts(ctx: &mut Context, path: &[ObjRef], delta: i64) {
    for node in path {
        if let Some(dict) = ctx.lookup_ref_mut(*node).and_then(Object::as_dict_mut) {
            let count = dict.get_as::<i64>(COUNT).unwrap_or(0);
            dict.insert(COUNT, (count + delta).max(0));
        }
    }
}

/// Insert a registered page dictionary into the page tree, so that it ends up at `index`.
///
/// The page is inserted next to the page currently at `index`, or appended to the root of
/// the tree if `index` is the number of pages. Its `/Parent` entry is updated.
pub fn insert_page(ctx: &mut Context, index: usize, page: ObjRef) -> Result<(), PageError> {
    if ctx.lookup_ref_as::<crate::object::Page<'_>>(page).ok().flatten().is_none() {
        return Err(PageError::NotAPage(page));
    }

    let root = ensure_page_tree(ctx)?;
    let leaves = leaves(ctx);

    let (parent, position, path) = if index == leaves.len() {
        let position = kids_mut(ctx, root)
            .ok_or(PageError::MalformedNode(root))?
            .len();

        (root, position, vec![root])
    } else {
        let leaf = leaves.get(index).ok_or(PageError::IndexOutOfBounds {
            index,
            count: leaves.len(),
        })?;
        let parent = *leaf.path.last().ok_or(PageError::MalformedNode(root))?;

        (parent, leaf.position, leaf.path.clone())
    };

    kids_mut(ctx, parent)
        .ok_or(PageError::MalformedNode(parent))?
        .insert(position, Object::Ref(page));
    adjust_counts(ctx, &path, 1);

    if let Some(dict) = ctx.lookup_ref_mut(page).and_then(Object::as_dict_mut) {
        dict.insert(PARENT, parent);
    }

    Ok(())
}

/// Append a registered page dictionary to the end of the document.
pub fn append_page(ctx: &mut Context, page: ObjRef) -> Result<(), PageError> {
    let count = pages(ctx).len();
    insert_page(ctx, count, page)
}

/// Remove the page at `index` from the page tree, returning its reference.
///
/// The page object itself stays registered.
pub fn remove_page(ctx: &mut Context, index: usize) -> Result<ObjRef, PageError> {
    let leaves = leaves(ctx);
    let leaf = leaves.get(index).ok_or(PageError::IndexOutOfBounds {
        index,
        count: leaves.len(),
    })?;
    let parent = *leaf
        .path
        .last()
        .ok_or(PageError::MalformedNode(leaf.page))?;

    let kids = kids_mut(ctx, parent).ok_or(PageError::MalformedNode(parent))?;

    if kids.get(leaf.position).and_then(Object::as_obj_ref) != Some(leaf.page) {
        return Err(PageError::MalformedNode(parent));
    }

    kids.remove(leaf.position);
    adjust_counts(ctx, &leaf.path, -1);

    Ok(leaf.page)
}
