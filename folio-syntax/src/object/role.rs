//! Typed views for dictionaries that play a special role in a document.

use crate::object::dict::keys::*;
use crate::object::{Array, Dict, ObjRef, Object, ObjectLike};
use std::ops::Deref;

/// The role a dictionary plays in a document.
///
/// The role is derived from the `/Type` entry (or the presence of `/Linearized`) and is
/// recomputed on every query, so it always reflects the current contents of the dictionary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DictKind {
    /// An ordinary dictionary.
    Plain,
    /// The document catalog.
    Catalog,
    /// An intermediate node of the page tree.
    PageTree,
    /// A leaf of the page tree.
    Page,
    /// The linearization parameter dictionary.
    Linearization,
}

impl DictKind {
    pub(crate) fn of(dict: &Dict) -> Self {
        if dict.contains_key(LINEARIZED) {
            return Self::Linearization;
        }

        match dict.get_name(TYPE).map(|n| n.as_bytes()) {
            Some(CATALOG) => Self::Catalog,
            Some(PAGES) => Self::PageTree,
            Some(PAGE) => Self::Page,
            _ => Self::Plain,
        }
    }

    /// The name of the role, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "Dict",
            Self::Catalog => "Catalog",
            Self::PageTree => "PageTree",
            Self::Page => "Page",
            Self::Linearization => "LinearizationParams",
        }
    }
}

macro_rules! role {
    ($(#[$attr:meta])* $name:ident, $kind:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq)]
        pub struct $name<'a>(&'a Dict);

        impl<'a> $name<'a> {
            /// View the dictionary in this role, if its kind matches.
            pub fn new(dict: &'a Dict) -> Option<Self> {
                (dict.kind() == DictKind::$kind).then_some(Self(dict))
            }

            /// Returns the underlying dictionary.
            pub fn dict(&self) -> &'a Dict {
                self.0
            }
        }

        impl Deref for $name<'_> {
            type Target = Dict;

            fn deref(&self) -> &Self::Target {
                self.0
            }
        }

        impl<'a> ObjectLike<'a> for $name<'a> {
            const STATIC_NAME: &'static str = stringify!($name);

            fn cast(obj: &'a Object) -> Option<Self> {
                Self::new(obj.as_dict()?)
            }
        }
    };
}

role!(
    /// The document catalog.
    Catalog,
    Catalog
);

role!(
    /// An intermediate node of the page tree.
    PageTree,
    PageTree
);

role!(
    /// A page.
    Page,
    Page
);

role!(
    /// The linearization parameter dictionary.
    LinearizationParams,
    Linearization
);

impl Catalog<'_> {
    /// The reference to the root of the page tree.
    pub fn pages(&self) -> Option<ObjRef> {
        self.get_ref(PAGES)
    }
}

impl<'a> PageTree<'a> {
    /// The children of the node.
    pub fn kids(&self) -> Option<&'a Array> {
        self.0.get_as::<&Array>(KIDS)
    }

    /// The number of leaves below the node.
    pub fn count(&self) -> Option<i64> {
        self.0.get_as::<i64>(COUNT)
    }

    /// The parent of the node, absent for the root.
    pub fn parent(&self) -> Option<ObjRef> {
        self.0.get_ref(PARENT)
    }
}

impl<'a> Page<'a> {
    /// The parent of the page.
    pub fn parent(&self) -> Option<ObjRef> {
        self.0.get_ref(PARENT)
    }

    /// The resources directly attached to the page.
    pub fn resources(&self) -> Option<&'a Object> {
        self.0.get(RESOURCES)
    }

    /// The content streams of the page.
    pub fn contents(&self) -> Option<&'a Object> {
        self.0.get(CONTENTS)
    }
}

impl LinearizationParams<'_> {
    /// The length of the file in bytes (`/L`).
    pub fn file_length(&self) -> Option<i64> {
        self.get_as::<i64>(L)
    }

    /// The object number of the first page's page object (`/O`).
    pub fn first_page_object(&self) -> Option<i64> {
        self.get_as::<i64>(O)
    }

    /// The number of pages in the document (`/N`).
    pub fn page_count(&self) -> Option<i64> {
        self.get_as::<i64>(N)
    }

    /// The version of the linearization format.
    pub fn version(&self) -> Option<f64> {
        self.get_as::<f64>(LINEARIZED)
    }
}
