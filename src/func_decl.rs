//! Identity of an analyzed function.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// The identity of a function: a stable name, its ordered formal parameters,
/// and an optional return variable.
///
/// Equality, ordering, and hashing are defined over the name alone. Two
/// `FuncDecl`s with the same name are the same function no matter what their
/// parameter lists look like at the particular call site that constructed
/// them -- this is what lets `FuncDecl` serve as the key into the summary
/// table, the call-context table, and the driver's invariant map.
#[derive(Clone, Debug)]
pub struct FuncDecl<V> {
    name: Rc<str>,
    params: Rc<[V]>,
    ret: Option<V>,
}

impl<V> FuncDecl<V> {
    pub fn new(name: impl Into<Rc<str>>, params: Vec<V>, ret: Option<V>) -> Self {
        FuncDecl {
            name: name.into(),
            params: params.into(),
            ret,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[V] {
        &self.params
    }

    pub fn ret(&self) -> Option<&V>
    where
        V: Clone,
    {
        self.ret.as_ref()
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn is_main(&self) -> bool {
        &*self.name == "main"
    }
}

impl<V> PartialEq for FuncDecl<V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<V> Eq for FuncDecl<V> {}

impl<V> PartialOrd for FuncDecl<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V> Ord for FuncDecl<V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl<V> Hash for FuncDecl<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<V> fmt::Display for FuncDecl<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
