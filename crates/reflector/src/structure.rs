//! Struct variant

use reflector_core::{Descriptor, Handle, Kind, Shape};
use rustc_hash::FxHashSet;

use crate::field::Field;
use crate::interface::Interface;
use crate::method::{lookup, Method};
use crate::ty::{Node, Reflected, Type};

/// `struct { ... }`
///
/// Fields are computed per access, in declaration order. Methods are taken
/// from the pointer method set when the struct was reached through a
/// [`crate::Pointer`], and from the value method set otherwise.
/// [`Struct::method_by_name`] can still reach pointer-receiver methods on a
/// struct held by value.
#[derive(Debug, Clone)]
pub struct Struct {
    node: Node,
}

impl Struct {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Number of declared fields
    pub fn num_field(&self) -> usize {
        self.node.descriptor.fields().map_or(0, <[_]>::len)
    }

    /// Every field, in declaration order
    pub fn fields(&self) -> Vec<Field> {
        (0..self.num_field())
            .filter_map(|index| self.field(index))
            .collect()
    }

    /// Field `index`
    pub fn field(&self, index: usize) -> Option<Field> {
        let decl = self.node.descriptor.fields()?.get(index)?.clone();
        Some(Field::new(self.clone(), index, decl))
    }

    /// First field called `name`
    pub fn field_by_name(&self, name: &str) -> Option<Field> {
        let index = self
            .node
            .descriptor
            .fields()?
            .iter()
            .position(|field| field.name == name)?;
        self.field(index)
    }

    /// Methods visible from how this struct was reached, sorted by name
    pub fn methods(&self) -> Vec<Method> {
        let (receiver_ty, receiver) = self.receiver();
        receiver_ty
            .method_set()
            .into_iter()
            .map(|entry| {
                Method::new(
                    entry,
                    receiver_ty.clone(),
                    receiver.clone(),
                    Type::Struct(self.clone()),
                )
            })
            .collect()
    }

    /// Number of visible methods
    pub fn num_method(&self) -> usize {
        self.receiver().0.method_set().len()
    }

    /// Method called `name`
    ///
    /// On a struct reached by value this also finds pointer-receiver
    /// methods; they run against the struct's address when it is
    /// addressable and against a copy otherwise.
    pub fn method_by_name(&self, name: &str) -> Option<Method> {
        let (receiver_ty, receiver) = self.receiver();
        let entry = lookup(&receiver_ty, name)?;
        Some(Method::new(
            entry,
            receiver_ty,
            receiver,
            Type::Struct(self.clone()),
        ))
    }

    /// Whether the visible method set satisfies `iface`
    pub fn implements(&self, iface: &Interface) -> bool {
        self.receiver().0.implements(iface.descriptor())
    }

    /// Whether `candidate` is embedded here, directly or through embedded
    /// structs and embedded pointers
    pub fn embeds(&self, candidate: &Type) -> bool {
        let root = &self.node.descriptor;
        let mut visited = FxHashSet::default();
        visited.insert(visit_key(root));
        embeds_in(root, candidate.descriptor(), &mut visited)
    }

    /// Receiver type and handle methods are resolved against
    fn receiver(&self) -> (Descriptor, Option<Handle>) {
        match self.parent() {
            Some(Type::Pointer(pointer)) => {
                (pointer.descriptor().clone(), pointer.handle().cloned())
            }
            _ => (self.node.descriptor.clone(), self.node.handle.clone()),
        }
    }
}

fn embeds_in(ty: &Descriptor, candidate: &Descriptor, visited: &mut FxHashSet<String>) -> bool {
    let Some(fields) = ty.fields() else {
        return false;
    };
    for field in fields.iter().filter(|field| field.embedded) {
        let target = match field.ty.shape() {
            Some(Shape::Pointer(elem)) if !field.ty.is_named() => elem.clone(),
            _ => field.ty.clone(),
        };
        if field.ty == *candidate || target == *candidate {
            return true;
        }
        if target.kind() == Kind::Struct
            && visited.insert(visit_key(&target))
            && embeds_in(&target, candidate, visited)
        {
            return true;
        }
    }
    false
}

fn visit_key(ty: &Descriptor) -> String {
    format!("{}.{}", ty.pkg_path(), ty.name())
}

impl Reflected for Struct {
    fn node(&self) -> &Node {
        &self.node
    }
}
