//! Native callables
//!
//! Function and method bodies are host closures over dynamic values. A
//! method body receives its receiver as the first argument.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::{is_exported_name, Signature};
use crate::value::Value;

/// Body of a function or method
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

/// Wrap a closure as a [`NativeFn`]
pub fn native<F>(body: F) -> NativeFn
where
    F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
{
    Arc::new(body)
}

/// A function value
#[derive(Clone)]
pub struct FuncValue {
    name: Option<String>,
    pkg_path: String,
    body: NativeFn,
}

impl FuncValue {
    /// Anonymous function
    pub fn new(body: NativeFn) -> Self {
        Self {
            name: None,
            pkg_path: String::new(),
            body,
        }
    }

    /// Function registered under a package-qualified name
    pub fn named(pkg_path: impl Into<String>, name: impl Into<String>, body: NativeFn) -> Self {
        Self {
            name: Some(name.into()),
            pkg_path: pkg_path.into(),
            body,
        }
    }

    /// Registered name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Package path of the registration
    pub fn pkg_path(&self) -> &str {
        &self.pkg_path
    }

    /// Run the body
    pub fn call(&self, args: &[Value]) -> Vec<Value> {
        (self.body)(args)
    }

    /// Whether both values run the same body
    pub fn same(&self, other: &FuncValue) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.body), Arc::as_ptr(&other.body))
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "func {name}"),
            None => f.write_str("func"),
        }
    }
}

/// A method declared on a named type
#[derive(Clone)]
pub struct MethodDecl {
    name: String,
    pkg_path: String,
    sig: Signature,
    pointer_receiver: bool,
    body: NativeFn,
}

impl MethodDecl {
    /// Method with a value receiver
    pub fn new(name: impl Into<String>, sig: Signature, body: NativeFn) -> Self {
        Self {
            name: name.into(),
            pkg_path: String::new(),
            sig,
            pointer_receiver: false,
            body,
        }
    }

    /// Method with a pointer receiver
    pub fn pointer(name: impl Into<String>, sig: Signature, body: NativeFn) -> Self {
        Self {
            pointer_receiver: true,
            ..Self::new(name, sig, body)
        }
    }

    /// Record the declaring package of an unexported method
    pub fn in_package(mut self, pkg_path: impl Into<String>) -> Self {
        self.pkg_path = pkg_path.into();
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring package for unexported methods
    pub fn pkg_path(&self) -> &str {
        &self.pkg_path
    }

    /// Signature, without receiver
    pub fn sig(&self) -> &Signature {
        &self.sig
    }

    /// Whether the receiver is a pointer
    pub fn pointer_receiver(&self) -> bool {
        self.pointer_receiver
    }

    /// Whether the method is visible outside its package
    pub fn is_exported(&self) -> bool {
        is_exported_name(&self.name)
    }

    /// Run the body with `receiver` prepended to `args`
    pub fn call(&self, receiver: Value, args: Vec<Value>) -> Vec<Value> {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(receiver);
        all.extend(args);
        (self.body)(&all)
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("sig", &self.sig.render())
            .field("pointer_receiver", &self.pointer_receiver)
            .finish()
    }
}
