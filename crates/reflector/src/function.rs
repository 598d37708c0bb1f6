//! Function variant

use reflector_core::{FuncValue, Signature, Value};
use tracing::trace;

use crate::error::{ReflectError, Result};
use crate::invoke::{bind_arguments, classify_all};
use crate::ty::{Node, Reflected, Type};

/// `func(...) ...`
#[derive(Debug, Clone)]
pub struct Function {
    node: Node,
    sig: Signature,
}

impl Function {
    pub(crate) fn new(node: Node) -> Self {
        let sig = node
            .descriptor
            .signature()
            .cloned()
            .unwrap_or_else(|| Signature::new(Vec::new(), Vec::new()));
        Self { node, sig }
    }

    /// Parameter and result types
    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    /// Parameter types, in order; `None` where a type has no variant
    pub fn parameters(&self) -> Vec<Option<Type>> {
        classify_all(&self.sig.params)
    }

    /// Parameter `index`
    pub fn parameter(&self, index: usize) -> Option<Type> {
        self.parameters().into_iter().nth(index).flatten()
    }

    /// Number of declared parameters; a variadic tail counts as one
    pub fn num_parameter(&self) -> usize {
        self.sig.params.len()
    }

    /// Result types, in order
    pub fn results(&self) -> Vec<Option<Type>> {
        classify_all(&self.sig.results)
    }

    /// Result `index`
    pub fn result(&self, index: usize) -> Option<Type> {
        self.results().into_iter().nth(index).flatten()
    }

    /// Number of results
    pub fn num_result(&self) -> usize {
        self.sig.results.len()
    }

    /// Whether the last parameter collects trailing arguments
    pub fn is_variadic(&self) -> bool {
        self.sig.variadic
    }

    /// Call the bound function
    pub fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>> {
        let func = self
            .node
            .load()?
            .as_func()
            .cloned()
            .ok_or(ReflectError::NilReference)?;
        let args = bind_arguments(&self.sig, args)?;
        trace!(function = %self.name(), args = args.len(), "invoke");
        Ok(func.call(&args))
    }

    fn registered(&self) -> Option<FuncValue> {
        self.node
            .handle
            .as_ref()
            .and_then(|handle| handle.with(|value| value.as_func().cloned()))
    }
}

impl Reflected for Function {
    fn node(&self) -> &Node {
        &self.node
    }

    /// Registered name of the bound function, or the rendered signature
    fn name(&self) -> String {
        self.registered()
            .and_then(|func| func.name().map(str::to_string))
            .unwrap_or_else(|| self.node.descriptor.name())
    }

    fn package_name(&self) -> String {
        self.registered()
            .and_then(|func| func.pkg_path().rsplit('/').next().map(str::to_string))
            .unwrap_or_default()
    }

    fn package_path(&self) -> String {
        self.registered()
            .map(|func| func.pkg_path().to_string())
            .unwrap_or_default()
    }
}
