//! Channel variant
//!
//! Every operation needs a bound, non-nil channel. `send` and `receive`
//! block the calling thread; `try_send` and `try_receive` return
//! [`ReflectError::NotReady`] instead.

use std::fmt;
use std::sync::Arc;

use reflector_core::{ChanDir, ChannelObject, Value};
use tracing::trace;

use crate::classify::classify;
use crate::defaults::DEFAULT_CHANNEL_CAPACITY;
use crate::error::{ReflectError, Result};
use crate::instance::Instance;
use crate::ty::{Node, Reflected, Type};

/// Set of permitted channel operations
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChanDirection(u8);

impl ChanDirection {
    /// `<-chan T`
    pub const RECEIVE: ChanDirection = ChanDirection(1);
    /// `chan<- T`
    pub const SEND: ChanDirection = ChanDirection(1 << 1);
    /// `chan T`
    pub const BOTH: ChanDirection = ChanDirection(1 | 1 << 1);

    /// Raw flag bits
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every flag of `other` is set
    pub fn contains(self, other: ChanDirection) -> bool {
        self.0 & other.0 == other.0
    }
}

impl From<ChanDir> for ChanDirection {
    fn from(dir: ChanDir) -> Self {
        match dir {
            ChanDir::Both => ChanDirection::BOTH,
            ChanDir::Send => ChanDirection::SEND,
            ChanDir::Recv => ChanDirection::RECEIVE,
        }
    }
}

impl fmt::Debug for ChanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChanDirection::BOTH => f.write_str("BOTH"),
            ChanDirection::SEND => f.write_str("SEND"),
            ChanDirection::RECEIVE => f.write_str("RECEIVE"),
            ChanDirection(bits) => write!(f, "ChanDirection({bits:#04b})"),
        }
    }
}

/// `chan T`, `chan<- T`, `<-chan T`
#[derive(Debug, Clone)]
pub struct Chan {
    node: Node,
}

impl Chan {
    pub(crate) fn new(node: Node) -> Self {
        Self { node }
    }

    /// Element type
    pub fn elem(&self) -> Option<Type> {
        classify(&self.node.descriptor.elem()?, None, None)
    }

    /// Permitted operations
    pub fn direction(&self) -> ChanDirection {
        self.node
            .descriptor
            .chan_dir()
            .map_or(ChanDirection::BOTH, ChanDirection::from)
    }

    /// Buffer capacity
    pub fn cap(&self) -> Result<usize> {
        Ok(self.object()?.capacity())
    }

    /// Number of buffered values
    pub fn len(&self) -> Result<usize> {
        Ok(self.object()?.length())
    }

    /// Whether no value is buffered
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Send, blocking until buffer space or a receiver is available
    pub fn send(&self, value: Value) -> Result<()> {
        let (channel, value) = self.outgoing(value)?;
        trace!(ty = %self.node.descriptor, "channel send");
        channel.send(value)?;
        Ok(())
    }

    /// Receive, blocking until a value is available
    pub fn receive(&self) -> Result<Value> {
        let channel = self.incoming()?;
        trace!(ty = %self.node.descriptor, "channel receive");
        Ok(channel.receive()?)
    }

    /// Send without blocking
    pub fn try_send(&self, value: Value) -> Result<()> {
        let (channel, value) = self.outgoing(value)?;
        channel.try_send(value)?;
        Ok(())
    }

    /// Receive without blocking
    pub fn try_receive(&self) -> Result<Value> {
        Ok(self.incoming()?.try_receive()?)
    }

    /// Close the channel, waking every blocked sender and receiver
    pub fn close(&self) -> Result<()> {
        let channel = self.object()?;
        if !self.direction().contains(ChanDirection::SEND) {
            return Err(ReflectError::InvalidDirection { operation: "close" });
        }
        channel.close();
        Ok(())
    }

    /// Fresh live channel with the given buffer capacity
    pub fn instantiate_with_capacity(&self, capacity: Option<usize>) -> Result<Instance> {
        let capacity = capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        Ok(Instance::new(Value::channel(&self.node.descriptor, capacity)?))
    }

    fn object(&self) -> Result<Arc<ChannelObject>> {
        self.node
            .load()?
            .as_chan()
            .cloned()
            .ok_or(ReflectError::NilReference)
    }

    fn outgoing(&self, value: Value) -> Result<(Arc<ChannelObject>, Value)> {
        let channel = self.object()?;
        if !self.direction().contains(ChanDirection::SEND) {
            return Err(ReflectError::InvalidDirection { operation: "send" });
        }
        let elem = self
            .node
            .descriptor
            .elem()
            .ok_or(ReflectError::NilReference)?;
        Ok((channel, value.assign_to(&elem)?))
    }

    fn incoming(&self) -> Result<Arc<ChannelObject>> {
        let channel = self.object()?;
        if !self.direction().contains(ChanDirection::RECEIVE) {
            return Err(ReflectError::InvalidDirection {
                operation: "receive",
            });
        }
        Ok(channel)
    }
}

impl Reflected for Chan {
    fn node(&self) -> &Node {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{type_of_descriptor, type_of_value};
    use reflector_core::{builtin, Descriptor};

    fn live(dir: ChanDir, capacity: usize) -> Type {
        let ty = Descriptor::chan_of(dir, &builtin::string());
        type_of_value(Value::channel(&ty, capacity).unwrap()).unwrap()
    }

    #[test]
    fn test_direction_flags() {
        assert!(ChanDirection::BOTH.contains(ChanDirection::SEND));
        assert!(ChanDirection::BOTH.contains(ChanDirection::RECEIVE));
        assert!(!ChanDirection::SEND.contains(ChanDirection::RECEIVE));
        assert_eq!(ChanDirection::BOTH.bits(), 3);
        assert_eq!(ChanDirection::from(ChanDir::Recv), ChanDirection::RECEIVE);
    }

    #[test]
    fn test_type_only_operations_fail() {
        let ty = type_of_descriptor(&Descriptor::chan_of(ChanDir::Both, &builtin::int())).unwrap();
        let chan = ty.as_chan().unwrap();
        assert!(chan.elem().unwrap().is_signed_integer());
        assert_eq!(chan.direction(), ChanDirection::BOTH);
        assert_eq!(chan.send(Value::int(1)), Err(ReflectError::NilReference));
        assert_eq!(chan.try_receive(), Err(ReflectError::NilReference));
        assert_eq!(chan.cap(), Err(ReflectError::NilReference));
    }

    #[test]
    fn test_buffered_round_trip() {
        let ty = live(ChanDir::Both, 2);
        let chan = ty.as_chan().unwrap();
        assert_eq!(chan.cap().unwrap(), 2);
        chan.try_send(Value::string("a")).unwrap();
        chan.send(Value::string("b")).unwrap();
        assert_eq!(chan.try_send(Value::string("c")), Err(ReflectError::NotReady));
        assert_eq!(chan.len().unwrap(), 2);
        assert_eq!(chan.receive().unwrap(), Value::string("a"));
        assert_eq!(chan.try_receive().unwrap(), Value::string("b"));
        assert_eq!(chan.try_receive(), Err(ReflectError::NotReady));
    }

    #[test]
    fn test_direction_enforced() {
        let ty = live(ChanDir::Recv, 1);
        assert_eq!(
            ty.as_chan().unwrap().send(Value::string("x")),
            Err(ReflectError::InvalidDirection { operation: "send" })
        );
        let ty = live(ChanDir::Send, 1);
        assert_eq!(
            ty.as_chan().unwrap().receive(),
            Err(ReflectError::InvalidDirection {
                operation: "receive"
            })
        );
    }

    #[test]
    fn test_wrong_element_type() {
        let ty = live(ChanDir::Both, 1);
        assert!(matches!(
            ty.as_chan().unwrap().send(Value::int(1)),
            Err(ReflectError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_closed_and_drained() {
        let ty = live(ChanDir::Both, 1);
        let chan = ty.as_chan().unwrap();
        chan.send(Value::string("last")).unwrap();
        chan.close().unwrap();
        assert_eq!(chan.receive().unwrap(), Value::string("last"));
        assert_eq!(chan.receive(), Err(ReflectError::ChannelClosed));
    }

    #[test]
    fn test_instantiate() {
        let ty = type_of_descriptor(&Descriptor::chan_of(ChanDir::Both, &builtin::int())).unwrap();
        assert!(ty.instantiate().unwrap().elem().is_nil());
        let instance = ty
            .as_chan()
            .unwrap()
            .instantiate_with_capacity(Some(4))
            .unwrap();
        let live = instance.reflect().unwrap();
        assert_eq!(live.as_chan().unwrap().cap().unwrap(), 4);
        let unbuffered = ty.as_chan().unwrap().instantiate_with_capacity(None).unwrap();
        assert_eq!(unbuffered.elem().cap(), Some(DEFAULT_CHANNEL_CAPACITY));
    }
}
