//! Channel objects
//!
//! A thread-safe, blocking channel built on parking_lot. Buffered channels
//! (capacity > 0) hold up to `capacity` values. Unbuffered channels hand
//! values over directly: a send completes once a receiver has taken the
//! value, and the non-blocking variants only succeed when a partner is
//! already waiting.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use tracing::trace;

use crate::value::Value;

/// Channel operation errors
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel is closed (and drained, for receives)
    #[error("channel is closed")]
    Closed,

    /// The operation would have to wait for a partner
    #[error("channel operation would block")]
    WouldBlock,
}

/// Channel shared between value handles
pub struct ChannelObject {
    /// Internal state protected by a mutex
    inner: Mutex<ChannelInner>,
    /// Senders waiting for space or for their value to be taken
    not_full: Condvar,
    /// Receivers waiting for a value
    not_empty: Condvar,
}

struct ChannelInner {
    /// Buffer capacity (0 = unbuffered)
    capacity: usize,
    /// Values in flight
    queue: VecDeque<Value>,
    closed: bool,
    /// Receivers blocked in `receive`
    receivers_waiting: usize,
    /// Values ever pushed; doubles as the ticket of the latest send
    sent: u64,
    /// Values ever popped
    taken: u64,
}

impl ChannelInner {
    fn push(&mut self, value: Value) -> u64 {
        self.queue.push_back(value);
        self.sent += 1;
        self.sent
    }

    fn pop(&mut self) -> Option<Value> {
        let value = self.queue.pop_front()?;
        self.taken += 1;
        Some(value)
    }
}

impl std::fmt::Debug for ChannelObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ChannelObject")
            .field("capacity", &inner.capacity)
            .field("length", &inner.queue.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl ChannelObject {
    /// Create a new channel with given buffer capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ChannelInner {
                capacity,
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                receivers_waiting: 0,
                sent: 0,
                taken: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Buffer capacity
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Number of buffered values
    pub fn length(&self) -> usize {
        let inner = self.inner.lock();
        inner.queue.len().min(inner.capacity)
    }

    /// Check if channel is closed
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Close the channel and wake every waiter
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Send without blocking
    pub fn try_send(&self, value: Value) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(ChannelError::Closed);
        }
        let ready = if inner.capacity > 0 {
            inner.queue.len() < inner.capacity
        } else {
            inner.receivers_waiting > inner.queue.len()
        };
        if !ready {
            return Err(ChannelError::WouldBlock);
        }
        inner.push(value);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Receive without blocking
    pub fn try_receive(&self) -> Result<Value, ChannelError> {
        let mut inner = self.inner.lock();
        match inner.pop() {
            Some(value) => {
                self.not_full.notify_all();
                Ok(value)
            }
            None if inner.closed => Err(ChannelError::Closed),
            None => Err(ChannelError::WouldBlock),
        }
    }

    /// Send a value, blocking until space is available or, when unbuffered,
    /// until a receiver has taken it
    pub fn send(&self, value: Value) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock();
        if inner.capacity == 0 {
            if inner.closed {
                return Err(ChannelError::Closed);
            }
            let ticket = inner.push(value);
            self.not_empty.notify_one();
            while inner.taken < ticket {
                if inner.closed {
                    return Err(ChannelError::Closed);
                }
                trace!(ticket, "unbuffered send waiting for receiver");
                self.not_full.wait(&mut inner);
            }
            return Ok(());
        }
        loop {
            if inner.closed {
                return Err(ChannelError::Closed);
            }
            if inner.queue.len() < inner.capacity {
                inner.push(value);
                self.not_empty.notify_one();
                return Ok(());
            }
            trace!(capacity = inner.capacity, "send waiting for space");
            self.not_full.wait(&mut inner);
        }
    }

    /// Receive a value, blocking until one is available
    ///
    /// Fails once the channel is closed and drained.
    pub fn receive(&self) -> Result<Value, ChannelError> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(value) = inner.pop() {
                self.not_full.notify_all();
                return Ok(value);
            }
            if inner.closed {
                return Err(ChannelError::Closed);
            }
            inner.receivers_waiting += 1;
            trace!("receive waiting for value");
            self.not_empty.wait(&mut inner);
            inner.receivers_waiting -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_buffered_send_receive() {
        let chan = ChannelObject::new(2);
        chan.try_send(Value::int(1)).unwrap();
        chan.send(Value::int(2)).unwrap();
        assert_eq!(chan.try_send(Value::int(3)), Err(ChannelError::WouldBlock));
        assert_eq!(chan.length(), 2);
        assert_eq!(chan.receive().unwrap().as_int(), Some(1));
        assert_eq!(chan.try_receive().unwrap().as_int(), Some(2));
        assert_eq!(chan.try_receive().unwrap_err(), ChannelError::WouldBlock);
    }

    #[test]
    fn test_closed_channel() {
        let chan = ChannelObject::new(1);
        chan.send(Value::int(1)).unwrap();
        chan.close();
        assert_eq!(chan.send(Value::int(2)), Err(ChannelError::Closed));
        assert_eq!(chan.receive().unwrap().as_int(), Some(1));
        assert_eq!(chan.receive().unwrap_err(), ChannelError::Closed);
    }

    #[test]
    fn test_unbuffered_try_send_without_receiver() {
        let chan = ChannelObject::new(0);
        assert_eq!(chan.try_send(Value::int(1)), Err(ChannelError::WouldBlock));
        assert_eq!(chan.length(), 0);
    }

    #[test]
    fn test_unbuffered_rendezvous() {
        let chan = Arc::new(ChannelObject::new(0));
        let sender = {
            let chan = chan.clone();
            thread::spawn(move || chan.send(Value::string("hello")))
        };
        let value = loop {
            match chan.try_receive() {
                Ok(value) => break value,
                Err(ChannelError::WouldBlock) => thread::sleep(Duration::from_millis(1)),
                Err(err) => panic!("unexpected {err}"),
            }
        };
        assert_eq!(value.as_str(), Some("hello"));
        sender.join().unwrap().unwrap();
    }

    #[test]
    fn test_unbuffered_try_send_to_waiting_receiver() {
        let chan = Arc::new(ChannelObject::new(0));
        let receiver = {
            let chan = chan.clone();
            thread::spawn(move || chan.receive())
        };
        loop {
            match chan.try_send(Value::int(9)) {
                Ok(()) => break,
                Err(ChannelError::WouldBlock) => thread::sleep(Duration::from_millis(1)),
                Err(err) => panic!("unexpected {err}"),
            }
        }
        assert_eq!(receiver.join().unwrap().unwrap().as_int(), Some(9));
    }
}
