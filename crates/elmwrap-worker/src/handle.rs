//! Host-side handle over a running worker.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::sandbox::{OutboundMessage, PortDirection, WorkerInstance};

type Subscriber = Box<dyn FnMut(&Value)>;

struct PortState {
    direction: PortDirection,
    /// Messages emitted before anyone subscribed.
    backlog: VecDeque<Value>,
    subscribers: Vec<Subscriber>,
}

/// A running worker and its named ports.
///
/// Outbound messages are delivered to every subscriber of their port in
/// emission order. Messages emitted before a port's first subscription are
/// kept and handed to that first subscriber when it attaches.
pub struct WorkerHandle {
    module_name: String,
    instance: Box<dyn WorkerInstance>,
    ports: BTreeMap<String, PortState>,
}

impl WorkerHandle {
    /// Wrap a freshly started instance and collect its start-up messages.
    ///
    /// # Errors
    ///
    /// Propagates errors from draining the instance.
    pub fn new(
        module_name: impl Into<String>,
        instance: Box<dyn WorkerInstance>,
    ) -> WorkerResult<Self> {
        let ports = instance
            .ports()
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    PortState {
                        direction: spec.direction,
                        backlog: VecDeque::new(),
                        subscribers: Vec::new(),
                    },
                )
            })
            .collect();
        let mut handle = Self {
            module_name: module_name.into(),
            instance,
            ports,
        };
        handle.pump()?;
        Ok(handle)
    }

    /// The module this worker was instantiated from.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Names of all declared ports, sorted.
    pub fn port_names(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }

    /// Direction of `name`, or `None` if the worker has no such port.
    #[must_use]
    pub fn port_direction(&self, name: &str) -> Option<PortDirection> {
        self.ports.get(name).map(|state| state.direction)
    }

    /// Borrow a port by name.
    ///
    /// # Errors
    ///
    /// [`WorkerError::UnknownPort`] if the worker declared no such port.
    pub fn port(&mut self, name: &str) -> WorkerResult<Port<'_>> {
        if !self.ports.contains_key(name) {
            return Err(WorkerError::UnknownPort { port: name.into() });
        }
        Ok(Port {
            handle: self,
            name: name.to_owned(),
        })
    }

    /// Attach `handler` to the outbound port `port`.
    ///
    /// The first subscriber of a port also receives everything emitted on it
    /// so far.
    ///
    /// # Errors
    ///
    /// [`WorkerError::UnknownPort`], or [`WorkerError::PortDirection`] for an
    /// inbound port.
    pub fn subscribe<F>(&mut self, port: &str, handler: F) -> WorkerResult<()>
    where
        F: FnMut(&Value) + 'static,
    {
        let state = self.state_for(port, PortDirection::Outbound)?;
        let mut handler: Subscriber = Box::new(handler);
        for message in state.backlog.drain(..) {
            handler(&message);
        }
        state.subscribers.push(handler);
        Ok(())
    }

    /// Send `value` to the inbound port `port`.
    ///
    /// Outbound messages the worker emits in response are delivered before
    /// this returns.
    ///
    /// # Errors
    ///
    /// [`WorkerError::UnknownPort`], [`WorkerError::PortDirection`] for an
    /// outbound port, [`WorkerError::Payload`] if `value` does not serialize,
    /// or whatever the worker raised while handling it.
    pub fn send<T>(&mut self, port: &str, value: &T) -> WorkerResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.state_for(port, PortDirection::Inbound)?;
        let payload = serde_json::to_value(value)?;
        trace!(port, "sending to worker");
        self.instance.send(port, &payload)?;
        self.pump()
    }

    fn state_for(&mut self, port: &str, wanted: PortDirection) -> WorkerResult<&mut PortState> {
        let state = self
            .ports
            .get_mut(port)
            .ok_or_else(|| WorkerError::UnknownPort { port: port.into() })?;
        if state.direction != wanted {
            return Err(WorkerError::PortDirection {
                port: port.into(),
                direction: state.direction,
            });
        }
        Ok(state)
    }

    /// Route pending outbound messages to subscribers or backlogs.
    fn pump(&mut self) -> WorkerResult<()> {
        for OutboundMessage { port, payload } in self.instance.drain_outbound()? {
            let Some(state) = self.ports.get_mut(&port) else {
                warn!(port = %port, module = %self.module_name, "dropping message for undeclared port");
                continue;
            };
            if state.subscribers.is_empty() {
                state.backlog.push_back(payload);
            } else {
                for subscriber in &mut state.subscribers {
                    subscriber(&payload);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("module_name", &self.module_name)
            .field("ports", &self.ports.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A named port of a [`WorkerHandle`].
pub struct Port<'a> {
    handle: &'a mut WorkerHandle,
    name: String,
}

impl Port<'_> {
    /// Port name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port direction.
    #[must_use]
    pub fn direction(&self) -> Option<PortDirection> {
        self.handle.port_direction(&self.name)
    }

    /// See [`WorkerHandle::subscribe`].
    ///
    /// # Errors
    ///
    /// [`WorkerError::PortDirection`] for an inbound port.
    pub fn subscribe<F>(&mut self, handler: F) -> WorkerResult<()>
    where
        F: FnMut(&Value) + 'static,
    {
        self.handle.subscribe(&self.name, handler)
    }

    /// See [`WorkerHandle::send`].
    ///
    /// # Errors
    ///
    /// [`WorkerError::PortDirection`] for an outbound port, or any error the
    /// worker raised.
    pub fn send<T>(&mut self, value: &T) -> WorkerResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.handle.send(&self.name, value)
    }
}

impl fmt::Debug for Port<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port").field("name", &self.name).finish()
    }
}
