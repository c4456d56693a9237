use crate::codec::{EthernetHeader, SadpFrame};
use crate::error::Result;
use crate::transport::LinkTransport;
use std::sync::{Arc, RwLock};

/// A decoded SADP frame as handed to listeners.
///
/// Borrows from the capture loop and is only valid during the callback.
pub struct PacketEvent<'a> {
    pub header: &'a EthernetHeader,
    pub frame: &'a SadpFrame,
    /// The captured bytes, link header included.
    pub raw: &'a [u8],
    /// Channel the frame arrived on; listeners may answer through it.
    pub transport: &'a dyn LinkTransport,
}

impl PacketEvent<'_> {
    pub fn query_label(&self) -> &'static str {
        self.frame.query_label()
    }
}

pub trait PacketListener: Send + Sync {
    fn on_packet_received(&self, event: &PacketEvent<'_>) -> Result<()>;
}

impl<F> PacketListener for F
where
    F: Fn(&PacketEvent<'_>) -> Result<()> + Send + Sync,
{
    fn on_packet_received(&self, event: &PacketEvent<'_>) -> Result<()> {
        self(event)
    }
}

/// Ordered set of listeners; registration order is notification order.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn PacketListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Returns false when none was given.
    pub fn add(&self, listener: Option<Arc<dyn PacketListener>>) -> bool {
        match listener {
            Some(listener) => {
                self.write().push(listener);
                true
            }
            None => false,
        }
    }

    /// Remove the first registration of this exact listener instance.
    ///
    /// Matching is by allocation (`Arc::ptr_eq`), so two equal-looking
    /// listeners registered separately are distinct.
    pub fn remove(&self, listener: &Arc<dyn PacketListener>) -> bool {
        let mut listeners = self.write();
        match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current list, so callbacks may (un)register without deadlocking.
    pub fn snapshot(&self) -> Vec<Arc<dyn PacketListener>> {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn PacketListener>>> {
        self.listeners.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn PacketListener>>> {
        self.listeners.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
