/*
 *  registry.rs
 *
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 *
 *  Channel registry - name to handler mapping with exclusive ownership
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use log::{debug, info, warn};

use crate::error::ChannelError;
use crate::handler::MethodTable;

type ChannelMap = Mutex<HashMap<String, Arc<MethodTable>>>;

/// Channel registry: maps a channel name to at most one handler table.
///
/// Registration, unregistration and by-name lookup are serialized by a
/// single lock; registration churn is expected to be low (once per
/// plugin at startup). Dispatch against an already-held [`Channel`]
/// handle does not take the lock.
#[derive(Default)]
pub struct Messenger {
    channels: Arc<ChannelMap>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under `name`.
    ///
    /// Fails with [`ChannelError::DuplicateChannel`] if the name is
    /// taken on this messenger. The returned [`Channel`] exclusively
    /// owns the handler; dropping it (or calling
    /// [`Messenger::unregister`]) frees the name for reuse.
    pub fn register(
        &self,
        name: impl Into<String>,
        table: MethodTable,
    ) -> Result<Channel, ChannelError> {
        let name = name.into();
        let table = Arc::new(table);

        let mut channels = lock(&self.channels);
        if channels.contains_key(&name) {
            warn!("rejecting duplicate registration for channel '{}'", name);
            return Err(ChannelError::DuplicateChannel(name));
        }

        info!(
            "registered channel '{}' ({} method{})",
            name,
            table.len(),
            if table.len() == 1 { "" } else { "s" }
        );
        channels.insert(name.clone(), Arc::clone(&table));

        Ok(Channel {
            name,
            table,
            registry: Arc::downgrade(&self.channels),
        })
    }

    /// Explicit counterpart to `register`; equivalent to dropping the
    /// channel handle.
    pub fn unregister(&self, channel: Channel) {
        drop(channel);
    }

    /// Looks up the handler table currently registered under `name`.
    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<MethodTable>> {
        lock(&self.channels).get(name).cloned()
    }

    /// Whether `name` is currently registered.
    pub fn is_registered(&self, name: &str) -> bool {
        lock(&self.channels).contains_key(name)
    }
}

fn lock(channels: &ChannelMap) -> std::sync::MutexGuard<'_, HashMap<String, Arc<MethodTable>>> {
    // A poisoned registry lock only means another thread panicked while
    // holding it; the map itself stays consistent.
    channels.lock().unwrap_or_else(|e| e.into_inner())
}

/// A live registration. Owns its handler table; the name becomes
/// available again when this handle is dropped.
pub struct Channel {
    name: String,
    table: Arc<MethodTable>,
    registry: Weak<ChannelMap>,
}

impl Channel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn table(&self) -> &MethodTable {
        &self.table
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        let Some(channels) = self.registry.upgrade() else {
            return;
        };
        let mut channels = lock(&channels);
        // Only remove our own registration: the name may have been
        // re-registered if unregister raced a replacement.
        if let Some(current) = channels.get(&self.name) {
            if Arc::ptr_eq(current, &self.table) {
                channels.remove(&self.name);
                debug!("unregistered channel '{}'", self.name);
            }
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_duplicate_name_rejected() {
        let messenger = Messenger::new();
        let _a = messenger.register("lot_gpiod", MethodTable::new()).unwrap();
        let err = messenger.register("lot_gpiod", MethodTable::new()).unwrap_err();
        assert!(matches!(err, ChannelError::DuplicateChannel(n) if n == "lot_gpiod"));
    }

    #[test]
    fn test_unregister_frees_name() {
        let messenger = Messenger::new();
        let a = messenger.register("lot_gpiod", MethodTable::new()).unwrap();
        assert!(messenger.is_registered("lot_gpiod"));

        messenger.unregister(a);
        assert!(!messenger.is_registered("lot_gpiod"));

        // Name reusable after explicit unregister.
        let _b = messenger.register("lot_gpiod", MethodTable::new()).unwrap();
    }

    #[test]
    fn test_drop_unregisters() {
        let messenger = Messenger::new();
        {
            let _c = messenger.register("scoped", MethodTable::new()).unwrap();
            assert!(messenger.is_registered("scoped"));
        }
        assert!(!messenger.is_registered("scoped"));
    }

    #[test]
    fn test_lookup_reflects_registration() {
        let messenger = Messenger::new();
        assert!(messenger.lookup("lot_gpiod").is_none());

        let table = MethodTable::new().method("ping", |_| Ok(Value::from("pong")));
        let _c = messenger.register("lot_gpiod", table).unwrap();

        let found = messenger.lookup("lot_gpiod").unwrap();
        assert!(found.supports("ping"));
    }

    #[test]
    fn test_channel_outlives_messenger() {
        let c = {
            let messenger = Messenger::new();
            messenger.register("orphan", MethodTable::new()).unwrap()
        };
        // Messenger is gone; dropping the channel must not panic.
        assert_eq!(c.name(), "orphan");
        drop(c);
    }
}
