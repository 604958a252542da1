// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel shared by a session and its doors.

use tokio::sync::broadcast;

use super::DeviceEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of [`DeviceEvent`]s to any number of listeners.
///
/// Each [`DeviceSession`](crate::DeviceSession) owns one bus. Its poll
/// scheduler and door locks hold clones of it, so a single subscription
/// sees lifecycle, availability and lock events of the whole device.
///
/// Publishing never blocks. A listener that falls more than the capacity
/// behind loses the oldest events and gets `RecvError::Lagged` on its next
/// receive.
///
/// # Examples
///
/// ```
/// use hikvision_isapi::event::{DeviceEvent, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DeviceEvent::Initialized {
///     device_id: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
/// });
/// assert!(rx.try_recv().unwrap().is_lifecycle());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to 256 events per listener.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per listener.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Returns how many receivers are listening.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends `event` to every listener. Without listeners it is dropped.
    pub fn publish(&self, event: DeviceEvent) {
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(delivered, "Event published");
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacAddress;

    fn initialized(last: u8) -> DeviceEvent {
        DeviceEvent::Initialized {
            device_id: MacAddress::from_octets([0, 0, 0, 0, 0, last]),
        }
    }

    #[test]
    fn subscriber_count_follows_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx = bus.subscribe();
        let _other = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn every_listener_gets_a_copy() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(initialized(1));

        assert_eq!(first.recv().await.unwrap(), initialized(1));
        assert_eq!(second.recv().await.unwrap(), initialized(1));
    }

    #[test]
    fn publish_without_listeners_is_dropped() {
        let bus = EventBus::new();
        bus.publish(initialized(2));

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn clones_share_one_channel() {
        let bus = EventBus::with_capacity(8);
        let clone = bus.clone();

        let mut rx = bus.subscribe();
        clone.publish(initialized(3));

        assert_eq!(rx.try_recv().unwrap(), initialized(3));
    }

    #[test]
    fn slow_listener_lags() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();

        for last in 0..4 {
            bus.publish(initialized(last));
        }

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(2))
        ));
        assert_eq!(rx.try_recv().unwrap(), initialized(2));
    }
}
