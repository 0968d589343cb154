//! Change notifications from the engine to interested views.
//!
//! Views subscribe explicitly and hold the returned [`Subscription`] for as
//! long as they want to hear about changes. Dropping it unsubscribes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, Weak};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Insert,
    Update,
    Delete,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Path of the changed data, e.g. `["clips", "<id>"]`.
    pub key: Vec<String>,
    pub values: Value,
}

impl UpdateAction {
    pub fn update(key: Vec<String>, values: Value) -> Self {
        Self {
            action_type: ActionType::Update,
            key,
            values,
        }
    }

    /// Whether the first path segment is one of `roots`.
    pub fn targets(&self, roots: &[&str]) -> bool {
        self.key.first().is_some_and(|k| roots.contains(&k.as_str()))
    }
}

type Subscribers = Mutex<HashMap<Uuid, Sender<UpdateAction>>>;

#[derive(Clone, Default)]
pub struct UpdateHub {
    subscribers: Arc<Subscribers>,
}

impl UpdateHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let id = Uuid::new_v4();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(id, sender);
        }
        Subscription {
            id,
            hub: Arc::downgrade(&self.subscribers),
            receiver,
        }
    }

    /// Delivers `action` to every live subscriber.
    pub fn publish(&self, action: UpdateAction) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            log::error!("Update hub lock poisoned, dropping {:?}", action.key);
            return;
        };
        subscribers.retain(|_, sender| sender.send(action.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

pub struct Subscription {
    id: Uuid,
    hub: Weak<Subscribers>,
    receiver: Receiver<UpdateAction>,
}

impl Subscription {
    /// Takes every action delivered since the last call.
    pub fn drain(&self) -> Vec<UpdateAction> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.hub.upgrade() {
            if let Ok(mut subscribers) = subscribers.lock() {
                subscribers.remove(&self.id);
            }
        }
    }
}
