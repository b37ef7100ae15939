//! Chat feed, optionally scoped to one room.

use std::collections::HashMap;
use std::sync::Arc;

use playhub_shared::{ChatMessage, ChatRoomUpdate, ChatUserStatus, EventKind, RealtimeEvent};
use tokio::sync::watch;

use crate::infrastructure::messaging::{SubscriptionRegistry, SubscriptionSet};

use super::{subscribe_all, unexpected};

const OWNER: &str = "chat";
const OFFLINE: &str = "offline";
const KINDS: [EventKind; 4] = [
    EventKind::ChatNewMessage,
    EventKind::ChatPrivateMessage,
    EventKind::ChatUserStatus,
    EventKind::ChatRoomUpdated,
];

struct ChatState {
    room_id: Option<String>,
    new_message: watch::Sender<Option<ChatMessage>>,
    private_message: watch::Sender<Option<ChatMessage>>,
    room_update: watch::Sender<Option<ChatRoomUpdate>>,
    presence: watch::Sender<HashMap<String, String>>,
}

impl ChatState {
    /// Room-scoped events pass when no room is selected or the ids match.
    fn in_scope(&self, room_id: Option<&str>) -> bool {
        match &self.room_id {
            None => true,
            Some(selected) => room_id == Some(selected.as_str()),
        }
    }

    fn handle(&self, event: &RealtimeEvent) -> anyhow::Result<()> {
        match event {
            RealtimeEvent::ChatNewMessage(message) => {
                if self.in_scope(message.room_id.as_deref()) {
                    self.new_message.send_replace(Some(message.clone()));
                }
            }
            RealtimeEvent::ChatPrivateMessage(message) => {
                self.private_message.send_replace(Some(message.clone()));
            }
            RealtimeEvent::ChatRoomUpdated(update) => {
                if self.in_scope(update.room_id.as_deref()) {
                    self.room_update.send_replace(Some(update.clone()));
                }
            }
            RealtimeEvent::ChatUserStatus(ChatUserStatus {
                username: Some(username),
                status: Some(status),
                ..
            }) => {
                self.presence.send_modify(|presence| {
                    if status == OFFLINE {
                        presence.remove(username);
                    } else {
                        presence.insert(username.clone(), status.clone());
                    }
                });
            }
            RealtimeEvent::ChatUserStatus(_) => {
                tracing::debug!("User status without username or status");
            }
            other => return Err(unexpected(OWNER, other)),
        }
        Ok(())
    }
}

/// Latest chat activity for the chat page.
pub struct ChatFeed {
    state: Arc<ChatState>,
    subscriptions: SubscriptionSet,
}

impl ChatFeed {
    /// Follow chat events; with `room_id`, messages and room updates of
    /// other rooms are ignored.
    pub fn activate(registry: &SubscriptionRegistry, room_id: Option<String>) -> Self {
        let state = Arc::new(ChatState {
            room_id,
            new_message: watch::channel(None).0,
            private_message: watch::channel(None).0,
            room_update: watch::channel(None).0,
            presence: watch::channel(HashMap::new()).0,
        });

        let handler_state = Arc::clone(&state);
        let subscriptions = subscribe_all(registry, OWNER, &KINDS, move |event| {
            handler_state.handle(event)
        });

        Self {
            state,
            subscriptions,
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        self.state.room_id.as_deref()
    }

    pub fn new_message(&self) -> Option<ChatMessage> {
        self.state.new_message.borrow().clone()
    }

    pub fn watch_new_message(&self) -> watch::Receiver<Option<ChatMessage>> {
        self.state.new_message.subscribe()
    }

    pub fn private_message(&self) -> Option<ChatMessage> {
        self.state.private_message.borrow().clone()
    }

    pub fn room_update(&self) -> Option<ChatRoomUpdate> {
        self.state.room_update.borrow().clone()
    }

    /// Last reported status of `username` ("online", "away", ...).
    ///
    /// Users reported offline are dropped from the presence map, so `None`
    /// means offline or never seen.
    pub fn user_status(&self, username: &str) -> Option<String> {
        self.state.presence.borrow().get(username).cloned()
    }

    pub fn watch_presence(&self) -> watch::Receiver<HashMap<String, String>> {
        self.state.presence.subscribe()
    }

    pub fn deactivate(&mut self) {
        self.subscriptions.unsubscribe_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playhub_shared::Envelope;

    fn dispatch(registry: &SubscriptionRegistry, frame: &str) {
        registry.dispatch(&Envelope::parse(frame).unwrap());
    }

    #[test]
    fn unscoped_feed_sees_every_room() {
        let registry = SubscriptionRegistry::new();
        let feed = ChatFeed::activate(&registry, None);

        dispatch(
            &registry,
            r#"{"type":"chat.new_message","data":{"room_id":3,"sender":"lan","content":"hi"}}"#,
        );

        let message = feed.new_message().unwrap();
        assert_eq!(message.room_id.as_deref(), Some("3"));
        assert_eq!(message.content.as_deref(), Some("hi"));
    }

    #[test]
    fn scoped_feed_filters_other_rooms() {
        let registry = SubscriptionRegistry::new();
        let feed = ChatFeed::activate(&registry, Some("3".to_string()));

        dispatch(
            &registry,
            r#"{"type":"chat.new_message","data":{"room_id":4,"content":"elsewhere"}}"#,
        );
        dispatch(
            &registry,
            r#"{"type":"chat.room_updated","data":{"room_id":4,"name":"other"}}"#,
        );
        assert!(feed.new_message().is_none());
        assert!(feed.room_update().is_none());

        dispatch(
            &registry,
            r#"{"type":"chat.room_updated","data":{"room_id":"3","name":"ours"}}"#,
        );
        let update = feed.room_update().unwrap();
        assert_eq!(update.extra["name"], "ours");
    }

    #[test]
    fn private_messages_and_presence() {
        let registry = SubscriptionRegistry::new();
        let feed = ChatFeed::activate(&registry, Some("3".to_string()));

        dispatch(
            &registry,
            r#"{"type":"chat.private_message","data":{"sender":"minh","content":"psst"}}"#,
        );
        dispatch(
            &registry,
            r#"{"type":"chat.user_status","data":{"username":"minh","status":"online"}}"#,
        );

        assert_eq!(
            feed.private_message().and_then(|m| m.sender),
            Some("minh".to_string())
        );
        assert_eq!(feed.user_status("minh").as_deref(), Some("online"));
        assert_eq!(feed.user_status("nobody"), None);
    }

    #[test]
    fn offline_users_leave_the_presence_map() {
        let registry = SubscriptionRegistry::new();
        let feed = ChatFeed::activate(&registry, None);

        for user in ["an", "binh", "chi"] {
            dispatch(
                &registry,
                &format!(r#"{{"type":"chat.user_status","data":{{"username":"{user}","status":"online"}}}}"#),
            );
        }
        dispatch(
            &registry,
            r#"{"type":"chat.user_status","data":{"username":"binh","status":"offline"}}"#,
        );

        assert_eq!(feed.user_status("binh"), None);
        assert_eq!(feed.watch_presence().borrow().len(), 2);
    }
}
