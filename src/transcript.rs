use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::message::Message;

/// Where appended messages become visible.
pub trait LogView: Send {
    fn show(&mut self, message: &Message);
    /// Scrolls the view to the end of the first `index` entries.
    fn scroll_to(&mut self, _index: usize) {}
}

/// Append-only transcript plus the position of its view.
#[derive(Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    scroll: usize,
    view: Option<Box<dyn LogView>>,
}

impl MessageLog {
    pub fn with_view(view: impl LogView + 'static) -> Self {
        Self { view: Some(Box::new(view)), ..Self::default() }
    }

    pub fn append(&mut self, message: Message) {
        if let Some(view) = self.view.as_mut() {
            view.show(&message);
        }
        self.messages.push(message);
    }

    pub fn scroll_to_latest(&mut self) {
        self.scroll = self.messages.len();
        if let Some(view) = self.view.as_mut() {
            view.scroll_to(self.scroll);
        }
    }

    #[cfg(test)]
    pub fn is_scrolled_to_latest(&self) -> bool {
        self.scroll == self.messages.len()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_shared(self) -> SharedLog {
        SharedLog(Arc::new(Mutex::new(self)))
    }
}

/// Handle to the log that exchange threads append replies through.
#[derive(Clone)]
pub struct SharedLog(Arc<Mutex<MessageLog>>);

impl SharedLog {
    pub fn lock(&self) -> MutexGuard<'_, MessageLog> {
        // appends never leave the log half-written, so a poisoned lock is still usable
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The text the user is composing.
#[derive(Default, Debug)]
pub struct InputField {
    value: String,
}

impl InputField {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct Recorder(mpsc::Sender<String>);

    impl LogView for Recorder {
        fn show(&mut self, message: &Message) {
            self.0.send(message.text.clone()).unwrap();
        }
        fn scroll_to(&mut self, index: usize) {
            self.0.send(format!("<scroll {index}>")).unwrap();
        }
    }

    #[test]
    fn appends_in_order_and_notifies_view() {
        let (tx, rx) = mpsc::channel();
        let mut log = MessageLog::with_view(Recorder(tx));
        log.append(Message::user("one"));
        log.scroll_to_latest();
        log.append(Message::assistant("two"));

        assert_eq!(log.messages(), &[Message::user("one"), Message::assistant("two")]);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), ["one", "<scroll 1>", "two"]);
    }

    #[test]
    fn scroll_tracks_the_newest_entry() {
        let mut log = MessageLog::default();
        assert!(log.is_scrolled_to_latest());
        log.append(Message::user("hi"));
        assert!(!log.is_scrolled_to_latest());
        log.scroll_to_latest();
        assert!(log.is_scrolled_to_latest());
    }
}
