use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;
use crate::{llm::Transport, message::Message, transcript::{InputField, SharedLog}};

pub struct ChatClient<T> {
    transport: Arc<T>,
    log: SharedLog,
}

/// A submission whose reply has not necessarily arrived yet.
pub struct Exchange {
    handle: JoinHandle<()>,
}

impl Exchange {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the reply (or failure text) has been appended.
    pub fn wait(self) {
        let _ = self.handle.join();
    }
}

impl<T: Transport + 'static> ChatClient<T> {
    pub fn new(transport: T, log: SharedLog) -> Self {
        Self { transport: Arc::new(transport), log }
    }

    pub fn log(&self) -> &SharedLog {
        &self.log
    }

    /// Appends the trimmed input as a user message, clears the input and sends
    /// the prompt on its own thread. Blank input is ignored.
    ///
    /// Overlapping submissions are allowed; replies land in arrival order.
    pub fn submit(&self, input: &mut InputField) -> Option<Exchange> {
        let prompt = input.value().trim().to_string();
        if prompt.is_empty() {
            return None;
        }

        {
            let mut log = self.log.lock();
            log.append(Message::user(prompt.clone()));
            log.scroll_to_latest();
        }
        input.clear();

        let transport = Arc::clone(&self.transport);
        let log = self.log.clone();
        let handle = thread::spawn(move || {
            let outcome = transport.generate(&prompt);
            match &outcome {
                Ok(body) => match body.reply_text() {
                    Some(text) => debug!(chars = text.len(), "reply"),
                    None => debug!(error = ?body.error, "endpoint reported an error"),
                },
                Err(e) => debug!(error = %e, "exchange failed"),
            }
            let mut log = log.lock();
            log.append(Message::from_outcome(outcome));
            log.scroll_to_latest();
        });

        Some(Exchange { handle })
    }
}
