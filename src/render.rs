use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use colored::Colorize;
use rustyline::ExternalPrinter;
use tracing_subscriber::fmt::MakeWriter;
use crate::{config::Config, message::{Message, Sender}, transcript::LogView};

#[derive(Clone)]
pub struct Labels {
    pub user: String,
    pub assistant: String,
}

impl From<&Config> for Labels {
    fn from(config: &Config) -> Self {
        Self { user: config.user_label.clone(), assistant: config.assistant_label.clone() }
    }
}

pub fn format_message(labels: &Labels, message: &Message) -> String {
    match message.sender {
        Sender::User => format!("{} {}", format!("{}:", labels.user).green().bold(), message.text),
        Sender::Assistant if message.is_error => {
            format!("{} {}", format!("{}:", labels.assistant).yellow().bold(), message.text.red())
        }
        Sender::Assistant => format!("{} {}", format!("{}:", labels.assistant).yellow().bold(), message.text.yellow()),
    }
}

type BoxedPrinter = Box<dyn ExternalPrinter + Send>;

/// Shared path to the terminal for transcript entries and log lines.
///
/// Once the line editor's external printer is attached, everything goes
/// through it so output never lands inside the line being edited. Until
/// then log lines fall back to stderr.
#[derive(Clone, Default)]
pub struct OutputRoute(Arc<Mutex<Option<BoxedPrinter>>>);

impl OutputRoute {
    pub fn attach(&self, printer: impl ExternalPrinter + Send + 'static) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(printer));
    }

    /// Prints through the attached printer; hands `text` back when there is none.
    fn try_print(&self, text: String) -> Result<(), String> {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            // outside of readline the printer writes straight through without adding a newline
            Some(printer) => {
                let line = if text.ends_with('\n') { text } else { text + "\n" };
                if let Err(e) = printer.print(line) {
                    // not through tracing: a log line would come straight back here
                    eprintln!("failed to print: {}", e);
                }
                Ok(())
            }
            None => Err(text),
        }
    }
}

/// One formatted log event, flushed as a whole when tracing drops it.
pub struct RoutedLine {
    route: OutputRoute,
    buf: Vec<u8>,
}

impl Write for RoutedLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RoutedLine {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&std::mem::take(&mut self.buf)).into_owned();
        if let Err(text) = self.route.try_print(text) {
            let _ = io::stderr().write_all(text.as_bytes());
        }
    }
}

impl<'a> MakeWriter<'a> for OutputRoute {
    type Writer = RoutedLine;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedLine { route: self.clone(), buf: Vec::new() }
    }
}

/// Prints transcript entries above the prompt without clobbering the line being edited.
pub struct TerminalView {
    route: OutputRoute,
    labels: Labels,
}

impl TerminalView {
    pub fn new(route: OutputRoute, labels: Labels) -> Self {
        Self { route, labels }
    }
}

impl LogView for TerminalView {
    fn show(&mut self, message: &Message) {
        if let Err(text) = self.route.try_print(format_message(&self.labels, message)) {
            println!("{}", text);
        }
    }
    // the terminal follows its own output
}

/// Used when stdin/stdout is not a terminal and there is no line editor to share with.
pub struct PlainView<W> {
    out: W,
    labels: Labels,
}

impl<W: Write + Send> PlainView<W> {
    pub fn new(out: W, labels: Labels) -> Self {
        Self { out, labels }
    }
}

impl<W: Write + Send> LogView for PlainView<W> {
    fn show(&mut self, message: &Message) {
        let line = format_message(&self.labels, message);
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "failed to print message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn labels() -> Labels {
        Labels { user: "You".into(), assistant: "AI".into() }
    }

    struct ChannelPrinter(mpsc::Sender<String>);

    impl ExternalPrinter for ChannelPrinter {
        fn print(&mut self, msg: String) -> rustyline::Result<()> {
            self.0.send(msg).unwrap();
            Ok(())
        }
    }

    #[test]
    fn entries_carry_sender_label() {
        colored::control::set_override(false);
        assert_eq!(format_message(&labels(), &Message::user("hi")), "You: hi");
        assert_eq!(format_message(&labels(), &Message::assistant("hello")), "AI: hello");
    }

    #[test]
    fn plain_view_writes_one_line_per_entry() {
        colored::control::set_override(false);
        let mut view = PlainView::new(Vec::new(), labels());
        view.show(&Message::user("hi"));
        view.show(&Message::assistant("hello"));
        assert_eq!(String::from_utf8(view.out).unwrap(), "You: hi\nAI: hello\n");
    }

    #[test]
    fn log_lines_go_through_the_attached_printer() {
        let (tx, rx) = mpsc::channel();
        let route = OutputRoute::default();
        route.attach(ChannelPrinter(tx));

        let mut line = route.make_writer();
        write!(line, "DEBUG reply ").unwrap();
        writeln!(line, "chars=5").unwrap();
        drop(line);

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), ["DEBUG reply chars=5\n"]);
    }

    #[test]
    fn terminal_view_shares_the_printer() {
        colored::control::set_override(false);
        let (tx, rx) = mpsc::channel();
        let route = OutputRoute::default();
        route.attach(ChannelPrinter(tx));

        let mut view = TerminalView::new(route, labels());
        view.show(&Message::assistant("hello"));
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), ["AI: hello\n"]);
    }
}
