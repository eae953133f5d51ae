use rustyline::{
    Config as RustyConfig, Editor, ExternalPrinter, error::ReadlineError,
    completion::{Completer, Pair},
    hint::{Hinter, HistoryHinter},
    highlight::{Highlighter, MatchingBracketHighlighter, CmdKind},
    validate::Validator,
    Helper, history::MemHistory
};
use colored::Colorize;
use crate::{
    chat::{ChatClient, Exchange},
    config::Config,
    llm::HttpTransport,
    render::{format_message, Labels, OutputRoute, PlainView, TerminalView},
    transcript::{InputField, MessageLog},
};

const SLASH_COMMANDS: [&str; 3] = ["/exit", "/help", "/log"];

struct ParleyHelper {
    hinter: HistoryHinter,
    bracket_highlighter: MatchingBracketHighlighter,
}

impl Helper for ParleyHelper {}

impl Completer for ParleyHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only a lone leading word can be a command
        let word = &line[..pos];
        if !word.starts_with('/') || word.contains(' ') {
            return Ok((pos, Vec::new()));
        }
        let candidates = SLASH_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(word))
            .map(|cmd| Pair { display: cmd.to_string(), replacement: cmd.to_string() })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ParleyHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ParleyHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> std::borrow::Cow<'h, str> {
        std::borrow::Cow::Owned(hint.truecolor(128, 128, 128).to_string())
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        self.bracket_highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: CmdKind) -> bool {
        self.bracket_highlighter.highlight_char(line, pos, forced)
    }
}

impl Validator for ParleyHelper {}

fn print_banner(config: &Config) {
    println!(
        "{}",
        format!(
            "{}\n{}\n{}\nv{}",
            " ._  _. ._ |  _    ",
            " |_)(_| |  | (/_\\/ ",
            " |              /  ",
            env!("CARGO_PKG_VERSION")
        )
        .blue()
    );
    println!("{}", format!("Endpoint: {}", config.endpoint).truecolor(128, 128, 128));
    println!("{}", "Type /help for commands.".truecolor(128, 128, 128));
}

fn print_log(labels: &Labels, log: &MessageLog, pending: usize) {
    if pending > 0 {
        println!("{}", format!("{} repl{} still pending.", pending, if pending == 1 { "y" } else { "ies" }).truecolor(128, 128, 128));
    }
    if log.is_empty() {
        println!("{}", "No messages yet.".truecolor(128, 128, 128));
        return;
    }
    println!("{}", "--- Transcript ---".yellow());
    for (i, message) in log.messages().iter().enumerate() {
        println!("{}[{}] {}", "--- ".yellow(), i + 1, format_message(labels, message));
    }
    println!("{}", "--- End of Transcript ---".yellow());
}

/// Builds the transcript on the line editor's printer, or on plain stdout when
/// there is no terminal to share. The flag tells whether the session is interactive.
fn open_log<P: ExternalPrinter + Send + 'static>(
    printer: rustyline::Result<P>,
    route: &OutputRoute,
    labels: &Labels,
) -> (MessageLog, bool) {
    match printer {
        Ok(printer) => {
            route.attach(printer);
            (MessageLog::with_view(TerminalView::new(route.clone(), labels.clone())), true)
        }
        Err(e) => {
            tracing::debug!(error = %e, "no terminal, printing transcript to stdout");
            (MessageLog::with_view(PlainView::new(std::io::stdout(), labels.clone())), false)
        }
    }
}

pub fn run_cli(config: Config, route: OutputRoute) -> Result<(), Box<dyn std::error::Error>> {
    let rusty_config = RustyConfig::builder()
        .completion_type(rustyline::CompletionType::List)
        .build();

    let mut rl: Editor<ParleyHelper, MemHistory> = Editor::with_history(rusty_config, MemHistory::new())?;
    rl.set_helper(Some(ParleyHelper {
        hinter: HistoryHinter {},
        bracket_highlighter: MatchingBracketHighlighter::new(),
    }));

    let labels = Labels::from(&config);
    let (log, interactive) = open_log(rl.create_external_printer(), &route, &labels);
    let chat = ChatClient::new(HttpTransport::new(&config)?, log.into_shared());

    print_banner(&config);

    let prompt = "parley> ".green().to_string();
    let mut pending: Vec<Exchange> = Vec::new();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                pending.retain(|exchange| !exchange.is_finished());
                let mut input = InputField::new(line);
                let entry = input.value().trim().to_string();
                match entry.as_str() {
                    "/exit" => break,
                    "/help" => println!(
                        "{}",
                        "Type a message and press Enter to send it.\n\
                        Replies appear above the prompt as they arrive.\n\
                        \n\
                        Available commands:\n\
                        - /log: Show the transcript so far\n\
                        - /help: Show this help message\n\
                        - /exit: Exit the program (Ctrl-D also works)\n"
                            .blue()
                    ),
                    "/log" => print_log(&labels, &chat.log().lock(), pending.len()),
                    _ => {
                        if let Some(exchange) = chat.submit(&mut input) {
                            rl.add_history_entry(entry.as_str())?;
                            pending.push(exchange);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(Box::new(e)),
        }
    }
    if interactive {
        if !pending.is_empty() {
            tracing::debug!(pending = pending.len(), "exiting with replies outstanding");
        }
    } else {
        // piped input ends before the replies arrive; let them print
        pending.into_iter().for_each(Exchange::wait);
    }
    Ok(())
}
