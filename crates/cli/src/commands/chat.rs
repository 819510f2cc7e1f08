//! `palaver chat` — Interactive session on stdin/stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use palaver_core::{ProviderError, Role};
use palaver_session::{SessionError, SessionManager, SubmitOutcome};
use tokio::io::{self, AsyncBufReadExt, BufReader};

const HELP: &str = "\
  /reset                 Clear the conversation (keeps the system prompt)
  /system <text>         Replace the system prompt and clear the conversation
  /file <path>           Submit the contents of a plain-text file
  /set <key> <value>     Change model, temperature, top_p, max_tokens or token_budget
  /history               Show the conversation so far
  /tokens                Show token usage against the budget
  /help                  Show this help
  /exit                  Quit";

/// One line of chat input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Submit(String),
    Reset,
    System(String),
    File(PathBuf),
    Set { key: String, value: String },
    History,
    Tokens,
    Help,
    Exit,
    Empty,
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if matches!(line, "exit" | "quit") {
            return Self::Exit;
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Self::Submit(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "reset" | "clear" => Self::Reset,
            "history" => Self::History,
            "tokens" => Self::Tokens,
            "help" | "?" => Self::Help,
            "exit" | "quit" => Self::Exit,
            "system" if !arg.is_empty() => Self::System(arg.to_string()),
            "system" => Self::Invalid("usage: /system <text>".into()),
            "file" if !arg.is_empty() => Self::File(PathBuf::from(arg)),
            "file" => Self::Invalid("usage: /file <path>".into()),
            "set" => match arg.split_once(char::is_whitespace) {
                Some((key, value)) => Self::Set {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                },
                None => Self::Invalid("usage: /set <key> <value>".into()),
            },
            other => Self::Invalid(format!("unknown command /{other} (try /help)")),
        }
    }
}

/// Apply a `/set key value` to the session.
pub fn apply_setting(session: &mut SessionManager, key: &str, value: &str) -> Result<(), String> {
    let parse_err = |e: &dyn std::fmt::Display| format!("invalid value for {key}: {e}");

    let result = match key {
        "model" => session.set_model(value),
        "temperature" => session.set_temperature(value.parse().map_err(|e| parse_err(&e))?),
        "top_p" => session.set_top_p(value.parse().map_err(|e| parse_err(&e))?),
        "max_tokens" => session.set_max_tokens(value.parse().map_err(|e| parse_err(&e))?),
        "token_budget" => session.set_token_budget(value.parse().map_err(|e| parse_err(&e))?),
        other => {
            return Err(format!(
                "unknown setting '{other}' (model, temperature, top_p, max_tokens, token_budget)"
            ));
        }
    };
    result.map_err(|e| e.to_string())
}

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let mut session = super::build_session(&config)?;

    println!();
    println!("  Palaver — Interactive Mode");
    println!();
    println!("  Provider:  {}", session.provider_name());
    println!("  Model:     {}", session.config().model);
    println!("  Budget:    {} tokens", session.config().token_budget);
    if let Some(classifier) = session.relevance() {
        let languages: Vec<&str> = classifier.languages().collect();
        println!("  Topics:    restricted ({})", languages.join(", "));
    }
    println!();
    println!("  Type your message and press Enter. /help lists commands.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Exit => break,
            ChatCommand::Help => println!("{HELP}\n"),
            ChatCommand::Invalid(msg) => eprintln!("  [Error] {msg}\n"),
            ChatCommand::Reset => {
                session.reset();
                println!("  Conversation cleared.\n");
            }
            ChatCommand::System(prompt) => {
                session.update_system_prompt(prompt);
                println!("  System prompt updated; conversation cleared.\n");
                report_budget_warning(&session);
            }
            ChatCommand::Set { key, value } => match apply_setting(&mut session, &key, &value) {
                Ok(()) => println!("  {key} = {value}\n"),
                Err(e) => eprintln!("  [Error] {e}\n"),
            },
            ChatCommand::History => print_history(&session),
            ChatCommand::Tokens => {
                println!(
                    "  {} / {} tokens across {} messages\n",
                    session.total_tokens(),
                    session.config().token_budget,
                    session.transcript().len()
                );
            }
            ChatCommand::File(path) => match std::fs::read_to_string(&path) {
                Ok(text) => {
                    println!("  Submitting {} ({} bytes)...", path.display(), text.len());
                    let result = session.submit_document(&text).await;
                    print_outcome(&session, result);
                }
                Err(e) => eprintln!("  [Error] Failed to read {}: {e}\n", path.display()),
            },
            ChatCommand::Submit(prompt) => {
                eprint!("  ...");
                let result = session.submit(&prompt).await;
                eprint!("\r     \r");
                print_outcome(&session, result);
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

fn print_outcome(session: &SessionManager, result: Result<SubmitOutcome, SessionError>) {
    match result {
        Ok(outcome) => {
            println!();
            let label = if outcome.is_refused() { "Refused" } else { "Assistant" };
            for line in outcome.text().lines() {
                println!("  {label} > {line}");
            }
            println!();
            if let Some(report) = session.last_budget() {
                if report.evicted > 0 {
                    tracing::debug!(evicted = report.evicted, "Older messages dropped to fit the budget");
                }
            }
        }
        Err(SessionError::Provider(e)) => {
            eprintln!("  [Provider failure] {e}");
            eprintln!("  {}\n", retry_hint(&e));
        }
        Err(e) => eprintln!("  [Error] {e}\n"),
    }
}

/// What to tell the user after a provider failure. The prompt is always kept.
fn retry_hint(error: &ProviderError) -> &'static str {
    if error.is_transient() {
        "Your message was kept; send it again to retry."
    } else {
        "Your message was kept, but retrying will not help until the provider settings are fixed."
    }
}

fn print_history(session: &SessionManager) {
    let history = session.history();
    if history.is_empty() {
        println!("  (no messages yet)\n");
        return;
    }
    for message in history {
        let label = match message.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        let first = message.content.lines().next().unwrap_or_default();
        println!("  [{}] {label}: {first}", message.timestamp.format("%H:%M:%S"));
    }
    println!();
}

fn report_budget_warning(session: &SessionManager) {
    if let Some(report) = session.last_budget() {
        if report.system_prompt_exceeds_budget() {
            eprintln!(
                "  [Warning] The system prompt alone uses {} tokens, over the {} token budget.\n",
                report.total_tokens, report.budget
            );
        }
    }
}
