//! Interactive chat loop.

use crate::upload::load_upload;
use dialoguer::Password;
use doc_chat_core::context::estimate_tokens;
use doc_chat_core::{ApiKey, ChatGateway, Document, DocumentBody, Error, Role, Session};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Characters of context shown by `/context`.
pub const PREVIEW_CHARS: usize = 1000;

const HELP: &str = "\
Commands:
  /upload <path>  load a .txt, .md or .pptx document
  /context        preview the context sent with each message
  /history        show the conversation so far
  /key            enter an API key (hidden input, verified before use)
  /clear          drop the document and the conversation
  /reset          reset the session: drop the document and the conversation, keep the API key
  /help           show this help
  /quit           exit
Anything else is sent as a chat message.";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Key,
    Context,
    History,
    Clear,
    Reset,
    Help,
    Quit,
    Chat(String),
    Empty,
    /// Unknown command or bad arguments, with the message to show.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Chat(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "upload" if arg.is_empty() => Command::Invalid("usage: /upload <path>".to_string()),
            "upload" => Command::Upload(PathBuf::from(arg)),
            "key" => Command::Key,
            "context" => Command::Context,
            "history" => Command::History,
            "clear" => Command::Clear,
            "reset" => Command::Reset,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Invalid(format!("unknown command /{} (try /help)", other)),
        }
    }
}

/// Where `/key` reads a key from.
pub trait KeyPrompt {
    fn read_key(&mut self) -> io::Result<String>;
}

/// Hidden terminal input.
#[derive(Debug, Default)]
pub struct PasswordPrompt;

impl KeyPrompt for PasswordPrompt {
    fn read_key(&mut self) -> io::Result<String> {
        Password::new()
            .with_prompt("OpenAI API key")
            .allow_empty_password(true)
            .interact()
            .map_err(io::Error::other)
    }
}

/// Read lines from `input` until EOF or `/quit`.
pub fn run<G, P, R, W>(
    session: &mut Session,
    gateway: &G,
    prompt: &mut P,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    G: ChatGateway + ?Sized,
    P: KeyPrompt + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "you> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };

        match Command::parse(&line?) {
            Command::Quit => break,
            Command::Empty => {}
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Invalid(message) => writeln!(out, "error: {}", message)?,
            Command::Upload(path) => upload(session, &path, out)?,
            Command::Key => match ApiKey::new(prompt.read_key()?) {
                Some(key) => {
                    install_key(session, gateway, key, out)?;
                }
                None => writeln!(out, "No key entered; nothing changed.")?,
            },
            Command::Context => show_context(session, out)?,
            Command::History => show_history(session, out)?,
            Command::Clear => {
                session.clear_document();
                writeln!(out, "Document and conversation cleared.")?;
            }
            Command::Reset => {
                session.reset();
                writeln!(out, "Session reset: document and conversation dropped, API key kept.")?;
            }
            Command::Chat(text) => chat(session, gateway, &text, out)?,
        }
    }

    Ok(())
}

/// Verify `key` and make it the session credential.
///
/// A key the provider rejects is never installed, so chat stays blocked
/// (or keeps using the previous key). Any other verification failure is
/// reported and the key is used anyway.
pub fn install_key<G, W>(
    session: &mut Session,
    gateway: &G,
    key: ApiKey,
    out: &mut W,
) -> io::Result<bool>
where
    G: ChatGateway + ?Sized,
    W: Write,
{
    match gateway.verify(&key) {
        Ok(()) => writeln!(out, "API key verified.")?,
        Err(e @ Error::Auth(_)) => {
            writeln!(out, "error: {}", e)?;
            let fallback = if session.credential().is_some() {
                "The previous key is still in use."
            } else {
                "Chat is disabled until a valid key is entered with /key."
            };
            writeln!(out, "{}", fallback)?;
            return Ok(false);
        }
        Err(e) => writeln!(out, "warning: could not verify API key: {}", e)?,
    }
    session.set_credential(Some(key));
    Ok(true)
}

/// Load a file into the session and report what was extracted.
///
/// On failure the error is printed and the session is left as it was.
pub fn upload<W: Write>(session: &mut Session, path: &Path, out: &mut W) -> io::Result<()> {
    match load_upload(path) {
        Ok(document) => report_loaded(session, document, out),
        Err(e) => writeln!(out, "error: {}", e),
    }
}

/// Install an extracted document and print its statistics.
fn report_loaded<W: Write>(
    session: &mut Session,
    document: Document,
    out: &mut W,
) -> io::Result<()> {
    let failures: Vec<String> = document
        .deck()
        .map(|deck| {
            deck.failures
                .iter()
                .map(|f| format!("slide {} ({})", f.index, f.message))
                .collect()
        })
        .unwrap_or_default();
    let summary = match &document.body {
        DocumentBody::Deck(deck) => format!(
            "{} slides, {} with content",
            deck.slides.len(),
            deck.slides_with_content()
        ),
        DocumentBody::Text(text) => format!("{} characters", text.chars().count()),
    };
    let filename = document.filename.clone();
    let is_deck = document.deck().is_some();

    let context = session.load_document(document);
    writeln!(out, "Loaded {}: {}.", filename, summary)?;
    writeln!(
        out,
        "Context: {} characters (~{} tokens){}",
        context.char_count(),
        estimate_tokens(&context.text),
        if context.truncated {
            ", trimmed to fit"
        } else {
            ""
        }
    )?;
    if context.truncated && is_deck {
        writeln!(
            out,
            "hint: ask about specific slides, e.g. \"slide 15\" or \"slides 10-20\", to get their full text."
        )?;
    }

    if !failures.is_empty() {
        writeln!(
            out,
            "warning: partial extraction, {} slide(s) could not be read:",
            failures.len()
        )?;
        for failure in &failures {
            writeln!(out, "  {}", failure)?;
        }
    }
    Ok(())
}

fn show_context<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    let (Some(document), Some(context)) = (session.document(), session.context()) else {
        return writeln!(out, "No document loaded. Use /upload <path>.");
    };

    writeln!(
        out,
        "{}: {} characters (~{} tokens)",
        document.filename,
        context.char_count(),
        estimate_tokens(&context.text)
    )?;
    if context.truncated {
        writeln!(
            out,
            "Trimmed: {} slide(s) condensed, {} omitted, {} characters elided",
            context.condensed_slides, context.omitted_slides, context.elided_chars
        )?;
    }

    writeln!(out, "---")?;
    match context.text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => writeln!(out, "{}...", &context.text[..cut])?,
        None => writeln!(out, "{}", context.text)?,
    }
    writeln!(out, "---")
}

fn show_history<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    if session.turns().is_empty() {
        return writeln!(out, "(no messages yet)");
    }
    for turn in session.turns() {
        let label = match turn.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        writeln!(out, "{}> {}", label, turn.text)?;
    }
    Ok(())
}

fn chat<G, W>(session: &mut Session, gateway: &G, text: &str, out: &mut W) -> io::Result<()>
where
    G: ChatGateway + ?Sized,
    W: Write,
{
    if session.credential().is_none() {
        return writeln!(
            out,
            "error: no API key configured. Enter one with /key."
        );
    }

    match session.send(gateway, text) {
        Ok(reply) => writeln!(out, "assistant> {}", reply.text),
        Err(e) => {
            writeln!(out, "error: {}", e)?;
            if e.is_retryable() {
                writeln!(out, "The message was not added to the conversation; send it again to retry.")?;
            }
            Ok(())
        }
    }
}
