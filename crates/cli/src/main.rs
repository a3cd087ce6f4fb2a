//! Chat with an uploaded document from the terminal.

mod repl;
mod upload;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Password;
use doc_chat_core::context::DEFAULT_MAX_CHARS;
use doc_chat_core::{ApiKey, ContextAssembler, Session};
use doc_chat_openai::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use doc_chat_openai::{OpenAiConfig, OpenAiGateway};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

/// Ask questions about a text, Markdown or PowerPoint document.
#[derive(Parser, Debug)]
#[command(name = "doc-chat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Document to load on startup (.txt, .md or .pptx)
    document: Option<PathBuf>,

    /// OpenAI API key (default: OPENAI_API_KEY, then an interactive prompt)
    #[arg(long)]
    api_key: Option<String>,

    /// Chat model
    #[arg(short, long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API root of an OpenAI-compatible provider
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Context budget in characters (about four characters per token)
    #[arg(long, env = "DOC_CHAT_MAX_CONTEXT_CHARS", default_value_t = DEFAULT_MAX_CHARS)]
    max_context_chars: usize,

    /// Print the extracted context of the document and exit
    #[arg(short, long, requires = "document")]
    print: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Before parsing, so `.env` can supply the env-backed arguments.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let assembler = ContextAssembler::new().with_max_chars(args.max_context_chars);

    if args.print {
        if let Some(path) = &args.document {
            return print_context(path, &assembler);
        }
    }

    let gateway = OpenAiGateway::new(
        OpenAiConfig::default()
            .with_model(args.model.clone())
            .with_base_url(args.base_url.clone()),
    );

    let mut session = Session::new(assembler);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // A key the provider rejects is dropped, leaving chat blocked until `/key`.
    match resolve_credential(args.api_key.clone())? {
        Some(key) => {
            repl::install_key(&mut session, &gateway, key, &mut out)?;
        }
        None => writeln!(out, "No API key configured; enter one with /key to start chatting.")?,
    }

    if let Some(path) = &args.document {
        repl::upload(&mut session, path, &mut out)?;
    }
    eprintln!("Type /help for commands.");

    let stdin = io::stdin();
    repl::run(
        &mut session,
        &gateway,
        &mut repl::PasswordPrompt,
        stdin.lock(),
        &mut out,
    )?;

    Ok(())
}

/// Batch mode: extract one document and write its context to stdout.
fn print_context(path: &std::path::Path, assembler: &ContextAssembler) -> Result<()> {
    let document = upload::load_upload(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    if let Some(deck) = document.deck() {
        for failure in &deck.failures {
            eprintln!(
                "warning: slide {} could not be read: {}",
                failure.index, failure.message
            );
        }
    }

    let context = assembler.assemble(&document);
    println!("{}", context.text);
    Ok(())
}

/// The `--api-key` flag, then `OPENAI_API_KEY`, then a hidden prompt when
/// running interactively. An empty answer leaves chat disabled.
fn resolve_credential(flag: Option<String>) -> Result<Option<ApiKey>> {
    let env = std::env::var("OPENAI_API_KEY").ok();
    if let Some(key) = ApiKey::from_sources([flag, env]) {
        return Ok(Some(key));
    }

    if !io::stdin().is_terminal() {
        return Ok(None);
    }

    let entered = Password::new()
        .with_prompt("OpenAI API key (leave empty to skip)")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;
    Ok(ApiKey::new(entered))
}
