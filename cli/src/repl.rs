use rustyline::{DefaultEditor, error::ReadlineError};

use wrena_core::{SymbolIndex, analyze_line, parse_source, registry::SourceRegistry};

use crate::{CORE_IDENTITY, CORE_SOURCE, render_line};

/// Marks the cursor inside an entered line.
pub(crate) const CURSOR_MARKER: char = '|';

fn print_repl_help() {
    eprintln!("Type a line of Wren; mark the cursor with '|' (default: end of line).");
    eprintln!("Commands: :quit | :exit | :q, :help");
}

/// Removes the first cursor marker and returns the text with the cursor
/// column in characters.
pub(crate) fn split_cursor(line: &str) -> (String, usize) {
    match line.char_indices().find(|(_, ch)| *ch == CURSOR_MARKER) {
        Some((byte, _)) => {
            let column = line[..byte].chars().count();
            let mut text = String::with_capacity(line.len());
            text.push_str(&line[..byte]);
            text.push_str(&line[byte + CURSOR_MARKER.len_utf8()..]);
            (text, column)
        }
        None => (line.to_string(), line.chars().count()),
    }
}

/// Index over the core listing, so call targets can show signatures.
fn core_index() -> SymbolIndex {
    let mut registry = SourceRegistry::new();
    match parse_source(CORE_SOURCE) {
        Ok(module) => {
            registry.insert(CORE_IDENTITY, module);
        }
        Err(e) => eprintln!("Warning: core library listing does not parse: {}", e),
    }
    SymbolIndex::rebuild(&registry)
}

pub fn run() -> anyhow::Result<()> {
    let index = core_index();

    // In-memory line editor with history and arrow key support
    let mut rl = DefaultEditor::new()?;

    print_repl_help();

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                eprintln!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                return Ok(());
            }
            Err(e) => {
                eprintln!("Readline error: {}", e);
                continue;
            }
        };

        let trimmed = line.trim_end();
        if trimmed.starts_with(':') {
            match trimmed {
                ":quit" | ":exit" | ":q" => return Ok(()),
                ":help" => print_repl_help(),
                _ => eprintln!("Unknown command. Type :help for help."),
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        let (text, column) = split_cursor(trimmed);
        let context = analyze_line(&text, column);
        match render_line(&context) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: {}", e),
        }

        if let Some(target) = context.call_target() {
            for signature in index.signatures_for(target) {
                println!("  {}", signature.label);
            }
        }
    }
}
