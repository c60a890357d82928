use std::io::Write;

use petak::{
    config::Config,
    storage::storage_manager::StorageManager,
    types::error::DatabaseError,
};
use rustyline::{DefaultEditor, Result, error::ReadlineError};

const HISTORY_FILE: &str = ".petak_history";

fn print_help() {
    println!(
        r#"
Available commands:
  init              - Wipe and re-create the data store
  tables            - List tables in the catalog
  leaves <table>    - Show the leaf pages of a table in row-id order
  dump <table>      - Print every row of a table
  rowid on|off      - Toggle the row id column in dumps
  help, h           - Show this help message
  clear             - Clear the screen
  exit, quit, q     - Exit
"#
    );
}

fn dump_table(storage: &StorageManager, table_name: &str) -> std::result::Result<(), DatabaseError> {
    let info = storage.lookup_table(table_name)?;
    let mut header: Vec<String> = info.column_names().iter().map(|s| s.to_string()).collect();
    if storage.config().show_row_id {
        header.insert(0, "rowid".to_string());
    }
    println!("{}", header.join(" | "));

    let rows = storage.scan_table(table_name, None)?;
    for row in &rows {
        println!("{}", row.display_values(storage.config()).join(" | "));
    }
    println!("({} rows, catalog says {})", rows.len(), info.record_count);
    Ok(())
}

fn process_command(
    storage: &mut StorageManager,
    command: &str,
) -> std::result::Result<bool, DatabaseError> {
    let mut parts = command.split_whitespace();
    let verb = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next();

    match (verb.as_str(), arg) {
        ("exit" | "quit" | "q", _) => {
            println!("Goodbye!");
            return Ok(false);
        }
        ("help" | "h", _) => print_help(),
        ("clear", _) => {
            print!("\x1B[2J\x1B[1;1H");
            std::io::stdout().flush()?;
        }
        ("init", _) => {
            *storage = StorageManager::initialize_fresh(storage.config().clone())?;
            println!("Initialized {}", storage.data_dir().display());
        }
        ("tables", _) => {
            for name in storage.table_names()? {
                println!("{}", name);
            }
        }
        ("leaves", Some(table)) => {
            let leaves = storage.list_leaves(table)?;
            println!("root: {}", storage.find_root(table)?);
            println!("leaves: {:?}", leaves);
        }
        ("dump", Some(table)) => dump_table(storage, table)?,
        ("rowid", Some(toggle)) => match toggle.to_lowercase().as_str() {
            "on" => storage.set_show_row_id(true),
            "off" => storage.set_show_row_id(false),
            other => println!("Expected 'on' or 'off', got '{}'", other),
        },
        ("", _) => {}
        (other, _) => println!("Unknown command '{}'. Type 'help' for a list.", other),
    }
    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let mut storage = match StorageManager::open_or_initialize(Config::new(&data_dir)) {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("Failed to open data store at {}: {}", data_dir, e);
            std::process::exit(1);
        }
    };

    println!("petak storage shell. Type 'help' for commands.");

    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match rl.readline("petak> ") {
            Ok(line) => {
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                rl.add_history_entry(command)?;
                match process_command(&mut storage, command) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
