use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use passkeep::{Record, Storage, Vault, default_storage};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "passkeep")]
#[command(
    version,
    about = "Local, single-user credential vault for the command line."
)]
struct Cli {
    /// Path to the vault file
    #[arg(long, global = true, value_name = "PATH", env = "PASSKEEP_PATH")]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Creates the vault and sets the master password
    Init,

    /// Adds a new credential record
    Add {
        #[arg(short, long)]
        service: Option<String>,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Searches records and reveals the matching one
    #[command(arg_required_else_help = true)]
    Get {
        query: String,

        /// Copy the password to the clipboard instead of printing it
        #[arg(long, default_value_t = false)]
        copy: bool,
    },

    /// Lists all records without revealing secrets
    List,

    /// Updates an existing record by id
    #[command(arg_required_else_help = true)]
    Update {
        id: u64,

        #[arg(short, long)]
        service: Option<String>,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Removes a record by id
    #[command(arg_required_else_help = true)]
    Remove { id: u64 },

    /// Exports all records, decrypted, to a JSON file
    Export {
        /// Output path
        #[arg(short, long, value_name = "PATH", default_value = "passkeep-export.json")]
        output: PathBuf,
    },

    /// Replaces the master password, re-encrypting every record
    ChangeMasterPassword,

    /// Deletes the vault and everything in it
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

fn resolve_storage(path: Option<PathBuf>) -> Result<Storage> {
    match path {
        Some(p) => Ok(Storage::new(p)),
        None => Ok(default_storage()?),
    }
}

fn unlock(storage: Storage) -> Result<Vault> {
    let password = auth::read_password()?;
    Ok(Vault::unlock(storage, password)?)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    let storage = resolve_storage(args.vault.clone())?;

    match args.command {
        Commands::Init => {
            let password = auth::read_new_password_with_confirmation()?;
            Vault::create(storage, password)?;
            println!("vault initialized");
        }

        Commands::Add {
            service,
            username,
            password,
            notes,
        } => {
            let mut vault = unlock(storage)?;

            let service = match service {
                Some(s) => s,
                None => auth::prompt_line("Service: ")?,
            };
            let username = match username {
                Some(u) => u,
                None => auth::prompt_line("Username: ")?,
            };
            let password = match password {
                Some(p) => p,
                None => auth::prompt_line("Password: ")?,
            };

            if service.is_empty() || username.is_empty() || password.is_empty() {
                bail!("service, username, and password are required");
            }

            let id = vault.add(&service, &username, &password, notes.as_deref().unwrap_or(""))?;
            println!("stored '{service}' ({username}) as entry {id}");
        }

        Commands::Get { query, copy } => {
            let vault = unlock(storage)?;

            let matches = vault.search(&query);
            let record = match matches.len() {
                0 => bail!("no entry matching '{query}'"),
                1 => matches[0],
                n => {
                    for (i, record) in matches.iter().enumerate() {
                        println!("{}. {} ({})", i + 1, record.service(), record.username());
                    }
                    matches[auth::select_index(n)?]
                }
            };

            let password = vault.reveal(record.id())?;

            if copy {
                let mut clipboard = arboard::Clipboard::new()?;
                clipboard.set_text(password.to_string())?;
                println!(
                    "password for {} ({}) copied to clipboard",
                    record.service(),
                    record.username()
                );
            } else {
                println!("Service:  {}", record.service());
                println!("Username: {}", record.username());
                println!("Password: {}", &*password);
                if !record.notes().is_empty() {
                    println!("Notes:    {}", record.notes());
                }
            }
        }

        Commands::List => {
            let vault = unlock(storage)?;
            let entries = vault.list();

            if entries.is_empty() {
                println!("No entries stored.");
                return Ok(());
            }

            print_table(&entries);
        }

        Commands::Update {
            id,
            service,
            username,
            password,
            notes,
        } => {
            let mut vault = unlock(storage)?;
            vault.update(
                id,
                service.as_deref(),
                username.as_deref(),
                password.as_deref(),
                notes.as_deref(),
            )?;
            println!("entry {id} updated");
        }

        Commands::Remove { id } => {
            let mut vault = unlock(storage)?;
            vault.remove(id)?;
            println!("entry {id} removed");
        }

        Commands::Export { output } => {
            let vault = unlock(storage)?;
            let entries = vault.export()?;

            let data = serde_json::to_vec_pretty(&entries)?;
            write_private(&output, &data)
                .with_context(|| format!("failed to write {}", output.display()))?;

            println!("exported {} entries to {}", entries.len(), output.display());
        }

        Commands::ChangeMasterPassword => {
            let current = auth::read_password()?;
            let mut vault = Vault::unlock(storage, current.clone())?;

            let new = auth::read_new_password_with_confirmation()?;
            let count = vault.rotate_master_password(&current, &new)?;

            println!("master password changed; re-encrypted {count} entries");
        }

        Commands::Reset { yes } => {
            let vault = unlock(storage.clone())?;
            drop(vault);

            if !yes {
                let answer = auth::prompt_line("Type 'yes' to delete every stored entry: ")?;
                if answer != "yes" {
                    println!("aborted");
                    return Ok(());
                }
            }

            storage.remove()?;
            println!("vault reset");
        }
    }

    Ok(())
}

fn print_table(entries: &[&Record]) {
    let id_width = entries
        .iter()
        .map(|e| e.id().to_string().len())
        .chain(std::iter::once("Id".len()))
        .max()
        .unwrap();

    let service_width = entries
        .iter()
        .map(|e| e.service().len())
        .chain(std::iter::once("Service".len()))
        .max()
        .unwrap();

    let username_width = entries
        .iter()
        .map(|e| e.username().len())
        .chain(std::iter::once("Username".len()))
        .max()
        .unwrap();

    println!(
        "{:<id_width$}  {:<service_width$}  {:<username_width$}  Updated",
        "Id", "Service", "Username"
    );
    println!(
        "{:-<id_width$}  {:-<service_width$}  {:-<username_width$}  -------",
        "", "", ""
    );

    for e in entries {
        println!(
            "{:<id_width$}  {:<service_width$}  {:<username_width$}  {}",
            e.id(),
            e.service(),
            e.username(),
            e.updated()
        );
    }
}

#[cfg(unix)]
fn write_private(path: &PathBuf, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_private(path: &PathBuf, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, data)
}
