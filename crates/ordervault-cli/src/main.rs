use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ordervault_core::{SealedSecret, SecretStore, SecurityError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ordervault")]
#[command(about = "Local secret store for the order desk", long_about = None)]
struct Cli {
    /// Security directory holding the key, credential and registry files
    #[arg(short, long, default_value = ".ordervault")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a secret string under the machine key
    Encrypt {
        plaintext: String,
    },

    /// Open a sealed payload (fields as printed by `encrypt`)
    Decrypt {
        iv: String,
        auth_tag: String,
        data: String,
    },

    /// Store (or overwrite) a credential
    SetCredential {
        username: String,
        password: String,
    },

    /// Check a credential; prints true/false
    CheckCredential {
        username: String,
        password: String,
    },

    /// Add a file to the validated-file registry
    RegisterFile {
        path: PathBuf,
    },

    /// Check one registered file; prints true/false
    ValidateFile {
        path: PathBuf,
    },

    /// List every registered path currently failing validation
    ValidateAll,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    // The store handle doubles as the initialisation gate: nothing
    // below runs against an unconfigured security directory.
    let store = SecretStore::initialize(&cli.dir)
        .with_context(|| format!("initialise security directory {}", cli.dir.display()))?;

    match cli.command {
        Commands::Encrypt { plaintext } => {
            let sealed = store.encrypt(&plaintext)?;
            println!("{}", serde_json::to_string_pretty(&sealed)?);
        }

        Commands::Decrypt { iv, auth_tag, data } => {
            let payload = SealedSecret { iv, auth_tag, data };
            match store.decrypt(&payload) {
                Ok(plaintext) => println!("{plaintext}"),
                Err(SecurityError::Authentication) => {
                    anyhow::bail!("payload failed authentication — tampered or wrong installation")
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::SetCredential { username, password } => {
            store.store_credential(&username, &password)?;
            println!("credential stored for {username}");
        }

        Commands::CheckCredential { username, password } => {
            println!("{}", store.validate_credential(&username, &password));
        }

        Commands::RegisterFile { path } => {
            store.register_file(&path)?;
            println!("registered {}", path.display());
        }

        Commands::ValidateFile { path } => {
            println!("{}", store.validate_file(&path));
        }

        Commands::ValidateAll => {
            let failing = store.validate_all();
            if failing.is_empty() {
                println!("all registered files validate");
            } else {
                for path in failing {
                    println!("FAILING {}", path.display());
                }
            }
        }
    }

    Ok(())
}
