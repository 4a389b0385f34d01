use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use dossier_lib::Repository;
use sysexits::ExitCode;

mod admin;
mod map;
mod profile;

#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Admin username, required for mutating commands
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Admin password, required for mutating commands
    #[arg(short, long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Operate on profiles
    #[command(subcommand)]
    Profile(profile::Command),
    /// List geo-tagged profiles with resolved map coordinates
    Map,
    /// Follow the stored collection and print every refresh
    Watch,
    /// Write the full collection to a JSON document
    Export {
        /// Destination file
        #[arg(short, long, default_value = "profiles.json")]
        output: PathBuf,
    },
}

#[derive(Debug)]
pub(crate) enum CliError {
    /// Missing or wrong admin credentials.
    Auth,
    /// No profile with the requested id.
    NotFound(i64),
    /// Rejected user input, with the reason.
    Input(String),
    Lib(dossier_lib::Error),
    Io(std::io::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Auth => ExitCode::NoPerm,
            Self::NotFound(_) | Self::Lib(_) => ExitCode::DataErr,
            Self::Input(_) => ExitCode::Usage,
            Self::Io(_) => ExitCode::IoErr,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "invalid credentials"),
            Self::NotFound(id) => write!(f, "no profile with id {id}"),
            Self::Input(reason) => write!(f, "{reason}"),
            Self::Lib(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl From<dossier_lib::Error> for CliError {
    fn from(err: dossier_lib::Error) -> Self {
        Self::Lib(err)
    }
}

fn main() -> ExitCode {
    human_panic::setup_panic!();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let repo = Repository::new();
    let cli = Cli::parse();

    let auth = admin::Credentials {
        username: cli.username.clone(),
        password: cli.password.clone(),
    };

    let result = match &cli.command {
        Command::Profile(cmd) => profile::handle(&repo, cmd, &auth),
        Command::Map => map::handle(&repo),
        Command::Watch => admin::watch(&repo),
        Command::Export { output } => admin::export(&repo, output, &auth),
    };

    match result {
        Ok(()) => ExitCode::Ok,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            err.exit_code()
        }
    }
}
