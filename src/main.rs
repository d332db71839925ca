use anyhow::Result;
use build_cleaner::logging::{self, Verbosity};
use build_cleaner::{run, CommandKind, CommandSettings, Config};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Find and remove build output folders (bin, obj, testresults)",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to build-cleaner.toml beside the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete the build folders
    Delete(CommandArgs),
    /// Show the folders to be deleted
    #[command(name = "whatif")]
    WhatIf(CommandArgs),
}

#[derive(Args, Debug)]
struct CommandArgs {
    /// Starting path to perform the operation against
    #[arg(default_value = ".")]
    path: String,

    /// List any folders that could not be accessed
    #[arg(long = "display-access-errors", short = 'e')]
    display_access_errors: bool,

    /// Show the base folder
    #[arg(long = "display-folder", short = 'd')]
    display_folder: bool,

    /// Prompt for confirmation for each folder
    #[arg(long, short, visible_alias = "prompt", visible_short_alias = 'p')]
    interactive: bool,

    /// Show the size of each folder
    #[arg(long = "show-sizes", short = 's')]
    show_sizes: bool,
}

impl From<CommandArgs> for CommandSettings {
    fn from(args: CommandArgs) -> Self {
        CommandSettings {
            root: args.path,
            display_access_issues: args.display_access_errors,
            display_base_folder: args.display_folder,
            interactive: args.interactive,
            show_sizes: args.show_sizes,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let config = Config::load(cli.config.as_deref())?;

    let (kind, args) = match cli.command {
        Command::Delete(args) => (CommandKind::Delete, args),
        Command::WhatIf(args) => (CommandKind::WhatIf, args),
    };

    run(kind, &CommandSettings::from(args), &config)?;

    Ok(())
}
