use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileArgs {
    /// Index bookmarks of another browser profile
    Add {
        /// Profile directory name, e.g. "Profile 1"
        name: String,
    },
    /// Stop indexing a profile
    Remove { name: String },
    /// List indexed profiles
    List {},
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search bookmark folders and print launcher items
    Query {
        /// Free text, empty lists everything
        #[clap(allow_hyphen_values = true)]
        query: Option<String>,
    },
    /// Rebuild the search index.
    /// Normally started in the background by `query`.
    UpdateIndex {},
    /// Show index state
    Status {},
    /// Manage browser profiles
    Profile {
        #[clap(subcommand)]
        action: ProfileArgs,
    },
}
