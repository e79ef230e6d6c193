//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fieldwork - batch field mutation tools for tabular record sources
#[derive(Parser, Debug)]
#[command(name = "fieldwork")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a sample table to experiment on
    #[command(
        name = "new",
        long_about = "Create a sample table to experiment on.\n\n\
            Writes a new table file with three fields (a date 'datestamp', a text \
            'name', and an integer 'count') and three rows whose datestamp starts \
            empty. The other tools in this toolbox are meant to be pointed at it.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Create a playground table, then stamp it
    fieldwork new testing.table.json
    fieldwork stamp testing.table.json

    # Create it under a different display name
    fieldwork new parcels.table.json --name parcels"
    )]
    New {
        /// Path of the table file to create
        table: PathBuf,

        /// Table display name
        #[arg(long, default_value = "testing_data")]
        name: String,
    },

    /// List a table's fields
    #[command(
        name = "fields",
        long_about = "List a table's field schema.\n\n\
            Shows each field's name and declared type. Useful before an update to \
            see what the table accepts."
    )]
    Fields {
        /// Path of the table file
        table: PathBuf,
    },

    /// Print every row of a table
    #[command(
        name = "dump",
        long_about = "Print every row of a table.\n\n\
            Rows are printed in table order with their row id, one line per row, \
            fields in declaration order."
    )]
    Dump {
        /// Path of the table file
        table: PathBuf,
    },

    /// Update a field in every row of a table
    #[command(
        name = "update",
        long_about = "Update a field in every row of a table.\n\n\
            Rewrites the named field in every row with one value, committing one \
            row at a time and reporting progress per row. The value is parsed \
            against the field's declared type; an incompatible value is rejected \
            before any row is written. If a row fails mid-pass, earlier rows stay \
            committed and later rows are left untouched - the summary reports how \
            many rows succeeded.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Write a date into every row's datestamp field
    fieldwork update testing.table.json --field datestamp --value 2021-07-08

    # Clear a field (empty value writes null)
    fieldwork update testing.table.json --field count --value ''

READING THE OUTPUT:
    Updating datestamp: step 1 of 3
    Updating datestamp: step 2 of 3
    Updating datestamp: step 3 of 3
    Updated 3 of 3 rows"
    )]
    Update {
        /// Path of the table file (NOTE, contents will be modified!)
        table: PathBuf,

        /// Name of the field that will be updated
        #[arg(long)]
        field: String,

        /// Value to write, parsed against the field's declared type
        #[arg(long)]
        value: String,
    },

    /// Write a datestamp into every row of a table
    #[command(
        name = "stamp",
        long_about = "Write a datestamp into every row of a table.\n\n\
            Convenience form of 'update' for date fields: the field defaults to \
            'datestamp' and the value defaults to today.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Stamp today's date into the datestamp field
    fieldwork stamp testing.table.json

    # Stamp a specific date into a different field
    fieldwork stamp testing.table.json --field surveyed --date 2021-07-08"
    )]
    Stamp {
        /// Path of the table file (NOTE, contents will be modified!)
        table: PathBuf,

        /// Name of the field that will have the date written into it
        #[arg(long, default_value = "datestamp")]
        field: String,

        /// Date to write (%Y-%m-%d); defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Show tool parameter declarations
    #[command(
        name = "describe",
        long_about = "Show tool parameter declarations.\n\n\
            Prints each tool's declared parameters - datatype, requirement, \
            direction, defaults, constraints - the schema a UI layer would read \
            to render the tool. With --spec, loads and validates a TOML tool \
            spec file instead of the built-in declarations."
    )]
    Describe {
        /// Built-in tool to describe (all tools when omitted)
        tool: Option<String>,

        /// Load a TOML tool spec file instead of the built-in declarations
        #[arg(long, conflicts_with = "tool")]
        spec: Option<PathBuf>,
    },

    /// Generate shell completion script
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    fieldwork completion bash > ~/.local/share/bash-completion/completions/fieldwork

    # Zsh
    fieldwork completion zsh > ~/.zfunc/_fieldwork"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
