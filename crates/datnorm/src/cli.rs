//! Command-line interface definition
//!
//! Every option can also be set through a `DATNORM_*` environment variable
//! (or a `.env` file, loaded by the binary before parsing).

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{NormalizerConfig, OrganismFilter, OutputFormat, TransactionMode};

#[derive(Parser, Debug)]
#[command(name = "datnorm")]
#[command(author, version, about = "Normalize biological flat-file databases into relational statements")]
pub struct Cli {
    #[command(subcommand)]
    pub command: FormatCommand,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, env = "DATNORM_QUIET")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum FormatCommand {
    /// Normalize UniProtKB flat files (uniprot_sprot.dat, uniprot_trembl.dat)
    Uniprot {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Normalize ENZYME nomenclature files (enzyme.dat)
    Enzyme {
        #[command(flatten)]
        args: RunArgs,

        /// Keep only protein cross-references of these organisms, e.g. HUMAN,MOUSE
        #[arg(long, env = "DATNORM_ORGANISM")]
        organism: Option<String>,
    },
}

impl FormatCommand {
    pub fn args(&self) -> &RunArgs {
        match self {
            FormatCommand::Uniprot { args } | FormatCommand::Enzyme { args, .. } => args,
        }
    }

    pub fn config(&self) -> NormalizerConfig {
        let organism_filter = match self {
            FormatCommand::Enzyme {
                organism: Some(organism),
                ..
            } => OrganismFilter::parse(organism),
            _ => None,
        };
        self.args().config(organism_filter)
    }
}

/// Options shared by every format
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Input files, read back to back; `-` is standard input (the default)
    #[arg(value_name = "INPUT", env = "DATNORM_INPUT")]
    pub inputs: Vec<String>,

    /// Output file; `-` is standard output
    #[arg(short, long, default_value = "-", env = "DATNORM_OUTPUT")]
    pub output: String,

    /// What to write
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Sql, env = "DATNORM_OUTPUT_FORMAT")]
    pub output_format: OutputFormat,

    /// Do not emit CREATE TABLE statements
    #[arg(long, env = "DATNORM_OMIT_SCHEMA")]
    pub omit_schema: bool,

    /// Wrap every record in its own transaction and skip records that fail
    #[arg(long, env = "DATNORM_PER_RECORD_TRANSACTIONS")]
    pub per_record_transactions: bool,

    /// Execute statements directly against this PostgreSQL database
    #[cfg(feature = "database")]
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl RunArgs {
    pub fn config(&self, organism_filter: Option<OrganismFilter>) -> NormalizerConfig {
        NormalizerConfig::builder()
            .output_format(self.output_format)
            .emit_schema(!self.omit_schema)
            .transaction_mode(TransactionMode::from_flag(self.per_record_transactions))
            .organism_filter(organism_filter)
            .build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["datnorm", "uniprot"]).unwrap();
        let args = cli.command.args();
        assert!(args.inputs.is_empty());
        assert_eq!(args.output, "-");

        let config = cli.command.config();
        assert_eq!(config.transaction_mode, TransactionMode::Batched);
        assert!(config.emit_schema);
        assert!(config.organism_filter.is_none());
    }

    #[test]
    fn test_enzyme_options() {
        let cli = Cli::try_parse_from([
            "datnorm",
            "-vv",
            "enzyme",
            "enzyme.dat",
            "-",
            "--organism",
            "HUMAN,MOUSE",
            "--omit-schema",
            "--per-record-transactions",
            "-f",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.args().inputs, ["enzyme.dat", "-"]);
        let config = cli.command.config();
        assert_eq!(config.transaction_mode, TransactionMode::PerRecord);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(!config.emit_schema);
        assert!(config
            .organism_filter
            .is_some_and(|f| f.matches_entry_name("ADH1A_HUMAN")));
    }

    #[test]
    fn test_input_paths_keep_commas() {
        let cli = Cli::try_parse_from(["datnorm", "uniprot", "dump,2024.dat", "extra.dat"]).unwrap();
        assert_eq!(cli.command.args().inputs, ["dump,2024.dat", "extra.dat"]);
    }

    #[test]
    fn test_organism_only_on_enzyme() {
        assert!(Cli::try_parse_from(["datnorm", "uniprot", "--organism", "HUMAN"]).is_err());
    }
}
