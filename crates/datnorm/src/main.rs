//! datnorm - flat-file database normalizer

use anyhow::{Context, Result};
use clap::Parser;
use datnorm::cli::{Cli, FormatCommand, RunArgs};
use datnorm::grammar::{EnzymeGrammar, Grammar, UniProtGrammar};
use datnorm::sink::SqlTextSink;
use datnorm::{dump, normalize, NormalizerConfig, OutputFormat};
use datnorm_common::logging::{init_logging, LogConfig, LogLevel};
use datnorm_common::stream::{InputSource, LineStream, OutputTarget};
use tracing::error;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(LogLevel::from_verbosity(cli.verbose, cli.quiet))
        .build();
    // Environment variables take precedence
    let log_config = LogConfig::from_env_over(log_config)?;
    let _guard = init_logging(&log_config)?;

    if let Err(e) = run(&cli.command) {
        error!(error = %e, "Run failed");
        return Err(e);
    }
    Ok(())
}

fn run(command: &FormatCommand) -> Result<()> {
    let args = command.args();
    let config = command.config();

    let inputs: Vec<InputSource> = args.inputs.iter().map(|i| InputSource::parse(i)).collect();
    let lines = LineStream::open(&inputs).context("Failed to open input")?;

    match command {
        FormatCommand::Uniprot { .. } => execute(UniProtGrammar, lines, &config, args),
        FormatCommand::Enzyme { .. } => execute(EnzymeGrammar, lines, &config, args),
    }
}

fn execute<G: Grammar>(grammar: G, lines: LineStream, config: &NormalizerConfig, args: &RunArgs) -> Result<()> {
    if config.output_format != OutputFormat::Sql {
        let mut out = OutputTarget::parse(&args.output).create()?;
        dump(grammar, lines, config.output_format, &mut out)?;
        return Ok(());
    }

    #[cfg(feature = "database")]
    {
        if let Some(url) = &args.database_url {
            let mut sink = datnorm::sink::PgSink::connect(url).context("Failed to connect to database")?;
            normalize(grammar, lines, config, &mut sink)?;
            return Ok(());
        }
    }

    let out = OutputTarget::parse(&args.output).create()?;
    let mut sink = SqlTextSink::new(out);
    normalize(grammar, lines, config, &mut sink)?;
    Ok(())
}
