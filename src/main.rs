use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use funcopgen::config::parse_type_list;
use funcopgen::{syntax, CheckSink, FsSink, Generator, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(name = "funcopgen")]
#[command(about = "Generate functional options for Go struct types.", long_about = None)]
struct Cli {
    /// Comma-delimited list of struct types to generate options for.
    #[arg(long = "type", value_name = "TYPES")]
    types: String,

    /// Prefix prepended to every option function name.
    #[arg(long, default_value = "")]
    prefix: String,

    /// Also generate a New<Type> constructor applying `default` tags.
    #[arg(long, default_value_t = false)]
    factory: bool,

    /// Generate options for unexported fields too.
    #[arg(long, default_value_t = false)]
    unexported: bool,

    /// Name the option type <Type>Option and fail on clashing option names.
    #[arg(long, default_value_t = false)]
    unique_option: bool,

    /// Go package directory; generated files are written next to its sources.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// If set, fail if any generated file differs; do not write.
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Print the resolved field catalogs as JSON instead of generating.
    #[arg(long, default_value_t = false)]
    dump_catalog: bool,

    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("funcopgen: {err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> funcopgen::Result<()> {
    let config = GeneratorConfig::builder()
        .type_names(parse_type_list(&cli.types))
        .prefix(cli.prefix)
        .factory(cli.factory)
        .unexported(cli.unexported)
        .unique_option(cli.unique_option)
        .build()?;

    let package = syntax::load_package(&cli.dir)?;
    let mut generator = Generator::new(config);

    if cli.dump_catalog {
        println!("{}", generator.dump_catalogs(&package)?);
        return Ok(());
    }

    if cli.check {
        let mut sink = CheckSink::new(&cli.dir);
        let result = generator.run(&package, &mut sink);
        for stale in sink.stale() {
            println!("--- {0}\n+++ {0} (generated)", stale.file_name);
            print!("{}", stale.diff);
        }
        result?;
        sink.finish()?;
        return Ok(());
    }

    generator.run(&package, &mut FsSink::new(&cli.dir))?;
    Ok(())
}

/// Accept Go-style flags: `-type=A` becomes `--type=A`. Single-letter
/// flags such as `-v` are left alone.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .enumerate()
        .map(|(idx, arg)| {
            if idx == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(s) if is_go_style_flag(s) => OsString::from(format!("-{s}")),
                _ => arg,
            }
        })
        .collect()
}

fn is_go_style_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or(rest);
    !rest.starts_with('-') && name.len() > 1 && name.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let directive = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    let subscriber = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
