#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "jsonschema2avro", about = "Convert JSON Schema to Avro Schema")]
struct Cli {
    /// Path or URL to the JSON Schema input, optionally with a `#/pointer` fragment
    #[arg(value_name = "JSONSCHEMA")]
    input: String,

    /// Path to the Avro schema output file (a directory with --split-top-level-records)
    #[arg(value_name = "AVRO")]
    output: String,

    /// Namespace override
    #[arg(long)]
    namespace: Option<String>,

    /// Root record class name
    #[arg(long, default_value = "document")]
    root_class_name: String,

    /// Split top-level records into separate files
    #[arg(long, default_value_t = false)]
    split_top_level_records: bool,

    /// Nesting depth past which the generic type is used
    #[arg(long, default_value_t = 64)]
    max_recursion_depth: usize,

    /// Log progress as well as warnings
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    #[cfg(feature = "trace")]
    {
        use crustrace_mermaid::{GroupingMode, MermaidLayer};

        let mmd_layer = MermaidLayer::new()
            .with_mode(GroupingMode::MergeByName)
            .with_params_mode(crustrace_mermaid::ParamRenderMode::SingleNodeGrouped);

        tracing_subscriber::registry()
            .with(
                fmt_layer
                    .with_span_events(
                        tracing_subscriber::fmt::format::FmtSpan::ENTER
                            | tracing_subscriber::fmt::format::FmtSpan::EXIT,
                    )
                    .with_filter(level),
            )
            .with(mmd_layer)
            .init();
    }

    #[cfg(not(feature = "trace"))]
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(level))
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    use jsonschema2avro::converter::{convert_jsons_to_avro, ConversionOptions};

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = ConversionOptions {
        namespace: cli.namespace,
        root_class_name: cli.root_class_name,
        split_top_level_records: cli.split_top_level_records,
        max_recursion_depth: cli.max_recursion_depth,
    };

    if let Err(e) = convert_jsons_to_avro(&cli.input, &cli.output, options) {
        tracing::error!("Conversion of {} failed", cli.input);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary is only available with the `cli` feature enabled.");
    std::process::exit(1);
}
