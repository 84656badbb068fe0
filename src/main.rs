use clap::{Parser, Subcommand};
use rst_forge::docutils::{DocutilsParser, ParserSettings, parse_setting};
use rst_forge::transform::{self, RenderOptions, SourceText};
use rst_forge::{attachments, config, format, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rst-forge")]
#[command(about = "reStructuredText tooling for static blogs")]
#[command(long_about = "\
reStructuredText tooling for static blogs

The site generator calls `rst-forge transform` for every .rst document and
embeds the HTML fragment it prints. The batch commands keep sources and data
files in shape.

Site layout:

  site/
  ├── _config.yml                  # url, baseurl, attachments_dir
  ├── rst-forge.toml               # Tool config (optional)
  ├── _posts/                      # Posts: YYYY-MM-DD-slug.{rst,md,html}
  ├── _tabs/                       # Pages (*.md)
  ├── assets/attachments/          # Attachments, categorized by path
  │   ├── images/
  │   └── research_papers/
  └── _data/                       # attachment_galleries.yml, attachment_references.yml

Pipeline (transform):
  pipe tables → grid tables → heading adornments → docutils
  → heading ids → table widths → diagram blocks

Requires python3 with docutils for `transform`.
Run 'rst-forge gen-config' to generate a documented rst-forge.toml.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Log progress at info level (otherwise RUST_LOG, default warn)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct TransformArgs {
    /// RST file to render, or literal RST text; reads stdin when omitted
    input: Option<String>,

    /// Rendered part to print (fragment, body, html_body, whole, ...)
    #[arg(long)]
    part: Option<String>,

    /// docutils writer (html, html4, html5)
    #[arg(long)]
    writer: Option<String>,

    /// Path named in diagnostics
    #[arg(long)]
    source_path: Option<String>,

    /// Level of the top section headings
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    initial_header_level: Option<u8>,

    /// Lowest reported message level (1=info .. 5=none)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    report_level: Option<u8>,

    /// Message level that stops the parse
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    halt_level: Option<u8>,

    /// Extra docutils setting as KEY=VALUE (repeatable)
    #[arg(long = "setting", value_name = "KEY=VALUE", value_parser = parse_setting)]
    settings: Vec<(String, serde_json::Value)>,

    /// Write the preprocessed RST to this file before parsing
    #[arg(long)]
    dump_preprocessed: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Render one RST document to an HTML fragment on stdout
    Transform(TransformArgs),
    /// Fix heading adornments and front matter fences in _posts/*.rst
    Format {
        /// Report what would change without writing; exits 1 if anything would
        #[arg(long)]
        check: bool,
    },
    /// Index attachments and the posts and pages that reference them
    Attachments {
        /// Site root (overrides --site)
        root: Option<PathBuf>,
    },
    /// Print a stock rst-forge.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Transform(args) => run_transform(&cli.site, args),
        Command::Format { check } => run_format(&cli.site, check),
        Command::Attachments { root } => {
            let root = root.unwrap_or_else(|| cli.site.clone());
            run_attachments(&root)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_transform(
    site: &Path,
    args: TransformArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = config::load_config(site)?;
    let parser_config = &config.parser;

    let mut settings = ParserSettings::from_config(parser_config);
    if let Some(level) = args.initial_header_level {
        settings.initial_header_level = Some(level);
    }
    if let Some(level) = args.report_level {
        settings.report_level = level;
    }
    if let Some(level) = args.halt_level {
        settings.halt_level = level;
    }
    settings.extra.extend(args.settings);

    let options = RenderOptions {
        writer: args.writer.unwrap_or_else(|| parser_config.writer.clone()),
        part: args.part.unwrap_or_else(|| parser_config.part.clone()),
        settings,
        diagram_keywords: config.diagrams.keywords.clone(),
        dump_preprocessed: args.dump_preprocessed,
    };

    let source = SourceText::resolve(args.input.as_deref(), args.source_path)?;
    let parser = DocutilsParser::new(&parser_config.python);
    let rendered = transform::render(&parser, &source, &options)?;

    eprint!("{}", rendered.diagnostics);
    print!("{}", rendered.html);
    Ok(ExitCode::SUCCESS)
}

fn run_format(site: &Path, check: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = config::load_config(site)?;
    let posts_dir = site.join(&config.format.posts_dir);

    let report = match format::format_posts(&posts_dir, !check) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    output::print_format_report(&report, site);

    let failed = report.errors() > 0 || (check && report.modified() > 0);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_attachments(root: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = config::load_config(root)?;
    let site = config::load_site_config(root)?;

    println!("==> Indexing attachments in {}", root.display());
    match attachments::index_site(root, &site, &config.attachments) {
        Ok(summary) => {
            output::print_index_summary(&summary, root);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
