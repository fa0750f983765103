//! Build automation tasks for the exposure feed workspace

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for exposure-feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<exposure_feed::Cli>();

    let content = format!(
        r#"# exposure-feed CLI Reference

Generated from the CLI definition on {}.

`exposure-feed` republishes the ACT COVID-19 exposure site list as two RSS
feeds: every current site, and a per-suburb summary of what each run added.
Nothing is written when the site list is unchanged.

## Quick Start

```bash
# Fetch the live page and update feeds in the current directory
exposure-feed fetch

# Replay a saved CSV at a fixed time
exposure-feed --now 1629471224 ingest exposures.csv

# Read the table out of a saved page
exposure-feed ingest page.html --html
```

## Commands

{}

## Environment Variables

Command-line flags take precedence. A `.env` file in the working directory is
loaded first.

- `EXPOSURE_SOURCE_URL` - Disclosure page to fetch
- `EXPOSURE_CSV_PATTERN` - Regex locating the CSV link in the page scripts
- `EXPOSURE_STATE_PATH` - State document (default: `exposures.json`)
- `EXPOSURE_DETAIL_FEED` - Detail feed output (default: `exposures.xml`)
- `EXPOSURE_SUMMARY_FEED` - Summary feed output (default: `summary.xml`)
- `EXPOSURE_HTTP_TIMEOUT_SECS` - Request timeout (default: `30`)
- `EXPOSURE_REFRESH_POLICY` - `refresh` or `freeze` (default: `refresh`)
- `EXPOSURE_TIMEZONE` - IANA timezone of the source (default: `Australia/Sydney`)
- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`, `LOG_FILTER` - Logging

---

*To update, run `cargo run -p xtask -- generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
