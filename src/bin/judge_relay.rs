//! `judge-relay`: send prompts to a catalogued backend and print completions.
//!
//! Usage:
//!
//! ```text
//! judge-relay <catalog.json> <alias> [--prompt <text>]... [--option key=value]...
//! judge-relay --list-backends
//! ```
//!
//! Without `--prompt`, prompts are read from stdin, one per line. Blank lines
//! are skipped, so output line N answers the Nth non-blank input line. One
//! completion is printed per prompt, in order. Set `RUST_LOG` for logs.

use judge_relay::api::{SamplingOptions, catalog_from_file};
use judge_relay::factory::{available_backends, build_adapter, select};
use std::io::BufRead;
use std::process;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: judge-relay <catalog.json> <alias> [OPTIONS]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <catalog.json>        Path to the backend catalog JSON file");
    eprintln!("  <alias>               Catalog alias of the backend to use");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --prompt <text>       Prompt to send (repeatable; default: stdin lines,");
    eprintln!("                        blank lines skipped)");
    eprintln!("  --option <key=value>  Sampling option (repeatable; value parsed as JSON");
    eprintln!("                        when possible, otherwise taken as a string)");
    eprintln!("  --list-backends       Print the backends compiled into this build");
    eprintln!("  --help                Show this message");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Parse `key=value`, reading the value as JSON when it parses.
fn parse_option(raw: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("--option expects key=value, got '{raw}'"))?;
    if key.is_empty() {
        anyhow::bail!("--option key cannot be empty");
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// One prompt per non-blank line.
fn read_prompts(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut prompts = Vec::new();
    let mut skipped = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            skipped += 1;
        } else {
            prompts.push(line);
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "Skipped blank input lines");
    }
    Ok(prompts)
}

async fn run() -> anyhow::Result<()> {
    // --- Argument parsing ---------------------------------------------------
    let mut args = std::env::args().skip(1);
    let mut positional: Vec<String> = Vec::new();
    let mut prompts: Vec<String> = Vec::new();
    let mut options = SamplingOptions::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--list-backends" => {
                for kind in available_backends() {
                    println!("{kind}");
                }
                return Ok(());
            }
            "--prompt" => {
                prompts.push(
                    args.next()
                        .ok_or_else(|| anyhow::anyhow!("--prompt requires a text argument"))?,
                );
            }
            "--option" => {
                let raw = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--option requires key=value"))?;
                let (key, value) = parse_option(&raw)?;
                options.insert(key, value);
            }
            _ if arg.starts_with('-') => anyhow::bail!("Unknown option: {arg}"),
            _ => positional.push(arg),
        }
    }

    let [catalog_path, alias] = <[String; 2]>::try_from(positional).map_err(|_| {
        print_usage();
        anyhow::anyhow!("Expected exactly two arguments: <catalog.json> <alias>")
    })?;

    // --- Backend ------------------------------------------------------------
    let catalog = catalog_from_file(&catalog_path)
        .map_err(|e| anyhow::anyhow!("Failed to load catalog '{catalog_path}': {e}"))?;
    let spec = select(&catalog, &alias)?;
    let adapter = build_adapter(spec).await?;

    // --- Prompts ------------------------------------------------------------
    if prompts.is_empty() {
        prompts = read_prompts(std::io::stdin().lock())?;
    }
    if prompts.is_empty() {
        anyhow::bail!("No prompts given");
    }

    for completion in adapter.completions(&prompts, &options).await? {
        println!("{completion}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_values_parse_as_json_when_possible() {
        let (k, v) = parse_option("temperature=0.5").unwrap();
        assert_eq!(k, "temperature");
        assert_eq!(v, serde_json::json!(0.5));

        let (_, v) = parse_option("stop=###").unwrap();
        assert_eq!(v, serde_json::json!("###"));
    }

    #[test]
    fn option_requires_equals_and_key() {
        assert!(parse_option("temperature").is_err());
        assert!(parse_option("=1").is_err());
    }

    #[test]
    fn stdin_prompts_skip_blank_lines() {
        let input = "first\n\n   \nsecond\n";
        let prompts = read_prompts(input.as_bytes()).unwrap();
        assert_eq!(prompts, vec!["first", "second"]);
    }
}
