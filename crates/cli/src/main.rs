use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use letterpdf_core::config::{flag_from_env_value, resolve_template_path};
use letterpdf_core::pdf::PaperFormat;
use letterpdf_core::{
    chromium_generator, derive_filename, read_letter, BodyFormat, ChromiumConfig, CoreConfig,
    Language, Letterhead, PdfOverrides, RenderOptions,
};

#[derive(Parser)]
#[command(name = "letterpdf")]
#[command(about = "Render patient letters from JSON to PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a letter JSON file to PDF
    Generate {
        /// Letter data (JSON)
        input: PathBuf,
        /// Output PDF; derived from the letter when omitted
        output: Option<PathBuf>,
        /// Directory for a derived output filename (defaults to the current directory)
        #[arg(long, conflicts_with = "output")]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        render: RenderArgs,
        /// Paper format (letter, legal, tabloid, ledger, a0-a6)
        #[arg(long)]
        paper: Option<PaperFormat>,
        /// Print in landscape orientation
        #[arg(long)]
        landscape: bool,
    },
    /// Print the filename a letter would be saved under
    Filename {
        /// Letter data (JSON)
        input: PathBuf,
    },
    /// Write the bound letter HTML without starting a browser
    Preview {
        /// Letter data (JSON)
        input: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Letter template (defaults to templates/letter.html)
    #[arg(long)]
    template: Option<PathBuf>,
    /// Body format used when the letter does not declare one (plain, markdown, html)
    #[arg(long)]
    format: Option<BodyFormat>,
    /// Language used when the letter does not declare one (en, es)
    #[arg(long, value_parser = parse_language)]
    language: Option<Language>,
}

impl RenderArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            body_format: self.format,
            language: self.language,
            pdf: PdfOverrides::default(),
        }
    }

    fn core_config(&self) -> anyhow::Result<CoreConfig> {
        let template = self
            .template
            .clone()
            .or_else(|| std::env::var_os("LETTERPDF_TEMPLATE_PATH").map(PathBuf::from));
        let template_path = resolve_template_path(template)?;

        let chromium = ChromiumConfig {
            executable: std::env::var_os("CHROME_EXECUTABLE").map(PathBuf::from),
            sandbox: flag_from_env_value(std::env::var("LETTERPDF_CHROME_SANDBOX").ok(), false),
            ..ChromiumConfig::default()
        };
        Ok(CoreConfig::new(template_path, Letterhead::default(), chromium))
    }
}

fn parse_language(code: &str) -> Result<Language, std::convert::Infallible> {
    Ok(Language::from_code(code))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("letterpdf_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            output,
            out_dir,
            render,
            paper,
            landscape,
        } => {
            let generator = chromium_generator(&render.core_config()?);
            let mut options = render.options();
            options.pdf.format = paper;
            if landscape {
                options.pdf.landscape = Some(true);
            }

            let written = match out_dir {
                Some(dir) => {
                    generator
                        .generate_from_file_in(&input, None, &dir, &options)
                        .await?
                }
                None => {
                    generator
                        .generate_from_file(&input, output.as_deref(), &options)
                        .await?
                }
            };
            println!("{}", written.display());
        }
        Commands::Filename { input } => {
            let letter = read_letter(&input)?;
            println!("{}", derive_filename(&letter));
        }
        Commands::Preview {
            input,
            output,
            render,
        } => {
            let generator = chromium_generator(&render.core_config()?);
            let letter = read_letter(&input)?;
            let html = generator.compose(&letter, &render.options())?;

            match output {
                Some(path) => std::fs::write(&path, html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{html}"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_accepts_page_flags() {
        let cli = Cli::try_parse_from([
            "letterpdf",
            "generate",
            "letter.json",
            "--paper",
            "a4",
            "--landscape",
            "--format",
            "markdown",
            "--language",
            "ES",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                input,
                output,
                out_dir,
                render,
                paper,
                landscape,
            } => {
                assert_eq!(input, PathBuf::from("letter.json"));
                assert!(output.is_none());
                assert!(out_dir.is_none());
                assert_eq!(paper, Some(PaperFormat::A4));
                assert!(landscape);
                assert_eq!(render.format, Some(BodyFormat::Markdown));
                assert_eq!(render.language, Some(Language::Es));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn out_dir_conflicts_with_explicit_output() {
        let cli = Cli::try_parse_from(["letterpdf", "generate", "l.json", "--out-dir", "letters"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate { out_dir: Some(ref d), .. } if d == &PathBuf::from("letters")
        ));
        assert!(
            Cli::try_parse_from(["letterpdf", "generate", "l.json", "o.pdf", "--out-dir", "x"])
                .is_err()
        );
    }

    #[test]
    fn unknown_paper_is_rejected() {
        assert!(Cli::try_parse_from(["letterpdf", "generate", "l.json", "--paper", "b5"]).is_err());
    }

    #[test]
    fn preview_output_flag() {
        let cli =
            Cli::try_parse_from(["letterpdf", "preview", "l.json", "-o", "out.html"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Preview { output: Some(ref p), .. } if p == &PathBuf::from("out.html")
        ));
    }
}
