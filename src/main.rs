use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rendermath::{RenderOptions, Renderer};

#[derive(Parser)]
#[command(name = "rendermath")]
#[command(about = "Render a LaTeX math expression to a PNG image", long_about = None)]
struct Cli {
    /// Math expression, without surrounding delimiters
    #[arg(value_name = "EXPRESSION", required_unless_present = "check")]
    expression: Option<String>,

    /// Output directory (hashed file name) or output file path
    #[arg(value_name = "DESTINATION", required_unless_present = "check")]
    destination: Option<PathBuf>,

    /// Output resolution in dots per inch
    #[arg(long, default_value_t = 120)]
    dpi: u32,

    /// Typeset as display math instead of inline math
    #[arg(long)]
    display: bool,

    /// LaTeX program to run (defaults to $RENDERMATH_LATEX or `latex`)
    #[arg(long)]
    latex: Option<String>,

    /// dvipng program to run (defaults to $RENDERMATH_DVIPNG or `dvipng`)
    #[arg(long)]
    dvipng: Option<String>,

    /// Always re-render, even if a matching image already exists
    #[arg(long)]
    no_reuse: bool,

    /// Only check that the external programs are available
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn options(&self) -> RenderOptions {
        let mut options = RenderOptions::from_env()
            .with_dpi(self.dpi)
            .with_display(self.display)
            .with_reuse_existing(!self.no_reuse);
        if let Some(latex) = &self.latex {
            options = options.with_latex(latex.as_str());
        }
        if let Some(dvipng) = &self.dvipng {
            options = options.with_dvipng(dvipng.as_str());
        }
        options
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let renderer = Renderer::new(cli.options());

    if cli.check {
        renderer.check_tools()?;
        return Ok("ok".to_string());
    }

    let (Some(expression), Some(destination)) = (&cli.expression, &cli.destination) else {
        anyhow::bail!("EXPRESSION and DESTINATION are required");
    };
    let rendered = renderer
        .render(expression, destination)
        .with_context(|| format!("failed to render `{expression}`"))?;

    let mut line = format!("{}\t{}", rendered.path.display(), rendered.height);
    if let Some(depth) = rendered.depth {
        line.push_str(&format!("\t{depth}"));
    }
    Ok(line)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("{}", run(&cli)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendermath::MathSource;

    const MISSING_LATEX: &str = "rendermath-missing-latex";
    const MISSING_DVIPNG: &str = "rendermath-missing-dvipng";

    #[test]
    fn test_reused_image_needs_no_tools() {
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join(MathSource::new("x+y", 120, false).file_name(11));
        std::fs::write(&cached, b"cached").unwrap();

        let cli = Cli::try_parse_from([
            "rendermath",
            "--latex",
            MISSING_LATEX,
            "--dvipng",
            MISSING_DVIPNG,
            "x+y",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(run(&cli).unwrap(), format!("{}\t11", cached.display()));
    }

    #[test]
    fn test_check_reports_missing_tools() {
        let cli =
            Cli::try_parse_from(["rendermath", "--check", "--latex", MISSING_LATEX]).unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains(MISSING_LATEX));
    }

    #[test]
    fn test_expression_required_without_check() {
        assert!(Cli::try_parse_from(["rendermath", "--dpi", "300"]).is_err());
    }
}
