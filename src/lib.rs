//! Render LaTeX math to PNG images with the `latex` and `dvipng` programs.
//!
//! ```no_run
//! let rendered = rendermath::render_math(r"\sum_{k=1}^n k = \frac{n(n+1)}{2}", ".")?;
//! println!("{} ({}px)", rendered.path.display(), rendered.height);
//! # Ok::<(), rendermath::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub mod error;
mod png;
pub mod source;
mod tools;

pub use error::{Error, Result, Stage};
pub use source::MathSource;

const TEX_FILE: &str = "math.tex";
const DVI_FILE: &str = "math.dvi";
const PNG_FILE: &str = "math.png";

/// Environment variable overriding the LaTeX program.
pub const LATEX_ENV: &str = "RENDERMATH_LATEX";
/// Environment variable overriding the dvipng program.
pub const DVIPNG_ENV: &str = "RENDERMATH_DVIPNG";

/// Settings for a [`Renderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Output resolution passed to dvipng.
    pub dpi: u32,
    /// Typeset as display math (`\[...\]`) instead of inline (`$...$`).
    pub display: bool,
    pub latex: String,
    pub dvipng: String,
    /// In directory mode, return an image already rendered from the same input.
    pub reuse_existing: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 120,
            display: false,
            latex: "latex".to_string(),
            dvipng: "dvipng".to_string(),
            reuse_existing: true,
        }
    }
}

impl RenderOptions {
    /// Defaults, with program names taken from the environment when set.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(latex) = std::env::var(LATEX_ENV) {
            options.latex = latex;
        }
        if let Ok(dvipng) = std::env::var(DVIPNG_ENV) {
            options.dvipng = dvipng;
        }
        options
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    pub fn with_latex(mut self, program: impl Into<String>) -> Self {
        self.latex = program.into();
        self
    }

    pub fn with_dvipng(mut self, program: impl Into<String>) -> Self {
        self.dvipng = program.into();
        self
    }

    pub fn with_reuse_existing(mut self, reuse: bool) -> Self {
        self.reuse_existing = reuse;
        self
    }
}

/// A rendered image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMath {
    pub path: PathBuf,
    /// Image height in pixels.
    pub height: u32,
    /// Pixels from the bottom of the image to the baseline, as reported by
    /// dvipng. `None` when an existing image was reused.
    pub depth: Option<u32>,
}

/// Math to Png Renderer
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Verifies that both external programs can be found.
    pub fn check_tools(&self) -> Result<()> {
        tools::locate(Stage::Latex, &self.options.latex)?;
        tools::locate(Stage::Dvipng, &self.options.dvipng)
    }

    /// Render `expression` to `destination`.
    ///
    /// If `destination` is an existing directory the image is stored there as
    /// `<hash>_<height>_.png`, otherwise it is written to `destination` itself.
    pub fn render(
        &self,
        expression: impl AsRef<str>,
        destination: impl AsRef<Path>,
    ) -> Result<RenderedMath> {
        let source = MathSource::new(expression.as_ref(), self.options.dpi, self.options.display);
        let destination = destination.as_ref();

        if !destination.is_dir() {
            let scratch = self.compile(&source)?;
            let height = png::height(&scratch.png)?;
            place(&scratch.png, destination)?;
            log::info!("rendered {} ({height}px)", destination.display());
            return Ok(RenderedMath {
                path: destination.to_path_buf(),
                height,
                depth: scratch.depth,
            });
        }

        if self.options.reuse_existing {
            let found = source
                .find_in_dir(destination)
                .map_err(Error::io(Stage::Output))?;
            if let Some((path, height)) = found {
                log::debug!("reusing {}", path.display());
                return Ok(RenderedMath {
                    path,
                    height,
                    depth: None,
                });
            }
        }

        let scratch = self.compile(&source)?;
        let height = png::height(&scratch.png)?;
        let path = destination.join(source.file_name(height));
        place(&scratch.png, &path)?;
        log::info!("rendered {} ({height}px)", path.display());
        Ok(RenderedMath {
            path,
            height,
            depth: scratch.depth,
        })
    }

    /// Runs latex and dvipng in a fresh scratch directory.
    fn compile(&self, source: &MathSource) -> Result<Scratch> {
        let dir = tempfile::Builder::new()
            .prefix("rendermath")
            .tempdir()
            .map_err(Error::io(Stage::Prepare))?;
        fs::write(dir.path().join(TEX_FILE), source.document())
            .map_err(Error::io(Stage::Prepare))?;

        tools::run(
            Stage::Latex,
            &self.options.latex,
            ["-interaction=nonstopmode", "-halt-on-error", TEX_FILE],
            dir.path(),
        )?;
        let dvi = dir.path().join(DVI_FILE);
        if !dvi.is_file() {
            return Err(Error::MissingOutput {
                stage: Stage::Latex,
                path: dvi,
            });
        }

        let dpi = source.dpi.to_string();
        let report = tools::run(
            Stage::Dvipng,
            &self.options.dvipng,
            [
                "-D",
                dpi.as_str(),
                "-T",
                "tight",
                "-bg",
                "Transparent",
                "-depth",
                "-o",
                PNG_FILE,
                DVI_FILE,
            ],
            dir.path(),
        )?;
        let png = dir.path().join(PNG_FILE);
        if !png.is_file() {
            return Err(Error::MissingOutput {
                stage: Stage::Dvipng,
                path: png,
            });
        }

        let depth = tools::dvipng_depth(&report);
        if depth.is_none() {
            log::warn!("dvipng did not report a depth");
        }

        Ok(Scratch {
            _dir: dir,
            png,
            depth,
        })
    }
}

/// Keeps the scratch directory alive until the image has been copied out.
struct Scratch {
    _dir: TempDir,
    png: PathBuf,
    depth: Option<u32>,
}

fn place(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(Error::io(Stage::Output))?;
    Ok(())
}

/// Render `expression` to `destination` with default options.
///
/// See [`Renderer::render`].
pub fn render_math(
    expression: impl AsRef<str>,
    destination: impl AsRef<Path>,
) -> Result<RenderedMath> {
    Renderer::default().render(expression, destination)
}
