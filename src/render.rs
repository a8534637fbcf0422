//! Rendering flowchart markup to SVG and PNG.
//!
//! [`Renderer`] is the seam between the generator and the external tool.
//! [`MermaidCli`] drives the Mermaid command line (`mmdc`) in a scratch
//! directory, killing it when it outlives the timeout.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::FlowlabelError;

pub const DEFAULT_MMDC: &str = "mmdc";
pub const DEFAULT_SCALE: u32 = 4;
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Both renderings of one diagram.
#[derive(Clone, Debug)]
pub struct RenderedDiagram {
    pub svg: String,
    /// Encoded PNG bytes, rendered at a larger scale than the SVG.
    pub png: Vec<u8>,
}

/// Renders markup into vector and raster form.
pub trait Renderer {
    fn render(&self, markup: &str) -> Result<RenderedDiagram, FlowlabelError>;
}

/// The Mermaid CLI, run as a subprocess.
#[derive(Clone, Debug)]
pub struct MermaidCli {
    pub program: PathBuf,
    pub scale: u32,
    pub timeout: Duration,
}

impl Default for MermaidCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_MMDC),
            scale: DEFAULT_SCALE,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }
}

impl MermaidCli {
    fn run(&self, args: &[&OsStr], log_path: &Path) -> Result<(), FlowlabelError> {
        let log = fs::File::create(log_path)?;
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|source| FlowlabelError::RenderFailure {
                message: format!("failed to start {}: {source}", self.program.display()),
            })?;

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                if status.success() {
                    return Ok(());
                }
                let stderr = fs::read_to_string(log_path).unwrap_or_default();
                return Err(FlowlabelError::RenderFailure {
                    message: format!(
                        "{} exited with {status}: {}",
                        self.program.display(),
                        stderr.trim()
                    ),
                });
            }
            if started.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(FlowlabelError::RenderTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Renderer for MermaidCli {
    fn render(&self, markup: &str) -> Result<RenderedDiagram, FlowlabelError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("diagram.mmd");
        let svg_path = scratch.path().join("diagram.svg");
        let png_path = scratch.path().join("diagram.png");
        let log_path = scratch.path().join("mmdc.log");
        fs::write(&input, markup)?;

        let scale = self.scale.to_string();
        debug!(program = %self.program.display(), "rendering svg");
        self.run(
            &[
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-o"),
                svg_path.as_os_str(),
            ],
            &log_path,
        )?;
        debug!(program = %self.program.display(), scale = self.scale, "rendering png");
        self.run(
            &[
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-o"),
                png_path.as_os_str(),
                OsStr::new("--scale"),
                OsStr::new(&scale),
            ],
            &log_path,
        )?;

        let svg = fs::read_to_string(rendered_output(&svg_path)?)?;
        let png = fs::read(rendered_output(&png_path)?)?;
        Ok(RenderedDiagram { svg, png })
    }
}

/// The file the CLI actually wrote for `requested`.
///
/// Given markdown input, the CLI writes one file per chart with a `-<n>`
/// suffix; the first chart is accepted in place of the plain name.
fn rendered_output(requested: &Path) -> Result<PathBuf, FlowlabelError> {
    if requested.is_file() {
        return Ok(requested.to_path_buf());
    }
    let suffixed = match (requested.file_stem(), requested.extension()) {
        (Some(stem), Some(ext)) => requested.with_file_name(format!(
            "{}-1.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        )),
        _ => requested.to_path_buf(),
    };
    if suffixed.is_file() {
        return Ok(suffixed);
    }
    Err(FlowlabelError::RenderFailure {
        message: format!("renderer produced no {}", requested.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixed_output_is_accepted() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let requested = temp.path().join("diagram.svg");
        fs::write(temp.path().join("diagram-1.svg"), "<svg/>").expect("write svg");
        assert_eq!(
            rendered_output(&requested).unwrap(),
            temp.path().join("diagram-1.svg")
        );
    }

    #[test]
    fn missing_output_is_a_render_failure() {
        let temp = tempfile::tempdir().expect("create temp dir");
        assert!(matches!(
            rendered_output(&temp.path().join("diagram.png")),
            Err(FlowlabelError::RenderFailure { .. })
        ));
    }

    #[test]
    fn missing_program_is_a_render_failure() {
        let cli = MermaidCli {
            program: PathBuf::from("/nonexistent/flowlabel-mmdc"),
            ..MermaidCli::default()
        };
        assert!(matches!(
            cli.render("graph TD\n    A0(\"a\") -- \"b\" --> A1(\"c\")\n"),
            Err(FlowlabelError::RenderFailure { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn slow_program_is_killed_after_timeout() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let script = temp.path().join("slow-mmdc");
        fs::write(&script, "#!/bin/sh\nexec sleep 5\n").expect("write script");
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
        }

        let cli = MermaidCli {
            program: script,
            scale: 1,
            timeout: Duration::from_millis(200),
        };
        let started = Instant::now();
        assert!(matches!(
            cli.render("graph TD\n"),
            Err(FlowlabelError::RenderTimeout { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
