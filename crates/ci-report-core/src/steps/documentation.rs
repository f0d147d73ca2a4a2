//! Documentation build and publication.
//!
//! The build reads `doxide.yaml` (or `doxide.yml`) for the site title and
//! description, generates a Material-themed `mkdocs.yaml`, and runs
//! `doxide build` followed by `mkdocs build`. Publishing clones the
//! documentation repository over SSH, replaces the `<title>/` subdirectory
//! with the freshly built `site/`, then commits and pushes. Git exit codes
//! during publication are logged but never fail the step.

use crate::config::{DocsPublishConfig, ReportConfig};
use crate::error::ReportError;
use crate::runner::{CommandRunner, CommandSpec};
use crate::stage::{StepKind, StepResult, StepStatus};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Candidate doxide config files, in lookup order.
pub const DOXIDE_CONFIG_FILES: [&str; 2] = ["doxide.yaml", "doxide.yml"];

/// Generated mkdocs config, removed after the build.
pub const MKDOCS_CONFIG: &str = "mkdocs.yaml";

/// Directory mkdocs builds the site into.
pub const SITE_DIR: &str = "site";

const MKDOCS_THEME: &str = r#"theme:
  name: material
  custom_dir: docs/overrides
  features:
    - navigation.indexes
  palette:
    - scheme: default
      primary: red
      accent: red
      toggle:
        icon: material/brightness-7
        name: Switch to dark mode

    - scheme: slate
      primary: red
      accent: red
      toggle:
        icon: material/brightness-4
        name: Switch to light mode

markdown_extensions:
  - def_list
  - attr_list
  - admonition
  - pymdownx.details
  - pymdownx.superfences
  - pymdownx.arithmatex:
      generic: true
  - pymdownx.emoji:
      emoji_index: !!python/name:material.extensions.emoji.twemoji
      emoji_generator: !!python/name:material.extensions.emoji.to_svg
plugins:
  - search
extra_css:
  - stylesheets/doxide.css
extra_javascript:
  - javascripts/mathjax.js
  - https://polyfill.io/v3/polyfill.min.js?features=es6
  - https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"#;

/// Why the doxide config could not be used.
#[derive(Error, Debug)]
pub enum DocsConfigError {
    #[error("No doxide.yaml or doxide.yml file found")]
    NotFound,

    #[error("Could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid doxide config {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("doxide config is missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("doxide title {0:?} cannot be used as a directory name")]
    UnsafeTitle(String),
}

#[derive(Debug, Default, Deserialize)]
struct DoxideConfig {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Serialize)]
struct MkdocsHeader<'a> {
    site_name: &'a str,
    site_description: &'a str,
}

/// Site metadata taken from the doxide config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMetadata {
    pub title: String,
    pub description: String,
}

impl SiteMetadata {
    /// Locate and parse the doxide config of the checkout.
    pub fn load(workdir: &Path) -> std::result::Result<Self, DocsConfigError> {
        let path = DOXIDE_CONFIG_FILES
            .iter()
            .map(|name| workdir.join(name))
            .find(|p| p.is_file())
            .ok_or(DocsConfigError::NotFound)?;
        let raw = std::fs::read_to_string(&path).map_err(|source| DocsConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw).map_err(|e| match e {
            DocsConfigError::Invalid { source, .. } => DocsConfigError::Invalid {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse doxide YAML; `title` and `description` must be non-empty.
    pub fn parse(raw: &str) -> std::result::Result<Self, DocsConfigError> {
        let config: DoxideConfig = if raw.trim().is_empty() {
            DoxideConfig::default()
        } else {
            serde_yaml::from_str(raw).map_err(|source| DocsConfigError::Invalid {
                path: "<inline>".to_string(),
                source,
            })?
        };

        let title = config.title.filter(|t| !t.trim().is_empty());
        let description = config.description.filter(|d| !d.trim().is_empty());
        match (title, description) {
            (Some(title), Some(description)) => {
                let site = SiteMetadata { title, description };
                match site.publish_dir_name().as_str() {
                    "." | ".." => Err(DocsConfigError::UnsafeTitle(site.title)),
                    _ => Ok(site),
                }
            }
            (title, description) => {
                let mut missing = Vec::new();
                if title.is_none() {
                    missing.push("title");
                }
                if description.is_none() {
                    missing.push("description");
                }
                Err(DocsConfigError::MissingFields(missing))
            }
        }
    }

    /// Contents of the generated `mkdocs.yaml`.
    pub fn mkdocs_config(&self) -> std::result::Result<String, serde_yaml::Error> {
        let mut config = serde_yaml::to_string(&MkdocsHeader {
            site_name: &self.title,
            site_description: &self.description,
        })?;
        config.push_str(MKDOCS_THEME);
        Ok(config)
    }

    /// Directory name used inside the documentation repository.
    pub fn publish_dir_name(&self) -> String {
        self.title.trim().replace(['/', '\\'], "-")
    }
}

/// Outcome of the build phase.
#[derive(Debug)]
pub enum SiteBuild {
    /// Both tools succeeded; `site/` is ready to publish.
    Built { site: SiteMetadata, logs: String },
    Failed { logs: String },
}

/// Generate `mkdocs.yaml` and run `doxide build` + `mkdocs build`.
pub async fn build_site(runner: &dyn CommandRunner, workdir: &Path) -> Result<SiteBuild> {
    let site = match SiteMetadata::load(workdir) {
        Ok(site) => site,
        Err(e) => {
            warn!(step = "documentation", error = %e, "Cannot build documentation");
            return Ok(SiteBuild::Failed {
                logs: format!("{}\n", e),
            });
        }
    };

    let mkdocs = match site.mkdocs_config() {
        Ok(mkdocs) => mkdocs,
        Err(e) => {
            warn!(step = "documentation", error = %e, "Cannot generate mkdocs config");
            return Ok(SiteBuild::Failed {
                logs: format!("Could not generate {}: {}\n", MKDOCS_CONFIG, e),
            });
        }
    };
    let mkdocs_path = workdir.join(MKDOCS_CONFIG);
    std::fs::write(&mkdocs_path, mkdocs).map_err(|e| ReportError::at_path(&mkdocs_path, e))?;

    let mut logs = String::new();
    let mut failures = 0;
    for spec in [
        CommandSpec::new("doxide").arg("build"),
        CommandSpec::new("mkdocs").arg("build"),
    ] {
        let spec = spec.current_dir(workdir);
        logs.push_str(&format!("~$ {}\n", spec));
        let out = runner.run(&spec).await;
        logs.push_str(&out.output);
        failures += out.status();
    }

    if let Err(e) = std::fs::remove_file(&mkdocs_path) {
        debug!(
            path = %mkdocs_path.display(),
            error = %e,
            "Could not remove generated mkdocs config"
        );
    }

    if failures == 0 {
        info!(step = "documentation", title = %site.title, "Documentation built");
        Ok(SiteBuild::Built { site, logs })
    } else {
        Ok(SiteBuild::Failed { logs })
    }
}

/// Removes the built site when dropped, whatever the publish outcome.
struct BuiltSite(PathBuf);

impl Drop for BuiltSite {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0) {
            debug!(path = %self.0.display(), error = %e, "Could not remove built site");
        }
    }
}

/// Mirror the built `site/` into the documentation repository.
///
/// Returns the publication log. Only a missing or unwritable SSH key is
/// reported as an error message; git failures are recorded in the log.
/// The local `site/` is removed on every path.
pub async fn publish_site(
    runner: &dyn CommandRunner,
    workdir: &Path,
    docs: &DocsPublishConfig,
    site: &SiteMetadata,
) -> std::result::Result<String, String> {
    let built = BuiltSite(workdir.join(SITE_DIR));

    let key = docs
        .ssh_private_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| "No SSH private key configured, cannot publish documentation".to_string())?;
    install_ssh_key(&docs.ssh_key_path, key).map_err(|e| {
        format!(
            "Could not write SSH key to {}: {}",
            docs.ssh_key_path.display(),
            e
        )
    })?;

    let mut logs = String::new();
    let ssh_command = docs.git_ssh_command();
    let git = |dir: &Path| {
        CommandSpec::new("git")
            .current_dir(dir)
            .env("GIT_SSH_COMMAND", ssh_command.clone())
    };

    let scratch =
        tempfile::tempdir().map_err(|e| format!("Could not create clone directory: {}", e))?;
    let clone_dir = scratch.path().join("docs");

    run_logged(
        runner,
        &mut logs,
        git(scratch.path())
            .arg("clone")
            .arg(docs.repository_url.as_str())
            .arg(clone_dir.display().to_string()),
    )
    .await;

    let target = clone_dir.join(site.publish_dir_name());
    if target.exists() {
        if let Err(e) = std::fs::remove_dir_all(&target) {
            note_fs_error(&mut logs, "remove previous documentation", &target, &e);
        }
    }
    if let Err(e) = copy_dir_all(&built.0, &target) {
        note_fs_error(&mut logs, "copy built site", &built.0, &e);
    }

    let email = format!("{}@users.noreply.github.com", docs.author);
    run_logged(runner, &mut logs, git(&clone_dir).args(["add", "--all"])).await;
    run_logged(
        runner,
        &mut logs,
        git(&clone_dir)
            .arg("-c")
            .arg(format!("user.name={}", docs.author))
            .arg("-c")
            .arg(format!("user.email={}", email))
            .args(["commit", "-m"])
            .arg(format!("docs: update {}", site.title)),
    )
    .await;
    run_logged(runner, &mut logs, git(&clone_dir).arg("push")).await;

    Ok(logs)
}

/// Build, then publish when a documentation repository is configured.
///
/// Without a documentation repository the step is skipped.
pub async fn run_documentation(
    runner: &dyn CommandRunner,
    config: &ReportConfig,
) -> Result<StepResult> {
    let Some(docs) = config.docs.as_ref() else {
        info!(step = "documentation", "No documentation repository, ignoring");
        return Ok(StepResult::new(
            StepKind::Documentation,
            StepStatus::Skipped,
            "No documentation repository configured.\nIgnoring",
        ));
    };

    let start = Instant::now();
    let (site, mut logs) = match build_site(runner, &config.workdir).await? {
        SiteBuild::Built { site, logs } => (site, logs),
        SiteBuild::Failed { logs } => {
            return Ok(StepResult::new(StepKind::Documentation, StepStatus::Failed, logs)
                .with_elapsed(start.elapsed()));
        }
    };

    let status = match publish_site(runner, &config.workdir, docs, &site).await {
        Ok(publish_logs) => {
            logs.push_str(&publish_logs);
            logs.push_str(&format!(
                "\nPublished \"{}\" to {}",
                site.title, docs.repository_url
            ));
            StepStatus::Passed
        }
        Err(reason) => {
            warn!(step = "documentation", %reason, "Documentation not published");
            logs.push_str(&reason);
            StepStatus::Failed
        }
    };

    Ok(StepResult::new(StepKind::Documentation, status, logs).with_elapsed(start.elapsed()))
}

async fn run_logged(runner: &dyn CommandRunner, logs: &mut String, spec: CommandSpec) {
    logs.push_str(&format!("~$ {}\n", spec));
    let out = runner.run(&spec).await;
    if !out.succeeded() {
        debug!(command = %spec, exit_code = ?out.exit_code, "Publish command failed");
    }
    logs.push_str(&out.output);
}

fn note_fs_error(logs: &mut String, action: &str, path: &Path, err: &std::io::Error) {
    warn!(path = %path.display(), error = %err, "Could not {}", action);
    logs.push_str(&format!("Could not {} ({}): {}\n", action, path.display(), err));
}

/// Write the key with owner-only permissions, creating its directory.
fn install_ssh_key(path: &Path, key: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut contents = key.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    std::fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn copy_dir_all(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest: PathBuf = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
