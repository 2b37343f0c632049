//! End-to-end build pipeline: install → discover → build each → index.
//!
//! Every fatal condition aborts the run before the index is written, so a
//! failed run never leaves a partial `index.json` behind.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, instrument};

use docbuild_shared::{
    AppConfig, DEFAULT_BACKEND, DocBuildError, DocumentEntry, ProjectDescriptor, Result,
};

use crate::builder::{BuildResult, Generator};
use crate::extract::extract_project_name;
use crate::history;
use crate::index::{IndexBuilder, document_path, write_index};
use crate::install::{InstallSource, install_generator};

/// Configuration for a [`run`].
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repository root; index paths are recorded relative to it.
    pub repo_root: PathBuf,
    /// Directory searched for manifests.
    pub projects_dir: PathBuf,
    /// Manifest file name (e.g., `pyxis.toml`).
    pub manifest_name: String,
    /// Base directory receiving one subdirectory per project.
    pub output_dir: PathBuf,
    /// Backend passed to the generator.
    pub backend: String,
    /// Artifact file name read after each JSON build.
    pub artifact_name: String,
    /// Index file name inside `output_dir`.
    pub index_file: String,
    /// Install the generator first, if set.
    pub install: Option<InstallSource>,
}

impl RunConfig {
    /// Resolve paths from the loaded config. `backend` overrides the configured one.
    ///
    /// The JSON backend writes into the configured docs directory; any other
    /// backend writes into a directory named after itself.
    pub fn resolve(repo_root: &Path, config: &AppConfig, backend: Option<&str>) -> Self {
        let backend = backend.unwrap_or(&config.generator.backend).to_string();
        let output_dir = if backend == DEFAULT_BACKEND {
            repo_root.join(&config.layout.docs_dir)
        } else {
            repo_root.join(&backend)
        };

        Self {
            repo_root: repo_root.to_path_buf(),
            projects_dir: repo_root.join(&config.layout.projects_dir),
            manifest_name: config.layout.manifest.clone(),
            output_dir,
            backend,
            artifact_name: config.generator.artifact.clone(),
            index_file: config.layout.index_file.clone(),
            install: None,
        }
    }

    /// Only the JSON backend yields artifacts we can index.
    pub fn produces_index(&self) -> bool {
        self.backend == DEFAULT_BACKEND
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(&self.index_file)
    }
}

/// Result of a successful [`run`].
#[derive(Debug)]
pub struct RunSummary {
    /// Number of projects built.
    pub projects_built: usize,
    /// Where the index was written, if the backend produces one.
    pub index_path: Option<PathBuf>,
    /// Number of entries in the index.
    pub documents: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called before `cargo install` runs. The installer owns the terminal
    /// until the next callback, so reporters must not draw here.
    fn install_started(&self, source: &InstallSource);
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each project is built.
    fn project_started(&self, project: &ProjectDescriptor, current: usize, total: usize);
    /// Called with the generator's diagnostics when a build fails.
    fn build_failed(&self, project: &ProjectDescriptor, result: &BuildResult);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn install_started(&self, _source: &InstallSource) {}
    fn phase(&self, _name: &str) {}
    fn project_started(&self, _project: &ProjectDescriptor, _current: usize, _total: usize) {}
    fn build_failed(&self, _project: &ProjectDescriptor, _result: &BuildResult) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full pipeline.
///
/// 1. Install the generator (optional)
/// 2. Discover manifests
/// 3. Build each project, extracting its name and last commit time
/// 4. Write the index (JSON backend only)
#[instrument(skip_all, fields(projects = %config.projects_dir.display(), backend = %config.backend))]
pub async fn run<G: Generator>(
    config: &RunConfig,
    generator: &G,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();

    // --- Phase 1: Install ---
    if let Some(source) = &config.install {
        progress.install_started(source);
        install_generator(source).await?;
    }

    // --- Phase 2: Discover ---
    progress.phase("Discovering projects");
    let manifests = docbuild_discovery::find_manifests(&config.projects_dir, &config.manifest_name);
    if manifests.is_empty() {
        return Err(DocBuildError::NoManifests {
            dir: config.projects_dir.clone(),
            manifest: config.manifest_name.clone(),
        });
    }
    let projects = docbuild_discovery::describe_projects(&config.projects_dir, &manifests);

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| DocBuildError::io(&config.output_dir, e))?;

    // --- Phase 3: Build each ---
    progress.phase("Building projects");
    let mut index = IndexBuilder::new();
    let total = projects.len();

    for (i, project) in projects.iter().enumerate() {
        progress.project_started(project, i + 1, total);
        if let Some(entry) = build_project(config, generator, project, progress).await? {
            index.push(project.output_name.clone(), entry);
        }
    }

    // --- Phase 4: Index ---
    let documents = index.len();
    let index_path = if config.produces_index() {
        progress.phase("Writing index");
        let path = config.index_path();
        write_index(&path, &index.finish())?;
        Some(path)
    } else {
        None
    };

    let summary = RunSummary {
        projects_built: total,
        index_path,
        documents,
        elapsed: start.elapsed(),
    };

    info!(
        projects = summary.projects_built,
        documents = summary.documents,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "build complete"
    );
    progress.done(&summary);

    Ok(summary)
}

/// Build one project and, for the JSON backend, collect its index entry.
#[instrument(skip_all, fields(project = %project.output_name))]
async fn build_project<G: Generator>(
    config: &RunConfig,
    generator: &G,
    project: &ProjectDescriptor,
    progress: &dyn ProgressReporter,
) -> Result<Option<DocumentEntry>> {
    let dest = config.output_dir.join(&project.output_name);
    info!(
        source = %project.source_dir.display(),
        dest = %dest.display(),
        "building project"
    );

    let result = generator
        .build(&project.source_dir, &dest, &config.backend)
        .await;
    if !result.passed() {
        error!(exit_code = ?result.exit_code, "generator failed");
        progress.build_failed(project, &result);
        return Err(DocBuildError::BuildFailed {
            source_dir: project.source_dir.clone(),
        });
    }

    if !config.produces_index() {
        return Ok(None);
    }

    let artifact = dest.join(&config.artifact_name);
    if !artifact.is_file() {
        return Err(DocBuildError::MissingArtifact { path: artifact });
    }

    let name = extract_project_name(&artifact);
    if name.is_empty() {
        return Err(DocBuildError::MissingProjectName { path: artifact });
    }

    let last_modified = history::last_modified(&project.source_dir).await;

    Ok(Some(DocumentEntry {
        name,
        path: document_path(&config.repo_root, &artifact),
        last_modified,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use docbuild_shared::IndexDocument;

    /// Writes `output.json` with a name looked up by project directory name.
    #[derive(Default)]
    struct FakeGenerator {
        names: HashMap<String, String>,
        /// Raw artifact bodies overriding `names`.
        artifacts: HashMap<String, String>,
        fail: Option<String>,
        skip_artifact: bool,
        calls: Mutex<Vec<(PathBuf, PathBuf, String)>>,
    }

    impl FakeGenerator {
        fn with_names(names: &[(&str, &str)]) -> Self {
            Self {
                names: names
                    .iter()
                    .map(|(dir, name)| (dir.to_string(), name.to_string()))
                    .collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(PathBuf, PathBuf, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Generator for FakeGenerator {
        async fn build(&self, source: &Path, dest: &Path, backend: &str) -> BuildResult {
            self.calls.lock().unwrap().push((
                source.to_path_buf(),
                dest.to_path_buf(),
                backend.to_string(),
            ));

            let dir = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if self.fail.as_deref() == Some(dir.as_str()) {
                return BuildResult {
                    success: false,
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: format!("error: cannot parse {dir}\n"),
                };
            }

            std::fs::create_dir_all(dest).unwrap();
            if !self.skip_artifact {
                let body = match self.artifacts.get(&dir) {
                    Some(raw) => raw.clone(),
                    None => serde_json::json!({
                        "project_name": self.names.get(&dir).cloned().unwrap_or(dir.clone()),
                    })
                    .to_string(),
                };
                std::fs::write(dest.join("output.json"), body).unwrap();
            }

            BuildResult {
                success: true,
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }
        }
    }

    /// Records build failures so tests can check diagnostics were surfaced.
    #[derive(Default)]
    struct RecordingProgress {
        failures: Mutex<Vec<String>>,
        started: Mutex<Vec<String>>,
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn install_started(&self, source: &InstallSource) {
            self.events.lock().unwrap().push(format!("install {source}"));
        }
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase {name}"));
        }
        fn project_started(&self, project: &ProjectDescriptor, _current: usize, _total: usize) {
            self.started.lock().unwrap().push(project.output_name.clone());
        }
        fn build_failed(&self, _project: &ProjectDescriptor, result: &BuildResult) {
            self.failures.lock().unwrap().push(result.diagnostics());
        }
        fn done(&self, _summary: &RunSummary) {}
    }

    fn temp_repo() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "docbuild-pipeline-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(dir.join("projects")).unwrap();
        dir
    }

    fn add_project(repo: &Path, rel: &str) {
        let dir = repo.join("projects").join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("pyxis.toml"), "[project]\n").unwrap();
    }

    fn config_for(repo: &Path) -> RunConfig {
        RunConfig::resolve(repo, &AppConfig::default(), None)
    }

    fn read_index(path: &Path) -> IndexDocument {
        let content = std::fs::read_to_string(path).expect("read index");
        serde_json::from_str(&content).expect("parse index")
    }

    #[test]
    fn resolve_picks_output_dir_by_backend() {
        let root = PathBuf::from("/repo");
        let config = AppConfig::default();

        let json = RunConfig::resolve(&root, &config, None);
        assert_eq!(json.output_dir, root.join("docs"));
        assert_eq!(json.projects_dir, root.join("projects"));
        assert_eq!(json.index_path(), root.join("docs/index.json"));
        assert!(json.produces_index());

        let cpp = RunConfig::resolve(&root, &config, Some("cpp"));
        assert_eq!(cpp.output_dir, root.join("cpp"));
        assert!(!cpp.produces_index());
    }

    #[tokio::test]
    async fn two_projects_produce_ordered_index() {
        let repo = temp_repo();
        add_project(&repo, "b");
        add_project(&repo, "a");
        let config = config_for(&repo);
        let generator = FakeGenerator::with_names(&[("a", "A"), ("b", "B")]);

        let before = Utc::now() - chrono::Duration::seconds(1);
        let summary = run(&config, &generator, &SilentProgress)
            .await
            .expect("run");
        let after = Utc::now() + chrono::Duration::seconds(1);

        assert_eq!(summary.projects_built, 2);
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.index_path.as_deref(), Some(config.index_path().as_path()));

        let index = read_index(&config.index_path());
        let names: Vec<&str> = index.docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(index.docs[0].path, "docs/a/output.json");
        assert_eq!(index.docs[1].path, "docs/b/output.json");
        // Temp dirs carry no git history.
        assert!(index.docs.iter().all(|d| d.last_modified.is_none()));
        assert!(index.generated_at >= before && index.generated_at <= after);

        let calls = generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, repo.join("projects/a"));
        assert_eq!(calls[0].1, repo.join("docs/a"));
        assert_eq!(calls[0].2, "json");

        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn nested_projects_are_flattened_and_sorted() {
        let repo = temp_repo();
        add_project(&repo, "zeta");
        add_project(&repo, "game/editor");
        add_project(&repo, "game");
        let config = config_for(&repo);
        let generator = FakeGenerator::default();
        let progress = RecordingProgress::default();

        run(&config, &generator, &progress).await.expect("run");

        let started = progress.started.lock().unwrap().clone();
        assert_eq!(started, vec!["game", "game_editor", "zeta"]);

        let index = read_index(&config.index_path());
        let paths: Vec<&str> = index.docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "docs/game/output.json",
                "docs/game_editor/output.json",
                "docs/zeta/output.json"
            ]
        );
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn build_failure_aborts_without_index() {
        let repo = temp_repo();
        add_project(&repo, "a");
        add_project(&repo, "b");
        add_project(&repo, "c");
        let config = config_for(&repo);
        let generator = FakeGenerator {
            fail: Some("b".into()),
            ..Default::default()
        };
        let progress = RecordingProgress::default();

        let err = run(&config, &generator, &progress).await.unwrap_err();
        assert!(matches!(err, DocBuildError::BuildFailed { .. }));
        assert!(!config.index_path().exists());

        // The run stops at the failing project.
        assert_eq!(generator.calls().len(), 2);
        let failures = progress.failures.lock().unwrap().clone();
        assert_eq!(failures, vec!["error: cannot parse b\n".to_string()]);

        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn failure_leaves_previous_index_untouched() {
        let repo = temp_repo();
        add_project(&repo, "a");
        let config = config_for(&repo);
        std::fs::create_dir_all(&config.output_dir).unwrap();
        std::fs::write(config.index_path(), "previous").unwrap();

        let generator = FakeGenerator {
            fail: Some("a".into()),
            ..Default::default()
        };
        assert!(run(&config, &generator, &SilentProgress).await.is_err());
        assert_eq!(
            std::fs::read_to_string(config.index_path()).unwrap(),
            "previous"
        );
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn empty_project_name_aborts() {
        let repo = temp_repo();
        add_project(&repo, "a");
        add_project(&repo, "b");
        let config = config_for(&repo);
        let mut generator = FakeGenerator::default();
        generator.artifacts.insert("b".into(), "{}".into());

        let err = run(&config, &generator, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, DocBuildError::MissingProjectName { .. }));
        assert!(!config.index_path().exists());
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn invalid_artifact_json_aborts() {
        let repo = temp_repo();
        add_project(&repo, "a");
        let config = config_for(&repo);
        let mut generator = FakeGenerator::default();
        generator.artifacts.insert("a".into(), "not json".into());

        let err = run(&config, &generator, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, DocBuildError::MissingProjectName { .. }));
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn missing_artifact_aborts() {
        let repo = temp_repo();
        add_project(&repo, "a");
        let config = config_for(&repo);
        let generator = FakeGenerator {
            skip_artifact: true,
            ..Default::default()
        };

        let err = run(&config, &generator, &SilentProgress).await.unwrap_err();
        match err {
            DocBuildError::MissingArtifact { path } => {
                assert_eq!(path, repo.join("docs/a/output.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn no_manifests_is_fatal() {
        let repo = temp_repo();
        let config = config_for(&repo);
        let generator = FakeGenerator::default();

        let err = run(&config, &generator, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, DocBuildError::NoManifests { .. }));
        assert!(generator.calls().is_empty());
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn other_backend_builds_without_index() {
        let repo = temp_repo();
        add_project(&repo, "a");
        add_project(&repo, "b");
        let config = RunConfig::resolve(&repo, &AppConfig::default(), Some("cpp"));
        let generator = FakeGenerator {
            skip_artifact: true,
            ..Default::default()
        };

        let summary = run(&config, &generator, &SilentProgress)
            .await
            .expect("run");
        assert_eq!(summary.projects_built, 2);
        assert_eq!(summary.documents, 0);
        assert!(summary.index_path.is_none());
        assert!(repo.join("cpp").is_dir());
        assert!(!repo.join("cpp/index.json").exists());

        let calls = generator.calls();
        assert_eq!(calls[1].1, repo.join("cpp/b"));
        assert!(calls.iter().all(|(_, _, backend)| backend == "cpp"));
        std::fs::remove_dir_all(&repo).ok();
    }

    #[tokio::test]
    async fn install_runs_before_any_phase_is_drawn() {
        let repo = temp_repo();
        add_project(&repo, "a");
        let mut config = config_for(&repo);
        config.install = Some(InstallSource::Path(repo.join("no-such-checkout")));
        let generator = FakeGenerator::with_names(&[("a", "A")]);
        let progress = RecordingProgress::default();

        let err = run(&config, &generator, &progress).await.unwrap_err();
        assert!(matches!(err, DocBuildError::Install(_)), "{err:?}");

        let events = progress.events.lock().unwrap().clone();
        assert_eq!(events.len(), 1, "{events:?}");
        assert!(events[0].starts_with("install "), "{events:?}");
        assert!(generator.calls().is_empty());
        assert!(!config.index_path().exists());
        std::fs::remove_dir_all(&repo).ok();
    }
}
