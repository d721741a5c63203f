//! End-to-end indexing behavior with a stub indexer

mod fixtures;

use fixtures::{files_with_extension, files_with_prefix, StubRunner, Workspace, SAMPLE_D2V};
use mediaidx::index::{IndexKind, IndexOutcome, Indexer, IndexingPolicy, ManifestStore, ToolLocator};
use mediaidx::utils::LogSink;
use mediaidx::IndexError;
use std::fs;
use std::path::PathBuf;

fn indexer(kind: IndexKind, runner: &StubRunner) -> Indexer<StubRunner> {
    Indexer::with_runner(kind, runner.clone(), ToolLocator::with_search_path(""))
}

fn cached_policy(ws: &Workspace, kind: IndexKind) -> IndexingPolicy {
    IndexingPolicy::new(kind).cache_dir(ws.cache()).tool_dir(ws.tools())
}

fn created(outcome: IndexOutcome) -> PathBuf {
    match outcome {
        IndexOutcome::Created(path) => path,
        other => panic!("expected Created, got {:?}", other),
    }
}

#[test]
fn test_first_call_creates_manifest_second_call_reuses() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = indexer(IndexKind::D2v, &runner);
    let policy = cached_policy(&ws, IndexKind::D2v);
    let mut log = LogSink::new();

    let first = created(indexer.index(&source, &policy, &mut log).unwrap());
    assert_eq!(runner.calls(), 1);

    let ns = ws.cache().join("indexing").join("show");
    assert_eq!(first.parent().unwrap(), ns);
    assert_eq!(first.extension().unwrap(), "d2v");
    assert_eq!(files_with_prefix(&ns, "d2vlist").len(), 1);

    let manifest = ManifestStore::new(&ns, IndexKind::D2v);
    let entries = manifest.load(&manifest.find().unwrap(), &mut log);
    assert_eq!(entries.get("clip.mpg"), Some(&first));

    let second = indexer.index(&source, &policy, &mut log).unwrap();
    assert_eq!(second, IndexOutcome::Reused(first));
    assert_eq!(runner.calls(), 1);
    assert!(!log.has_errors());
}

#[test]
fn test_d2v_command_line() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let runner = StubRunner::new(IndexKind::D2v);
    let mut log = LogSink::new();

    let artifact = created(
        indexer(IndexKind::D2v, &runner)
            .index(&source, &cached_policy(&ws, IndexKind::D2v), &mut log)
            .unwrap(),
    );

    let command = runner.last_command().unwrap();
    assert_eq!(command.program, ws.tools().join("d2vwitch"));
    let args: Vec<String> = command
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        args,
        vec![
            "--input-range".to_string(),
            "limited".to_string(),
            "--single-input".to_string(),
            "--output".to_string(),
            artifact.display().to_string(),
            source.display().to_string(),
        ]
    );
}

#[test]
fn test_forced_regeneration_allocates_new_name() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = indexer(IndexKind::D2v, &runner);
    let policy = cached_policy(&ws, IndexKind::D2v).reuse(false);
    let mut log = LogSink::new();

    let first = created(indexer.index(&source, &policy, &mut log).unwrap());
    let second = created(indexer.index(&source, &policy, &mut log).unwrap());
    assert_eq!(runner.calls(), 2);
    assert_ne!(first, second);

    // the manifest follows the newest artifact, and reuse picks it up
    let reused = indexer
        .index(&source, &policy.clone().reuse(true), &mut log)
        .unwrap();
    assert_eq!(reused, IndexOutcome::Reused(second));
    assert_eq!(runner.calls(), 2);

    let ns = ws.cache().join("indexing").join("show");
    assert_eq!(files_with_prefix(&ns, "d2vlist").len(), 1);
}

#[test]
fn test_deleted_artifact_is_regenerated() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = indexer(IndexKind::D2v, &runner);
    let policy = cached_policy(&ws, IndexKind::D2v);
    let mut log = LogSink::new();

    let first = created(indexer.index(&source, &policy, &mut log).unwrap());
    fs::remove_file(&first).unwrap();

    let second = created(indexer.index(&source, &policy, &mut log).unwrap());
    assert_eq!(runner.calls(), 2);
    assert_ne!(first, second);
    assert!(second.is_file());

    let ns = ws.cache().join("indexing").join("show");
    let store = ManifestStore::new(&ns, IndexKind::D2v);
    let entries = store.load(&store.find().unwrap(), &mut log);
    assert_eq!(entries.get("clip.mpg"), Some(&second));
}

#[test]
fn test_single_manifest_after_many_updates() {
    let ws = Workspace::new();
    let runner = StubRunner::new(IndexKind::FfIndex);
    let indexer = indexer(IndexKind::FfIndex, &runner);
    let policy = cached_policy(&ws, IndexKind::FfIndex);
    let mut log = LogSink::new();

    let mut artifacts = Vec::new();
    for i in 0..8 {
        let source = ws.source("season1", &format!("ep{}.mkv", i));
        artifacts.push(created(indexer.index(&source, &policy, &mut log).unwrap()));
    }

    let ns = ws.cache().join("indexing").join("season1");
    let manifests = files_with_prefix(&ns, "ffindexlist");
    assert_eq!(manifests.len(), 1);

    let store = ManifestStore::new(&ns, IndexKind::FfIndex);
    let entries = store.load(&manifests[0], &mut log);
    assert_eq!(entries.len(), 8);
    assert_eq!(entries.get("ep3.mkv"), Some(&artifacts[3]));
    assert_eq!(files_with_extension(&ns, "ffindex").len(), 8);
}

#[test]
fn test_kinds_keep_separate_manifests() {
    let ws = Workspace::new();
    let mpg = ws.source("mixed", "a.mpg");
    let mkv = ws.source("mixed", "b.mkv");
    let mut log = LogSink::new();

    let d2v_runner = StubRunner::new(IndexKind::D2v);
    let ff_runner = StubRunner::new(IndexKind::FfIndex);
    indexer(IndexKind::D2v, &d2v_runner)
        .index(&mpg, &cached_policy(&ws, IndexKind::D2v), &mut log)
        .unwrap();
    indexer(IndexKind::FfIndex, &ff_runner)
        .index(&mkv, &cached_policy(&ws, IndexKind::FfIndex), &mut log)
        .unwrap();

    let ns = ws.cache().join("indexing").join("mixed");
    assert_eq!(files_with_prefix(&ns, "d2vlist").len(), 1);
    assert_eq!(files_with_prefix(&ns, "ffindexlist").len(), 1);
}

#[test]
fn test_parent_directories_get_separate_namespaces() {
    let ws = Workspace::new();
    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = indexer(IndexKind::D2v, &runner);
    let policy = cached_policy(&ws, IndexKind::D2v);
    let mut log = LogSink::new();

    let a = created(indexer.index(&ws.source("show_a", "ep.mpg"), &policy, &mut log).unwrap());
    let b = created(indexer.index(&ws.source("show_b", "ep.mpg"), &policy, &mut log).unwrap());

    assert_eq!(a.parent().unwrap(), ws.cache().join("indexing").join("show_a"));
    assert_eq!(b.parent().unwrap(), ws.cache().join("indexing").join("show_b"));
    assert_eq!(runner.calls(), 2);
}

#[test]
fn test_co_located_path_is_deterministic() {
    let ws = Workspace::new();
    let source = ws.source("films", "movie.ts");
    let expected = source.with_extension("ffindex");
    let runner = StubRunner::new(IndexKind::FfIndex);
    let indexer = indexer(IndexKind::FfIndex, &runner);
    let policy = IndexingPolicy::new(IndexKind::FfIndex).tool_dir(ws.tools());
    let mut log = LogSink::new();

    assert_eq!(
        indexer.index(&source, &policy, &mut log).unwrap(),
        IndexOutcome::Created(expected.clone())
    );
    assert_eq!(
        indexer.index(&source, &policy, &mut log).unwrap(),
        IndexOutcome::Reused(expected.clone())
    );
    assert_eq!(runner.calls(), 1);

    let forced = policy.reuse(false);
    assert_eq!(
        indexer.index(&source, &forced, &mut log).unwrap(),
        IndexOutcome::Created(expected)
    );
    assert_eq!(runner.calls(), 2);

    // nothing is written to the cache in co-located mode
    assert!(!ws.cache().join("indexing").exists());
}

#[test]
fn test_full_range_is_patched_on_create_and_reuse() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = indexer(IndexKind::D2v, &runner);
    let full =
        cached_policy(&ws, IndexKind::D2v).tool_options("--input-range full --single-input");
    let mut log = LogSink::new();

    let artifact = created(indexer.index(&source, &full, &mut log).unwrap());
    let patched = fs::read_to_string(&artifact).unwrap();
    assert!(patched.contains("YUVRGB_Scale=0\n"));
    assert_eq!(patched.len(), SAMPLE_D2V.len());

    // reusing with the same range leaves the file alone
    indexer.index(&source, &full, &mut log).unwrap();
    assert_eq!(fs::read_to_string(&artifact).unwrap(), patched);

    // reusing with limited flips it back
    let limited = cached_policy(&ws, IndexKind::D2v);
    assert_eq!(
        indexer.index(&source, &limited, &mut log).unwrap(),
        IndexOutcome::Reused(artifact.clone())
    );
    assert_eq!(fs::read_to_string(&artifact).unwrap(), SAMPLE_D2V);
    assert_eq!(runner.calls(), 1);
}

#[test]
fn test_tool_not_found_before_any_write() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let empty_path = tempfile::tempdir().unwrap();
    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = Indexer::with_runner(
        IndexKind::D2v,
        runner.clone(),
        ToolLocator::with_search_path(empty_path.path().as_os_str()),
    );
    let policy = IndexingPolicy::new(IndexKind::D2v).cache_dir(ws.cache());
    let mut log = LogSink::new();

    let err = indexer.index(&source, &policy, &mut log).unwrap_err();
    assert!(matches!(err, IndexError::ToolNotFound { ref tool } if tool == "d2vwitch"));
    assert_eq!(runner.calls(), 0);
    assert_eq!(fs::read_dir(ws.cache()).unwrap().count(), 0);
}

#[test]
fn test_invalid_tool_dir() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let runner = StubRunner::new(IndexKind::D2v);
    let policy = IndexingPolicy::new(IndexKind::D2v)
        .cache_dir(ws.cache())
        .tool_dir(ws.root.path().join("media"));
    let mut log = LogSink::new();

    let err = indexer(IndexKind::D2v, &runner)
        .index(&source, &policy, &mut log)
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidToolPath { .. }));
    assert_eq!(fs::read_dir(ws.cache()).unwrap().count(), 0);
}

#[test]
fn test_invalid_source_and_cache_dir() {
    let ws = Workspace::new();
    let runner = StubRunner::new(IndexKind::FfIndex);
    let indexer = indexer(IndexKind::FfIndex, &runner);
    let mut log = LogSink::new();

    let missing = ws.root.path().join("media").join("nope.mkv");
    let err = indexer
        .index(&missing, &cached_policy(&ws, IndexKind::FfIndex), &mut log)
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidSource(_)));

    let source = ws.source("show", "clip.mkv");
    let policy = cached_policy(&ws, IndexKind::FfIndex).cache_dir(ws.root.path().join("no_cache"));
    let err = indexer.index(&source, &policy, &mut log).unwrap_err();
    assert!(matches!(err, IndexError::InvalidDirectory(_)));
    assert_eq!(runner.calls(), 0);
}

#[test]
fn test_failing_tool_leaves_manifest_untouched() {
    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    let good = StubRunner::new(IndexKind::D2v);
    let policy = cached_policy(&ws, IndexKind::D2v);
    let mut log = LogSink::new();

    let first = created(indexer(IndexKind::D2v, &good).index(&source, &policy, &mut log).unwrap());
    let ns = ws.cache().join("indexing").join("show");
    let before = files_with_prefix(&ns, "d2vlist");

    let bad = StubRunner::failing(IndexKind::D2v);
    let outcome = indexer(IndexKind::D2v, &bad)
        .index(&source, &policy.clone().reuse(false), &mut log)
        .unwrap();
    assert_eq!(outcome, IndexOutcome::Failed);
    assert!(outcome.path().is_none());
    assert!(log.has_errors());
    assert!(log.contains("error while indexing"));

    assert_eq!(files_with_prefix(&ns, "d2vlist"), before);
    let store = ManifestStore::new(&ns, IndexKind::D2v);
    let entries = store.load(&before[0], &mut log);
    assert_eq!(entries.get("clip.mpg"), Some(&first));
}

#[cfg(unix)]
#[test]
fn test_symlinked_source_co_located_next_to_link() {
    let ws = Workspace::new();
    let target = ws.source("store", "abc123.ts");
    let films = ws.root.path().join("media").join("films");
    fs::create_dir_all(&films).unwrap();
    let link = films.join("movie.ts");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let runner = StubRunner::new(IndexKind::FfIndex);
    let policy = IndexingPolicy::new(IndexKind::FfIndex).tool_dir(ws.tools());
    let mut log = LogSink::new();

    let outcome = indexer(IndexKind::FfIndex, &runner)
        .index(&link, &policy, &mut log)
        .unwrap();
    assert_eq!(outcome, IndexOutcome::Created(films.join("movie.ffindex")));
    assert!(!target.with_extension("ffindex").exists());

    let command = runner.last_command().unwrap();
    assert_eq!(PathBuf::from(&command.args[1]), link);
}

#[cfg(unix)]
#[test]
fn test_symlinked_source_keyed_by_link_name() {
    let ws = Workspace::new();
    let target = ws.source("store", "abc123.mpg");
    let show = ws.root.path().join("media").join("show");
    fs::create_dir_all(&show).unwrap();
    let link = show.join("clip.mpg");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let runner = StubRunner::new(IndexKind::D2v);
    let indexer = indexer(IndexKind::D2v, &runner);
    let policy = cached_policy(&ws, IndexKind::D2v);
    let mut log = LogSink::new();

    let artifact = created(indexer.index(&link, &policy, &mut log).unwrap());
    let ns = ws.cache().join("indexing").join("show");
    assert_eq!(artifact.parent().unwrap(), ns);
    assert!(!ws.cache().join("indexing").join("store").exists());

    let store = ManifestStore::new(&ns, IndexKind::D2v);
    let entries = store.load(&store.find().unwrap(), &mut log);
    assert_eq!(entries.get("clip.mpg"), Some(&artifact));
    assert!(!entries.contains_key("abc123.mpg"));

    assert_eq!(
        indexer.index(&link, &policy, &mut log).unwrap(),
        IndexOutcome::Reused(artifact)
    );
    assert_eq!(runner.calls(), 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_manifest_write_failure_still_returns_artifact() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let ws = Workspace::new();
    let source = ws.source("show", "clip.mpg");
    // artifact paths under this directory cannot be stored as JSON strings
    let cache = ws.root.path().join(OsStr::from_bytes(b"cache\xff"));
    fs::create_dir(&cache).unwrap();

    let runner = StubRunner::new(IndexKind::D2v);
    let policy = IndexingPolicy::new(IndexKind::D2v)
        .cache_dir(&cache)
        .tool_dir(ws.tools());
    let mut log = LogSink::new();

    let artifact = created(
        indexer(IndexKind::D2v, &runner)
            .index(&source, &policy, &mut log)
            .unwrap(),
    );
    assert!(artifact.is_file());
    assert!(log.has_errors());
    assert!(log.contains("failed to store updated manifest"));

    let ns = cache.join("indexing").join("show");
    let store = ManifestStore::new(&ns, IndexKind::D2v);
    let manifests = store.list();
    assert_eq!(manifests.len(), 1);
    assert!(store.load(&manifests[0], &mut log).is_empty());
}
