//! Shared helpers for integration tests

#![allow(dead_code)]

use mediaidx::index::{IndexKind, ToolCommand, ToolRunner};
use mediaidx::utils::LogSink;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Header of a d2vwitch project file, limited range
pub const SAMPLE_D2V: &str = concat!(
    "DGIndexProjectFile16\n1\nclip.mpg\n\n",
    "Stream_Type=1\nMPEG_Type=2\niDCT_Algorithm=6\n",
    "YUVRGB_Scale=1\nLuminance_Filter=0,0\nClipping=0,0,0,0\nAspect_Ratio=16:9\n",
);

pub const SAMPLE_FFINDEX: &[u8] = b"FFMSINDEX\x00\x01\x02";

/// Stand-in for an indexer: writes a sample artifact and counts runs
#[derive(Clone)]
pub struct StubRunner {
    kind: IndexKind,
    succeed: bool,
    calls: Rc<Cell<usize>>,
    commands: Rc<RefCell<Vec<ToolCommand>>>,
}

impl StubRunner {
    pub fn new(kind: IndexKind) -> Self {
        Self {
            kind,
            succeed: true,
            calls: Rc::new(Cell::new(0)),
            commands: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A runner whose tool exits non-zero without writing anything
    pub fn failing(kind: IndexKind) -> Self {
        Self {
            succeed: false,
            ..Self::new(kind)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_command(&self) -> Option<ToolCommand> {
        self.commands.borrow().last().cloned()
    }

    fn artifact_arg(&self, command: &ToolCommand) -> PathBuf {
        let n = command.args.len();
        let index = match self.kind {
            IndexKind::D2v => n - 2,
            IndexKind::FfIndex => n - 1,
        };
        PathBuf::from(&command.args[index])
    }
}

impl ToolRunner for StubRunner {
    fn run(&self, command: &ToolCommand, log: &mut LogSink) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.commands.borrow_mut().push(command.clone());
        if !self.succeed {
            log.error("stub indexer exited with status 1");
            return false;
        }

        let artifact = self.artifact_arg(command);
        let written = match self.kind {
            IndexKind::D2v => fs::write(&artifact, SAMPLE_D2V),
            IndexKind::FfIndex => fs::write(&artifact, SAMPLE_FFINDEX),
        };
        written.is_ok()
    }
}

/// Scratch layout: `media/` for sources, `cache/` for artifacts, `tools/` for executables
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        for dir in ["media", "cache", "tools"] {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        for kind in IndexKind::ALL {
            fs::write(root.path().join("tools").join(kind.tool_name()), b"").unwrap();
        }
        Self { root }
    }

    pub fn cache(&self) -> PathBuf {
        self.root.path().join("cache")
    }

    pub fn tools(&self) -> PathBuf {
        self.root.path().join("tools")
    }

    /// Create `media/<dir>/<name>` with some bytes and return its canonical path
    pub fn source(&self, dir: &str, name: &str) -> PathBuf {
        let parent = self.root.path().join("media").join(dir);
        fs::create_dir_all(&parent).unwrap();
        let path = parent.join(name);
        fs::write(&path, b"\x00\x00\x01\xba").unwrap();
        path.canonicalize().unwrap()
    }
}

/// Files in `dir` whose names start with `prefix`
pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort();
    names
}

/// Files in `dir` with the given extension
pub fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == ext))
        .collect();
    paths.sort();
    paths
}
