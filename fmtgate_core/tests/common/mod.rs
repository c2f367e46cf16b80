#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{ErrorClass, ErrorCode, IndexAddOption, Repository as GitRepository};
use tempfile::TempDir;

/// Scratch git work tree built through libgit2.
pub struct Fixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub repo: GitRepository,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical root");
        let repo = GitRepository::init(&root).expect("init repository");
        Self {
            _temp: temp,
            root,
            repo,
        }
    }

    pub fn write(&self, path: &str, contents: &str) {
        write_file(self.root.join(path), contents);
    }

    pub fn remove(&self, path: &str) {
        fs::remove_file(self.root.join(path)).expect("remove file");
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root.join(path)).expect("read file")
    }

    pub fn stage(&self, path: &str) {
        let mut index = self.repo.index().expect("index");
        index.add_path(Path::new(path)).expect("stage path");
        index.write().expect("write index");
    }

    pub fn commit_all(&self, message: &str) -> git2::Oid {
        let parent = match self.repo.head() {
            Ok(reference) => Some(reference.peel_to_commit().expect("head commit")),
            Err(err)
                if matches!(
                    (err.class(), err.code()),
                    (
                        ErrorClass::Reference,
                        ErrorCode::NotFound | ErrorCode::UnbornBranch
                    )
                ) =>
            {
                None
            }
            Err(err) => panic!("unexpected head error: {err}"),
        };

        let mut index = self.repo.index().expect("index");
        index
            .add_all(["*"], IndexAddOption::DEFAULT, None)
            .expect("add all");
        index.update_all(["*"], None).expect("update all");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("write tree");
        let tree = self.repo.find_tree(tree_id).expect("find tree");
        let signature = git2::Signature::now("Test User", "test@example.com").expect("signature");

        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(
                Some("HEAD"),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )
            .expect("commit")
    }
}

pub fn write_file(path: impl AsRef<Path>, contents: &str) {
    fs::create_dir_all(
        path.as_ref()
            .parent()
            .expect("path should have a parent directory"),
    )
    .expect("create directories");
    fs::write(path, contents).expect("write file");
}
