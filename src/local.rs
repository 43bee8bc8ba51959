use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::domain::{BranchFilter, Category, Record, RecordDraft, RecordId};
use crate::error::RosterError;
use crate::store::{DirectoryStore, TransferRequest};

/// Filesystem implementation of the directory store: one JSON file per
/// record under `<root>/members|visitors/`, transfer requests under
/// `<root>/transfers/`. Writes are atomic (temp file + rename). Used for
/// offline operation and integration tests.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: Utf8PathBuf,
}

impl LocalStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// `./.flock-rm` when present, otherwise the per-user data directory.
    pub fn resolve_default() -> Result<Self, RosterError> {
        let cwd = std::env::current_dir().map_err(|err| RosterError::Filesystem(err.to_string()))?;
        let project_root = Utf8PathBuf::from_path_buf(cwd.join(".flock-rm"))
            .map_err(|_| RosterError::Filesystem("invalid project path".to_string()))?;
        if project_root.as_std_path().exists() {
            return Ok(Self::new(project_root));
        }
        let user_root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.data_dir().join("flock-rm")).ok()
            })
            .ok_or_else(|| {
                RosterError::Filesystem("unable to resolve data directory".to_string())
            })?;
        Ok(Self::new(user_root))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> Utf8PathBuf {
        let dir = match category {
            Category::Member => "members",
            Category::Visitor => "visitors",
        };
        self.root.join(dir)
    }

    pub fn record_path(&self, category: Category, id: &RecordId) -> Utf8PathBuf {
        self.category_dir(category).join(format!("{id}.json"))
    }

    pub fn transfers_dir(&self) -> Utf8PathBuf {
        self.root.join("transfers")
    }

    pub fn ensure_layout(&self) -> Result<(), RosterError> {
        for dir in [
            self.category_dir(Category::Member),
            self.category_dir(Category::Visitor),
            self.transfers_dir(),
        ] {
            fs::create_dir_all(dir.as_std_path())
                .map_err(|err| RosterError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }

    fn load_category(&self, category: Category) -> Result<Vec<Record>, RosterError> {
        let dir = self.category_dir(category);
        if !dir.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        let entries =
            fs::read_dir(dir.as_std_path()).map_err(|err| RosterError::Filesystem(err.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|err| RosterError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().map(|ext| ext != "json").unwrap_or(true) {
                continue;
            }
            let content = fs::read_to_string(&path)
                .map_err(|err| RosterError::Filesystem(err.to_string()))?;
            let record: Record = serde_json::from_str(&content)
                .map_err(|err| RosterError::Filesystem(err.to_string()))?;
            records.push(record);
        }
        // directory iteration order is platform-dependent; id order is the
        // stable directory order callers rely on
        records.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(records)
    }

    fn next_id(&self, category: Category, taken: &[RecordId]) -> RecordId {
        let prefix = match category {
            Category::Member => "M",
            Category::Visitor => "V",
        };
        let next = taken
            .iter()
            .filter_map(|id| id.as_str().strip_prefix(&format!("{prefix}-")))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        format!("{prefix}-{next:04}")
            .parse()
            .expect("generated id is well-formed")
    }

    fn write_json_atomic<T: serde::Serialize>(
        path: &Utf8Path,
        value: &T,
    ) -> Result<(), RosterError> {
        let parent = path
            .parent()
            .ok_or_else(|| RosterError::Filesystem("invalid record path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| RosterError::Filesystem(err.to_string()))?;
        let content = serde_json::to_vec_pretty(value)
            .map_err(|err| RosterError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("flock-rm")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| RosterError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), &content).map_err(|err| RosterError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| RosterError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

impl DirectoryStore for LocalStore {
    fn query_records(
        &self,
        category: Category,
        branch: &BranchFilter,
    ) -> Result<Vec<Record>, RosterError> {
        let records = self.load_category(category)?;
        Ok(match branch {
            BranchFilter::All => records,
            BranchFilter::Branch(branch) => records
                .into_iter()
                .filter(|record| record.branch_id == *branch)
                .collect(),
        })
    }

    fn write_record(&self, category: Category, record: &Record) -> Result<Record, RosterError> {
        let path = self.record_path(category, &record.id);
        if !path.as_std_path().exists() {
            return Err(RosterError::RecordNotFound(record.id.to_string()));
        }
        Self::write_json_atomic(&path, record)?;
        Ok(record.clone())
    }

    /// All-or-nothing per chunk: every draft is serialized and assigned an id
    /// before the first file is written, and a mid-chunk failure rolls back
    /// the files already written.
    fn write_batch(&self, category: Category, drafts: &[RecordDraft]) -> Result<(), RosterError> {
        self.ensure_layout()?;
        let existing = self.load_category(category)?;
        let mut taken: Vec<RecordId> = existing.into_iter().map(|record| record.id).collect();

        let mut staged: Vec<(Utf8PathBuf, Record)> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = self.next_id(category, &taken);
            taken.push(id.clone());
            let record = draft.clone().into_record(id.clone());
            staged.push((self.record_path(category, &id), record));
        }

        let mut written: Vec<Utf8PathBuf> = Vec::with_capacity(staged.len());
        for (path, record) in &staged {
            if let Err(err) = Self::write_json_atomic(path, record) {
                for path in &written {
                    let _ = fs::remove_file(path.as_std_path());
                }
                return Err(err);
            }
            written.push(path.clone());
        }
        Ok(())
    }

    fn create_transfer_request(&self, request: &TransferRequest) -> Result<(), RosterError> {
        self.ensure_layout()?;
        let dir = self.transfers_dir();
        let entries =
            fs::read_dir(dir.as_std_path()).map_err(|err| RosterError::Filesystem(err.to_string()))?;
        let count = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .count();
        let path = dir.join(format!("TR-{:04}.json", count + 1));
        Self::write_json_atomic(&path, request)
    }
}
