//! Folder-tree uploads.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use stowage_core::result::AppResult;
use stowage_core::types::FolderId;
use stowage_entity::file::FileItem;
use stowage_entity::folder::Folder;

use crate::context::AuthContext;
use crate::folder::FolderService;
use crate::upload::{self, UploadItem, UploadOutcome};

/// Name of the folder created for a flat multi-file upload.
pub const UPLOADED_FOLDER_NAME: &str = "Uploaded Folder";

/// Name of the folder created by an empty folder upload.
pub const NEW_FOLDER_NAME: &str = "New Folder";

/// A directory plus the folder row behind it (None at the user root).
type Slot = (PathBuf, Option<FolderId>);

struct Placement {
    item: UploadItem,
    segments: Vec<String>,
}

impl FolderService {
    /// Uploads a directory tree described by relative paths.
    ///
    /// - No files: one empty folder named `root_name` (or "New Folder").
    /// - One file without separators: a plain file upload.
    /// - Several files without separators: grouped into one new folder.
    /// - Otherwise each distinct top-level segment becomes a new uniquified
    ///   folder; deeper segments reuse existing folders of the same name.
    ///
    /// Paths are validated before anything is written.
    pub async fn upload_folder(
        &self,
        ctx: &AuthContext,
        items: Vec<UploadItem>,
        parent: Option<FolderId>,
        root_name: Option<&str>,
    ) -> AppResult<UploadOutcome> {
        let root_name = root_name.map(str::trim).filter(|n| !n.is_empty());

        if items.is_empty() {
            let folder = self
                .create_folder(ctx, root_name.unwrap_or(NEW_FOLDER_NAME), parent)
                .await?;
            return Ok(UploadOutcome {
                folders: vec![folder],
                ..UploadOutcome::default()
            });
        }

        let mut placements = Vec::with_capacity(items.len());
        for item in items {
            let segments = upload::relative_segments(item.path())?;
            placements.push(Placement { item, segments });
        }

        let nested = placements.iter().any(|p| p.segments.len() > 1);
        if !nested && placements.len() == 1 {
            let items = placements.into_iter().map(|p| p.item).collect();
            return self.files.upload_files(ctx, items, parent).await;
        }

        let flat_name = if nested {
            None
        } else {
            Some(upload::validate_component(
                root_name.unwrap_or(UPLOADED_FOLDER_NAME),
                "Folder",
            )?)
        };

        let target = self.engine.paths.resolve_parent_path(ctx.user_id, parent).await?;
        let total = placements.iter().map(|p| p.item.size_mb()).sum();
        self.engine.quota.check(ctx.user_id, total).await?;

        let mut outcome = UploadOutcome::default();
        let mut tree = TreeBuilder::new((target.path.clone(), target.folder_id()));

        if let Some(base) = flat_name {
            let root = self
                .create_unique(ctx.user_id, &target.path, target.folder_id(), &base)
                .await?;
            tree.base = (PathBuf::from(&root.path), Some(root.id));
            outcome.folders.push(root);
        }

        for placement in &placements {
            match self.place(ctx, &mut tree, placement, &mut outcome.folders).await {
                Ok(Some(file)) => outcome.stored(file),
                Ok(None) => {}
                Err(err) => outcome.failed(placement.item.path(), &err),
            }
        }

        self.engine.quota.commit(ctx.user_id, outcome.added_mb).await?;

        info!(
            user_id = %ctx.user_id,
            folders = outcome.folders.len(),
            files = outcome.files.len(),
            failed = outcome.failures.len(),
            added_mb = %outcome.added_mb,
            "Folder uploaded"
        );
        Ok(outcome)
    }

    /// Resolve the directories for one file and write it.
    ///
    /// Empty files still get their folders but are rejected.
    async fn place(
        &self,
        ctx: &AuthContext,
        tree: &mut TreeBuilder,
        placement: &Placement,
        created: &mut Vec<Folder>,
    ) -> AppResult<Option<FileItem>> {
        let Some((file_name, dirs)) = placement.segments.split_last() else {
            return Ok(None);
        };

        let (dir, folder_id) = match dirs.split_first() {
            Some((top, rest)) => {
                let root = self.top_level(ctx, tree, top, created).await?;
                self.descend(ctx, tree, root, rest, created).await?
            }
            None => tree.base.clone(),
        };

        if placement.item.data.is_empty() {
            return Err(upload::empty_file());
        }

        if !tree.siblings.contains_key(&folder_id) {
            let names = self
                .engine
                .catalog
                .file_sibling_names(ctx.user_id, folder_id, None)
                .await?;
            tree.siblings.insert(folder_id, names);
        }
        let siblings = tree.siblings.entry(folder_id).or_default();

        let file = upload::store_file(
            &self.engine,
            ctx.user_id,
            &dir,
            folder_id,
            file_name,
            placement.item.data.clone(),
            siblings,
        )
        .await?;
        Ok(Some(file))
    }

    /// The uniquified folder standing in for a top-level segment.
    async fn top_level(
        &self,
        ctx: &AuthContext,
        tree: &mut TreeBuilder,
        name: &str,
        created: &mut Vec<Folder>,
    ) -> AppResult<Slot> {
        let key = name.to_lowercase();
        if let Some(slot) = tree.roots.get(&key) {
            return Ok(slot.clone());
        }

        let name = upload::validate_component(name, "Folder")?;
        let (base_dir, base_id) = tree.base.clone();
        let root = self
            .create_unique(ctx.user_id, &base_dir, base_id, &name)
            .await?;
        let slot = (PathBuf::from(&root.path), Some(root.id));
        tree.roots.insert(key, slot.clone());
        created.push(root);
        Ok(slot)
    }

    /// Walk intermediate segments, reusing same-named folders (ignoring case).
    async fn descend(
        &self,
        ctx: &AuthContext,
        tree: &mut TreeBuilder,
        start: Slot,
        segments: &[String],
        created: &mut Vec<Folder>,
    ) -> AppResult<Slot> {
        let mut slot = start;
        for segment in segments {
            let key = (slot.1, segment.to_lowercase());
            if let Some(known) = tree.intermediates.get(&key) {
                slot = known.clone();
                continue;
            }

            let name = upload::validate_component(segment, "Folder")?;
            let (folder, is_new) = self
                .ensure_child(ctx.user_id, &slot.0, slot.1, &name)
                .await?;
            let next = (PathBuf::from(&folder.path), Some(folder.id));
            if is_new {
                created.push(folder);
            }
            tree.intermediates.insert(key, next.clone());
            slot = next;
        }
        Ok(slot)
    }
}

/// Folders and sibling names resolved so far during one upload.
struct TreeBuilder {
    base: Slot,
    roots: HashMap<String, Slot>,
    intermediates: HashMap<(Option<FolderId>, String), Slot>,
    siblings: HashMap<Option<FolderId>, Vec<String>>,
}

impl TreeBuilder {
    fn new(base: Slot) -> Self {
        Self {
            base,
            roots: HashMap::new(),
            intermediates: HashMap::new(),
            siblings: HashMap::new(),
        }
    }
}
