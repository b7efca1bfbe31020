mod flatten;
mod lookup;
mod membership;


use std::sync::Arc;

use auditum_core::{AppError, AppResult};
use auditum_domain::FlatGroupMap;
use tokio::sync::OnceCell;

use crate::DirectoryClient;

/// Flattened directory tree shared by every query of one resolver.
#[derive(Debug)]
struct DirectorySnapshot {
    /// Every node, hidden ones included.
    all: FlatGroupMap,
    /// Nodes visible to callers.
    visible: FlatGroupMap,
}

/// Per-request view of the external directory.
///
/// The group tree is fetched and flattened on first use and kept for the
/// lifetime of the resolver. Build a new resolver to observe directory changes.
pub struct DirectoryResolver {
    client: Arc<dyn DirectoryClient>,
    realm: String,
    snapshot: OnceCell<DirectorySnapshot>,
}

impl DirectoryResolver {
    /// Creates a resolver over a directory client for one realm.
    #[must_use]
    pub fn new(client: Arc<dyn DirectoryClient>, realm: impl Into<String>) -> Self {
        Self {
            client,
            realm: realm.into(),
            snapshot: OnceCell::new(),
        }
    }

    /// Returns the realm name used for the synthetic root.
    #[must_use]
    pub fn realm(&self) -> &str {
        self.realm.as_str()
    }

    /// Returns every visible node of the flattened tree.
    pub async fn flat_groups(&self) -> AppResult<FlatGroupMap> {
        Ok(self.snapshot().await?.visible.clone())
    }

    /// Returns every node including hidden ones.
    ///
    /// Only meant for diagnostics; hidden nodes must not reach API consumers.
    pub async fn flat_groups_with_hidden(&self) -> AppResult<FlatGroupMap> {
        Ok(self.snapshot().await?.all.clone())
    }

    pub(crate) async fn visible_tree(&self) -> AppResult<&FlatGroupMap> {
        Ok(&self.snapshot().await?.visible)
    }

    pub(crate) async fn full_tree(&self) -> AppResult<&FlatGroupMap> {
        Ok(&self.snapshot().await?.all)
    }

    async fn snapshot(&self) -> AppResult<&DirectorySnapshot> {
        self.snapshot
            .get_or_try_init(|| async {
                let all = self.build_flat_map().await?;
                let visible = all.visible();
                Ok::<_, AppError>(DirectorySnapshot { all, visible })
            })
            .await
    }
}
