use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, info, warn};

use super::{OrderedMap, StorageError, StoreLimits};

/// JSON file-backed ordered map store.
///
/// Keeps a `BTreeMap<String, V>` in memory and rewrites the whole file on
/// every mutation. A write goes to a sibling `.tmp` file which is synced and
/// renamed over the data file, so the file always holds either the previous
/// or the new contents. A failed write rolls the in-memory change back.
#[derive(Clone)]
pub struct JsonMapStore<V> {
    inner: Arc<RwLock<BTreeMap<String, V>>>,
    file_path: PathBuf,
    limits: StoreLimits,
}

impl<V> JsonMapStore<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open the store at `path`, creating an empty file if missing.
    ///
    /// An unreadable or undecodable file is an error rather than an empty map.
    pub async fn new<P: Into<PathBuf>>(path: P, limits: StoreLimits) -> Result<Arc<Self>, StorageError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let map: BTreeMap<String, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let empty = BTreeMap::new();
                write_atomic(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(e.into()),
        };

        info!(path = %file_path.display(), entries = map.len(), "opened json map store");
        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path, limits }))
    }

    pub fn path(&self) -> &Path { &self.file_path }
}

#[async_trait]
impl<V> OrderedMap<V> for JsonMapStore<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    async fn values(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    async fn items(&self) -> Vec<(String, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    async fn insert(&self, key: String, value: V) -> Result<Option<V>, StorageError> {
        self.limits.check(&key, &value)?;

        let mut map = self.inner.write().await;
        let previous = map.insert(key.clone(), value);
        if let Err(e) = write_atomic(&self.file_path, &map).await {
            let _ = match previous {
                Some(old) => map.insert(key, old),
                None => map.remove(&key),
            };
            return Err(e);
        }
        debug!(%key, replaced = previous.is_some(), "persisted insert");
        Ok(previous)
    }

    async fn remove(&self, key: &str) -> Result<Option<V>, StorageError> {
        let mut map = self.inner.write().await;
        let Some(removed) = map.remove(key) else {
            return Ok(None);
        };
        if let Err(e) = write_atomic(&self.file_path, &map).await {
            map.insert(key.to_string(), removed);
            return Err(e);
        }
        debug!(%key, "persisted remove");
        Ok(Some(removed))
    }
}

async fn write_atomic<V: Serialize>(path: &Path, map: &BTreeMap<String, V>) -> Result<(), StorageError> {
    let data = serde_json::to_vec(map)?;
    let tmp = tmp_path(path);

    let written = match write_synced(&tmp, &data).await {
        Ok(()) => fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    // the rename has landed, so a failed directory sync must not undo the write
    #[cfg(unix)]
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = sync_dir(dir).await {
            warn!(dir = %dir.display(), error = %e, "directory fsync failed after rename");
        }
    }
    Ok(())
}

async fn write_synced(tmp: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
