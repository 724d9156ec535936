//! Platform-independent bookkeeping for asset preloading.
//!
//! The loader never touches the DOM. It hands out [`LoadRequest`]s and the
//! platform reports back through [`AssetLoader::asset_loaded`] /
//! [`AssetLoader::image_loaded`] whenever a resource becomes usable.
//!
//! ```text
//!  register_*  ──► Unloaded ──load_all──► Loading ──notification──► Loaded
//!                                                        │
//!                             counter == total ──► on_all_loaded() (once)
//! ```
use super::Size;
use crate::error::GameError;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Sound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub key: String,
    pub kind: AssetKind,
    pub source: String,
    pub status: LoadStatus,
    /// natural image size, only known for loaded images
    pub size: Option<Size>,
}

/// What the platform has to fetch, in registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub key: String,
    pub kind: AssetKind,
    pub source: String,
}

type Finished = Box<dyn FnOnce()>;

#[derive(Default)]
pub struct AssetLoader {
    // a Vec keeps registration order explicit, lookups are over a dozen items
    assets: Vec<Asset>,
    loaded: usize,
    started: bool,
    on_all_loaded: Option<Finished>,
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_image(&mut self, key: &str, source: &str) -> Result<()> {
        self.register(AssetKind::Image, key, source)
    }

    pub fn register_sound(&mut self, key: &str, source: &str) -> Result<()> {
        self.register(AssetKind::Sound, key, source)
    }

    fn register(&mut self, kind: AssetKind, key: &str, source: &str) -> Result<()> {
        if self.started {
            return Err(GameError::LoaderStarted.into());
        }
        if self.find(kind, key).is_some() {
            return Err(GameError::DuplicateAsset {
                key: key.to_string(),
            }
            .into());
        }
        self.assets.push(Asset {
            key: key.to_string(),
            kind,
            source: source.to_string(),
            status: LoadStatus::Unloaded,
            size: None,
        });
        Ok(())
    }

    /// Moves every registered asset to `Loading` and returns the requests the
    /// platform must issue. `on_all_loaded` runs exactly once, when the last
    /// pending asset reports in (immediately if nothing was registered).
    pub fn load_all<F>(&mut self, on_all_loaded: F) -> Result<Vec<LoadRequest>>
    where
        F: FnOnce() + 'static,
    {
        if self.started {
            return Err(GameError::LoaderStarted.into());
        }
        self.started = true;

        let requests = self
            .assets
            .iter_mut()
            .map(|asset| {
                asset.status = LoadStatus::Loading;
                LoadRequest {
                    key: asset.key.clone(),
                    kind: asset.kind,
                    source: asset.source.clone(),
                }
            })
            .collect();

        self.on_all_loaded = Some(Box::new(on_all_loaded));
        if self.assets.is_empty() {
            self.finish();
        }
        Ok(requests)
    }

    /// Marks an asset as loaded. Returns `false` when the notification was
    /// ignored (unknown key, not loading yet, or a duplicate).
    pub fn asset_loaded(&mut self, kind: AssetKind, key: &str) -> bool {
        let Some(asset) = self.find_mut(kind, key) else {
            log::warn!("load notification for unregistered {:?} '{}'", kind, key);
            return false;
        };
        if asset.status != LoadStatus::Loading {
            return false;
        }
        asset.status = LoadStatus::Loaded;
        self.loaded += 1;
        log::debug!(
            "loaded {:?} '{}' ({}/{})",
            kind,
            key,
            self.loaded,
            self.assets.len()
        );

        if self.loaded == self.assets.len() {
            self.finish();
        }
        true
    }

    /// Image variant of [`Self::asset_loaded`] which also records the natural size
    pub fn image_loaded(&mut self, key: &str, size: Size) -> bool {
        if let Some(asset) = self.find_mut(AssetKind::Image, key) {
            if asset.status == LoadStatus::Loading {
                asset.size = Some(size);
            }
        }
        self.asset_loaded(AssetKind::Image, key)
    }

    fn finish(&mut self) {
        if let Some(on_all_loaded) = self.on_all_loaded.take() {
            log::info!("all {} assets loaded", self.assets.len());
            on_all_loaded();
        }
    }

    pub fn total(&self) -> usize {
        self.assets.len()
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn pending(&self) -> usize {
        self.assets.len() - self.loaded
    }

    pub fn is_complete(&self) -> bool {
        self.started && self.pending() == 0
    }

    pub fn pending_keys(&self) -> impl Iterator<Item = &str> {
        self.assets
            .iter()
            .filter(|asset| asset.status != LoadStatus::Loaded)
            .map(|asset| asset.key.as_str())
    }

    /// `Some(AssetLoadStall)` while anything is still outstanding.
    /// There is no timeout: a resource that never reports keeps this `Some` forever.
    pub fn stall_report(&self) -> Option<GameError> {
        if self.is_complete() {
            return None;
        }
        Some(GameError::AssetLoadStall {
            pending: self.pending_keys().map(str::to_string).collect(),
        })
    }

    pub fn get(&self, kind: AssetKind, key: &str) -> Option<&Asset> {
        self.find(kind, key)
    }

    pub fn image_size(&self, key: &str) -> Result<Size> {
        self.find(AssetKind::Image, key)
            .and_then(|asset| asset.size)
            .ok_or_else(|| {
                GameError::UnknownAsset {
                    key: key.to_string(),
                }
                .into()
            })
    }

    fn find(&self, kind: AssetKind, key: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|asset| asset.kind == kind && asset.key == key)
    }

    fn find_mut(&mut self, kind: AssetKind, key: &str) -> Option<&mut Asset> {
        self.assets
            .iter_mut()
            .find(|asset| asset.kind == kind && asset.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn three_assets() -> AssetLoader {
        let mut loader = AssetLoader::new();
        loader.register_image("sky", "img/sky.png").unwrap();
        loader.register_image("grass", "img/grass.png").unwrap();
        loader.register_sound("bg", "sounds/bg.mp3").unwrap();
        loader
    }

    fn counting_callback() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        (calls, move || counter.set(counter.get() + 1))
    }

    #[test]
    fn load_all_returns_requests_in_registration_order() {
        let mut loader = three_assets();
        let requests = loader.load_all(|| {}).unwrap();

        let keys: Vec<_> = requests.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["sky", "grass", "bg"]);
        assert_eq!(requests[2].kind, AssetKind::Sound);
        assert_eq!(
            loader.get(AssetKind::Image, "sky").unwrap().status,
            LoadStatus::Loading
        );
    }

    #[test]
    fn callback_fires_once_after_last_asset() {
        let mut loader = three_assets();
        let (calls, callback) = counting_callback();
        loader.load_all(callback).unwrap();

        assert!(loader.image_loaded("sky", Size::new(800.0, 480.0)));
        assert!(loader.asset_loaded(AssetKind::Sound, "bg"));
        assert_eq!(calls.get(), 0);
        assert_eq!(loader.pending(), 1);

        assert!(loader.image_loaded("grass", Size::new(32.0, 32.0)));
        assert_eq!(calls.get(), 1);

        // duplicate events from the platform are ignored
        assert!(!loader.image_loaded("grass", Size::new(32.0, 32.0)));
        assert!(!loader.asset_loaded(AssetKind::Sound, "bg"));
        assert_eq!(calls.get(), 1);
        assert_eq!(loader.loaded(), 3);
        assert!(loader.is_complete());
    }

    #[test]
    fn image_and_sound_keys_live_in_separate_namespaces() {
        let mut loader = AssetLoader::new();
        loader.register_image("bg", "img/bg.png").unwrap();
        loader.register_sound("bg", "sounds/bg.mp3").unwrap();
        let (calls, callback) = counting_callback();
        loader.load_all(callback).unwrap();

        loader.asset_loaded(AssetKind::Sound, "bg");
        assert_eq!(calls.get(), 0);
        loader.image_loaded("bg", Size::new(10.0, 10.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn notifications_before_load_all_are_ignored() {
        let mut loader = three_assets();
        assert!(!loader.asset_loaded(AssetKind::Image, "sky"));
        assert!(!loader.asset_loaded(AssetKind::Image, "missing"));
        assert_eq!(loader.loaded(), 0);
    }

    #[test]
    fn registration_is_closed_once_loading_starts() {
        let mut loader = three_assets();
        let err = loader.register_image("sky", "again.png").unwrap_err();
        assert_eq!(
            err.downcast_ref::<GameError>(),
            Some(&GameError::DuplicateAsset { key: "sky".into() })
        );

        loader.load_all(|| {}).unwrap();
        let err = loader.register_sound("late", "late.mp3").unwrap_err();
        assert_eq!(err.downcast_ref::<GameError>(), Some(&GameError::LoaderStarted));
        assert!(loader.load_all(|| {}).is_err());
    }

    #[test]
    fn empty_loader_completes_immediately() {
        let mut loader = AssetLoader::new();
        let (calls, callback) = counting_callback();
        let requests = loader.load_all(callback).unwrap();
        assert!(requests.is_empty());
        assert_eq!(calls.get(), 1);
        assert!(loader.stall_report().is_none());
    }

    #[test]
    fn stall_report_lists_outstanding_assets() {
        let mut loader = three_assets();
        loader.load_all(|| {}).unwrap();
        loader.image_loaded("sky", Size::new(1.0, 1.0));

        assert_eq!(
            loader.stall_report(),
            Some(GameError::AssetLoadStall {
                pending: vec!["grass".to_string(), "bg".to_string()]
            })
        );
    }

    #[test]
    fn image_size_is_known_only_after_load() {
        let mut loader = three_assets();
        loader.load_all(|| {}).unwrap();
        assert!(loader.image_size("sky").is_err());

        loader.image_loaded("sky", Size::new(1600.0, 480.0));
        assert_eq!(loader.image_size("sky").unwrap(), Size::new(1600.0, 480.0));
    }
}
