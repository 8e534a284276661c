// ============================================================
// Layer 6 - Artifact Store
// ============================================================
// Versioned, all-or-nothing persistence of artifact bundles.
//
// Layout under the model directory:
//
//   models/
//     bundles/
//       bundle-<uuid>.json    ← one complete bundle per training run
//     CURRENT                 ← uuid of the published bundle
//
// Publishing a bundle:
//   1. write bundles/bundle-<uuid>.json.tmp, fsync
//   2. rename it to bundles/bundle-<uuid>.json
//   3. write CURRENT.<uuid>.tmp, fsync
//   4. rename it over CURRENT         ← the atomic publish point
//   5. prune all bundles except the new one and the one CURRENT
//      pointed to before, so an in-flight reader can finish
//
// A reader resolves CURRENT once and then reads one file, so it
// sees either the old bundle or the new one, never a mix.
//
// The store knows nothing about what is inside a bundle beyond
// running `validate` after a load.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::traits::RegressionModel;
use crate::domain::AgriError;
use crate::ml::bundle::ArtifactBundle;

const BUNDLE_DIR: &str = "bundles";
const POINTER: &str = "CURRENT";

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// A store rooted at `dir`. Nothing is created until the first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn bundle_path(&self, version: &Uuid) -> PathBuf {
        self.dir.join(BUNDLE_DIR).join(format!("bundle-{version}.json"))
    }

    /// Version currently published, if any.
    pub fn current_version(&self) -> Result<Option<Uuid>, AgriError> {
        let text = match fs::read_to_string(self.dir.join(POINTER)) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let version = Uuid::parse_str(text.trim()).map_err(|e| {
            AgriError::InconsistentBundle(format!("CURRENT pointer is not a version id: {e}"))
        })?;
        Ok(Some(version))
    }

    /// Write a bundle and publish it as the current one.
    pub fn save<M: Serialize>(&self, bundle: &ArtifactBundle<M>) -> Result<(), AgriError> {
        let version = bundle.meta.version;
        fs::create_dir_all(self.dir.join(BUNDLE_DIR))?;
        let previous = self.current_version().ok().flatten();

        let path = self.bundle_path(&version);
        let tmp = path.with_extension("json.tmp");
        write_synced(&tmp, &serde_json::to_vec(bundle)?)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!("Wrote bundle '{}'", path.display());

        let pointer_tmp = self.dir.join(format!("{POINTER}.{version}.tmp"));
        write_synced(&pointer_tmp, version.to_string().as_bytes())?;
        fs::rename(&pointer_tmp, self.dir.join(POINTER))?;
        tracing::info!("Published artifact bundle {}", version);

        self.prune(&version, previous.as_ref())
    }

    /// Load and validate the published bundle.
    ///
    /// Fails with `ArtifactMissing` when nothing has been published or the
    /// published file is gone.
    pub fn load<M>(&self) -> Result<ArtifactBundle<M>, AgriError>
    where
        M: RegressionModel + DeserializeOwned,
    {
        let version = self.current_version()?.ok_or(AgriError::ArtifactMissing)?;
        let bytes = match fs::read(self.bundle_path(&version)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AgriError::ArtifactMissing)
            }
            Err(e) => return Err(e.into()),
        };
        let bundle: ArtifactBundle<M> = serde_json::from_slice(&bytes)?;
        if bundle.meta.version != version {
            return Err(AgriError::InconsistentBundle(format!(
                "CURRENT names {version} but the file holds {}",
                bundle.meta.version
            )));
        }
        bundle.validate()?;
        tracing::debug!("Loaded bundle {} ({} features)", version, bundle.feature_order.len());
        Ok(bundle)
    }

    /// Versions of every complete bundle on disk, unordered.
    pub fn versions(&self) -> Result<Vec<Uuid>, AgriError> {
        let dir = self.dir.join(BUNDLE_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            let parsed = name
                .to_str()
                .and_then(|n| n.strip_prefix("bundle-"))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|id| Uuid::parse_str(id).ok());
            if let Some(v) = parsed {
                versions.push(v);
            }
        }
        Ok(versions)
    }

    fn prune(&self, current: &Uuid, previous: Option<&Uuid>) -> Result<(), AgriError> {
        for version in self.versions()? {
            if &version == current || Some(&version) == previous {
                continue;
            }
            match fs::remove_file(self.bundle_path(&version)) {
                Ok(()) => tracing::debug!("Pruned bundle {}", version),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Could not prune bundle {}: {}", version, e),
            }
        }
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), AgriError> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::CategoricalEncoder;
    use crate::data::scaler::FeatureScaler;
    use crate::ml::bundle::{BundleMeta, FeatureOrder};
    use crate::ml::model::LinearRegressor;
    use crate::ml::trainer::TrainConfig;
    use ndarray::array;
    use tempfile::TempDir;

    fn bundle() -> ArtifactBundle {
        let x = array![[1.0], [2.0], [3.0]];
        let mut model = LinearRegressor::default();
        model.fit(&x, &array![2.0, 4.0, 6.0]).unwrap();
        ArtifactBundle {
            meta: BundleMeta::new(TrainConfig::default(), 0.9),
            feature_order: FeatureOrder::new(vec!["rain".into()]),
            encoder: CategoricalEncoder::default(),
            scaler: FeatureScaler::fit(&x).unwrap(),
            model,
        }
    }

    #[test]
    fn test_load_before_save_is_artifact_missing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.load::<LinearRegressor>().unwrap_err();
        assert!(matches!(err, AgriError::ArtifactMissing));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let saved = bundle();
        store.save(&saved).unwrap();

        let loaded: ArtifactBundle = store.load().unwrap();
        assert_eq!(loaded.meta, saved.meta);
        assert_eq!(loaded.feature_order, saved.feature_order);
        assert_eq!(loaded.model, saved.model);
        assert_eq!(store.current_version().unwrap(), Some(saved.meta.version));
    }

    #[test]
    fn test_deleted_bundle_file_is_artifact_missing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let b = bundle();
        store.save(&b).unwrap();
        fs::remove_file(store.bundle_path(&b.meta.version)).unwrap();
        assert!(matches!(store.load::<LinearRegressor>(), Err(AgriError::ArtifactMissing)));
    }

    #[test]
    fn test_keeps_current_and_previous_only() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let runs: Vec<_> = (0..3).map(|_| bundle()).collect();
        for b in &runs {
            store.save(b).unwrap();
        }
        let mut kept = store.versions().unwrap();
        kept.sort();
        let mut expected = vec![runs[1].meta.version, runs[2].meta.version];
        expected.sort();
        assert_eq!(kept, expected);

        let loaded: ArtifactBundle = store.load().unwrap();
        assert_eq!(loaded.meta.version, runs[2].meta.version);
    }

    #[test]
    fn test_inconsistent_bundle_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut b = bundle();
        b.feature_order = FeatureOrder::new(vec!["rain".into(), "extra".into()]);
        store.save(&b).unwrap();
        assert!(matches!(
            store.load::<LinearRegressor>(),
            Err(AgriError::InconsistentBundle(_))
        ));
    }

    #[test]
    fn test_encoder_without_categories_is_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let b = bundle();
        store.save(&b).unwrap();

        let path = store.bundle_path(&b.meta.version);
        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        json["encoder"]["columns"] = serde_json::json!([{ "column": "crop", "categories": [] }]);
        fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();

        assert!(matches!(
            store.load::<LinearRegressor>(),
            Err(AgriError::InconsistentBundle(_))
        ));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&bundle()).unwrap();
        let stray = fs::read_dir(dir.path())
            .unwrap()
            .chain(fs::read_dir(dir.path().join(BUNDLE_DIR)).unwrap())
            .filter(|e| e.as_ref().unwrap().path().extension().map_or(false, |x| x == "tmp"))
            .count();
        assert_eq!(stray, 0);
    }
}
