/// In-memory stores: the calculation cache and the equipment inventory
use crate::domain::{EquipmentInventory, Observer, Planet};
use crate::errors::{ApiResult, AstroError};
use crate::utils::start_of_day;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// What a cached value was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalculationKind {
    SunTimes,
    EnhancedSunTimes,
    Moon,
    Planet(Planet),
    SunPath { interval_minutes: u32 },
}

/// Instant rounded to the minute, coordinates to 0.001 degree (about 110 m),
/// elevation to the metre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CalculationKind,
    pub minute: i64,
    pub lat_milli: i64,
    pub lon_milli: i64,
    pub elevation_m: i64,
}

impl CacheKey {
    pub fn new(kind: CalculationKind, instant: DateTime<Utc>, observer: &Observer) -> Self {
        Self {
            kind,
            minute: (instant.timestamp() as f64 / 60.0).round() as i64,
            lat_milli: (observer.latitude * 1000.0).round() as i64,
            lon_milli: (observer.longitude * 1000.0).round() as i64,
            elevation_m: observer.elevation_meters.round() as i64,
        }
    }

    pub fn for_date(kind: CalculationKind, date: NaiveDate, observer: &Observer) -> Self {
        Self::new(kind, start_of_day(date), observer)
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

impl CacheEntry {
    fn live<T: Any + Send + Sync>(&self, now: Instant) -> Option<Arc<T>> {
        if self.expires_at <= now {
            return None;
        }
        // A value of another type under the same key counts as a miss
        self.value.clone().downcast::<T>().ok()
    }
}

/// Per-key cell; its lock is held while the value is computed
type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// TTL cache of calculation results keyed by kind, time and place.
///
/// The map lock only guards slot lookup. Check-compute-insert runs under the
/// key's own slot lock, so a key is computed at most once per TTL while
/// other keys proceed. A compute closure must not read its own key.
#[derive(Default)]
pub struct CalculationCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl CalculationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: CacheKey) -> Slot {
        self.slots.lock().entry(key).or_default().clone()
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let slot = self.slots.lock().get(key).cloned()?;
        let entry = slot.lock();
        entry.as_ref()?.live(Instant::now())
    }

    /// Insert or overwrite; last write wins
    pub fn put<T: Any + Send + Sync>(&self, key: CacheKey, value: T, ttl: Duration) -> Arc<T> {
        let value = Arc::new(value);
        *self.slot(key).lock() = Some(CacheEntry {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        value
    }

    /// Cached value for `key`, computing and storing it on a miss. Errors are
    /// returned to the caller and never cached.
    pub fn get_or_try_insert_with<T, F>(&self, key: CacheKey, ttl: Duration, compute: F) -> ApiResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> ApiResult<T>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock();
        if let Some(hit) = entry.as_ref().and_then(|e| e.live::<T>(Instant::now())) {
            return Ok(hit);
        }

        match compute() {
            Ok(value) => {
                let value = Arc::new(value);
                *entry = Some(CacheEntry {
                    value: value.clone(),
                    expires_at: Instant::now() + ttl,
                });
                Ok(value)
            }
            Err(e) => {
                drop(entry);
                self.discard_empty(&key, &slot);
                Err(e)
            }
        }
    }

    pub fn get_or_insert_with<T, F>(&self, key: CacheKey, ttl: Duration, compute: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock();
        if let Some(hit) = entry.as_ref().and_then(|e| e.live::<T>(Instant::now())) {
            return hit;
        }
        let value = Arc::new(compute());
        *entry = Some(CacheEntry {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        value
    }

    /// Remove a slot left empty by a failed computation, unless another
    /// caller is using it.
    fn discard_empty(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = self.slots.lock();
        let unused = slots.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && current.try_lock().is_some_and(|e| e.is_none())
        });
        if unused {
            slots.remove(key);
        }
    }

    /// Drop expired entries, returning how many were evicted
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    /// Single pass over the map. Slots being computed are skipped.
    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        let mut evicted = 0;
        self.slots.lock().retain(|_, slot| match slot.try_lock() {
            Some(entry) => match entry.as_ref() {
                Some(e) if e.expires_at <= now => {
                    evicted += 1;
                    false
                }
                Some(_) => true,
                None => false,
            },
            None => true,
        });
        evicted
    }

    /// Stored entries, counting those being computed
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.try_lock().map_or(true, |e| e.is_some()))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cameras, lenses and compatibility edges owned by the user
pub struct EquipmentRepo {
    inventory: RwLock<EquipmentInventory>,
}

impl EquipmentRepo {
    pub fn new(inventory: EquipmentInventory) -> ApiResult<Self> {
        validate_inventory(&inventory)?;
        Ok(Self {
            inventory: RwLock::new(inventory),
        })
    }

    pub fn empty() -> Self {
        Self {
            inventory: RwLock::new(EquipmentInventory::default()),
        }
    }

    /// Load a JSON inventory file; only called at start-up
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let inventory: EquipmentInventory = serde_json::from_str(&raw)?;
        Ok(Self::new(inventory)?)
    }

    pub async fn snapshot(&self) -> EquipmentInventory {
        self.inventory.read().await.clone()
    }

    /// Replace the whole inventory after validation
    pub async fn replace(&self, inventory: EquipmentInventory) -> ApiResult<()> {
        validate_inventory(&inventory)?;
        *self.inventory.write().await = inventory;
        Ok(())
    }
}

pub fn validate_inventory(inventory: &EquipmentInventory) -> ApiResult<()> {
    let mut camera_ids = HashSet::new();
    for camera in &inventory.cameras {
        if !camera_ids.insert(camera.id) {
            return Err(AstroError::InvalidInput(format!("duplicate camera id {}", camera.id)));
        }
        if !(camera.sensor_width_mm > 0.0 && camera.sensor_height_mm > 0.0) {
            return Err(AstroError::InvalidInput(format!(
                "camera {} needs positive sensor dimensions",
                camera.id
            )));
        }
    }

    let mut lens_ids = HashSet::new();
    for lens in &inventory.lenses {
        if !lens_ids.insert(lens.id) {
            return Err(AstroError::InvalidInput(format!("duplicate lens id {}", lens.id)));
        }
        if !(lens.min_mm > 0.0 && lens.max_f_stop > 0.0) {
            return Err(AstroError::InvalidInput(format!(
                "lens {} needs positive focal length and f-stop",
                lens.id
            )));
        }
        match (lens.is_prime, lens.max_mm) {
            (true, Some(_)) => {
                return Err(AstroError::InvalidInput(format!(
                    "prime lens {} must not set max_mm",
                    lens.id
                )))
            }
            (false, None) => {
                return Err(AstroError::InvalidInput(format!("zoom lens {} needs max_mm", lens.id)))
            }
            (false, Some(max)) if max < lens.min_mm => {
                return Err(AstroError::InvalidInput(format!(
                    "zoom lens {} has max_mm {} below min_mm {}",
                    lens.id, max, lens.min_mm
                )))
            }
            _ => {}
        }
    }

    for edge in &inventory.compatibility {
        if !camera_ids.contains(&edge.camera_id) || !lens_ids.contains(&edge.lens_id) {
            return Err(AstroError::InvalidInput(format!(
                "compatibility edge {}->{} references an unknown id",
                edge.camera_id, edge.lens_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CameraDescriptor, CompatibilityEdge, LensDescriptor};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn key(kind: CalculationKind) -> CacheKey {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap();
        CacheKey::new(kind, at, &Observer::at(45.0, 7.0).unwrap())
    }

    #[test]
    fn test_key_rounds_nearby_requests_together() {
        let obs_a = Observer::at(45.00001, 7.00004).unwrap();
        let obs_b = Observer::at(45.00002, 7.00001).unwrap();
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 10).unwrap();
        let a = CacheKey::new(CalculationKind::Moon, t, &obs_a);
        let b = CacheKey::new(CalculationKind::Moon, t + chrono::Duration::seconds(5), &obs_b);
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::new(CalculationKind::SunTimes, t, &obs_a));
        let summit = Observer::new(45.0, 7.0, 2500.0).unwrap();
        assert_ne!(a, CacheKey::new(CalculationKind::Moon, t, &summit));
    }

    #[test]
    fn test_compute_runs_once_within_ttl() {
        let cache = CalculationCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42.5_f64)
        };

        let first = cache
            .get_or_try_insert_with(key(CalculationKind::Moon), Duration::from_secs(60), compute)
            .unwrap();
        let second = cache
            .get_or_try_insert_with(key(CalculationKind::Moon), Duration::from_secs(60), compute)
            .unwrap();

        assert_eq!(*first, *second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = CalculationCache::new();
        let k = key(CalculationKind::Planet(Planet::Mars));
        let failed: ApiResult<Arc<f64>> = cache.get_or_try_insert_with(k, Duration::from_secs(60), || {
            Err(AstroError::CalculationUnavailable("no data".to_string()))
        });
        assert!(failed.is_err());
        assert!(cache.is_empty());
        let ok = cache.get_or_try_insert_with(k, Duration::from_secs(60), || Ok(1.0_f64));
        assert_eq!(*ok.unwrap(), 1.0);
    }

    #[test]
    fn test_concurrent_callers_compute_once() {
        let cache = CalculationCache::new();
        let calls = AtomicUsize::new(0);
        let k = key(CalculationKind::Moon);

        let values: Vec<Arc<u64>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        cache.get_or_insert_with(k, Duration::from_secs(60), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(50));
                            99_u64
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    #[test]
    fn test_slow_compute_does_not_block_other_keys() {
        let cache = CalculationCache::new();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        std::thread::scope(|scope| {
            let shared = &cache;
            let slow = scope.spawn(move || {
                shared.get_or_insert_with(key(CalculationKind::Moon), Duration::from_secs(60), || {
                    started_tx.send(()).unwrap();
                    // Held until the other keys are done, or 5 s at most
                    let _ = release_rx.recv_timeout(Duration::from_secs(5));
                    1_u32
                })
            });

            started_rx.recv().unwrap();
            let begin = Instant::now();
            let sun = cache.get_or_insert_with(key(CalculationKind::SunTimes), Duration::from_secs(60), || 2_u32);
            cache.put(key(CalculationKind::Planet(Planet::Venus)), 3_u32, Duration::from_secs(60));
            let venus = cache.get::<u32>(&key(CalculationKind::Planet(Planet::Venus)));
            assert!(cache.get::<u32>(&key(CalculationKind::SunPath { interval_minutes: 30 })).is_none());
            cache.cleanup_expired();
            let elapsed = begin.elapsed();
            release_tx.send(()).unwrap();

            assert_eq!(*sun, 2);
            assert_eq!(venus.as_deref(), Some(&3));
            assert!(elapsed < Duration::from_secs(1), "unrelated keys waited {:?}", elapsed);
            assert_eq!(*slow.join().unwrap(), 1);
        });
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_expired_entries_miss_and_are_cleaned() {
        let cache = CalculationCache::new();
        cache.put(key(CalculationKind::SunTimes), 1_u32, Duration::ZERO);
        cache.put(key(CalculationKind::Moon), 2_u32, Duration::from_secs(3600));

        assert!(cache.get::<u32>(&key(CalculationKind::SunTimes)).is_none());
        assert_eq!(cache.get::<u32>(&key(CalculationKind::Moon)).as_deref(), Some(&2));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.cleanup_expired(), 0);
        assert_eq!(cache.len(), 1);

        let later = Instant::now() + Duration::from_secs(7200);
        assert_eq!(cache.cleanup_expired_at(later), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = CalculationCache::new();
        cache.put(key(CalculationKind::Moon), String::from("moon"), Duration::from_secs(60));
        assert!(cache.get::<u32>(&key(CalculationKind::Moon)).is_none());
        let v = cache.get_or_insert_with(key(CalculationKind::Moon), Duration::from_secs(60), || 7_u32);
        assert_eq!(*v, 7);
    }

    fn inventory() -> EquipmentInventory {
        EquipmentInventory {
            cameras: vec![CameraDescriptor {
                id: 1,
                name: "Body".to_string(),
                sensor_width_mm: 36.0,
                sensor_height_mm: 24.0,
                is_user_created: false,
            }],
            lenses: vec![LensDescriptor::prime(10, 24.0, 1.4), LensDescriptor::zoom(11, 70.0, 200.0, 2.8)],
            compatibility: vec![
                CompatibilityEdge { camera_id: 1, lens_id: 10 },
                CompatibilityEdge { camera_id: 1, lens_id: 11 },
            ],
        }
    }

    #[test]
    fn test_validation_rejects_bad_inventories() {
        assert!(validate_inventory(&inventory()).is_ok());

        let mut dangling = inventory();
        dangling.compatibility.push(CompatibilityEdge { camera_id: 1, lens_id: 99 });
        assert!(matches!(validate_inventory(&dangling), Err(AstroError::InvalidInput(_))));

        let mut reversed = inventory();
        reversed.lenses[1] = LensDescriptor::zoom(11, 200.0, 70.0, 2.8);
        assert!(validate_inventory(&reversed).is_err());

        let mut flat_sensor = inventory();
        flat_sensor.cameras[0].sensor_height_mm = 0.0;
        assert!(validate_inventory(&flat_sensor).is_err());
    }

    #[tokio::test]
    async fn test_repo_replace_keeps_old_inventory_on_error() {
        let repo = EquipmentRepo::new(inventory()).unwrap();
        let mut bad = inventory();
        bad.cameras.push(bad.cameras[0].clone());
        assert!(repo.replace(bad).await.is_err());
        assert_eq!(repo.snapshot().await, inventory());

        repo.replace(EquipmentInventory::default()).await.unwrap();
        assert!(repo.snapshot().await.cameras.is_empty());
    }
}
