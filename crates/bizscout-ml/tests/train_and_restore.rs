use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use bizscout_core::{Dataset, PredictionSource};
use bizscout_ml::{
    ConfidencePolicy, DemandCompetitionPredictor, ForestConfig, MlError, Target, TrainConfig,
    FEATURE_COUNT,
};
use bizscout_storage::{load_dataset, BlobStore, FileBlobStore, MemoryBlobStore};

static TEMP_SEQ: AtomicU64 = AtomicU64::new(1);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fixture() -> Dataset {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data")
        .join("fixtures")
        .join("businesses.json");
    load_dataset(path).expect("fixture loads")
}

fn temp_dir() -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    std::env::temp_dir().join(format!("bizscout-models-{pid}-{seq}"))
}

fn small_config() -> TrainConfig {
    TrainConfig {
        forest: ForestConfig {
            n_trees: 10,
            ..ForestConfig::default()
        },
        ..TrainConfig::default()
    }
}

fn trained(policy: ConfidencePolicy) -> DemandCompetitionPredictor {
    let mut predictor = DemandCompetitionPredictor::new(policy);
    predictor.train(&fixture(), &small_config()).expect("train");
    predictor
}

#[test]
fn training_reports_holdout_metrics() {
    init_logger();
    let predictor = trained(ConfidencePolicy::default());
    let perf = predictor.performance().copied().expect("performance");
    assert_eq!(perf.train_rows + perf.test_rows, fixture().len());
    assert!(perf.test_rows > 0);
    assert!(perf.demand.mae >= 0.0);
    assert!(perf.competition.accuracy <= 100.0);
}

#[test]
fn unseen_inputs_stay_in_bounds() {
    init_logger();
    let predictor = trained(ConfidencePolicy::default());
    for (city, category, investment) in [
        ("Atlantis", "Space Mining", 1.0),
        ("Mumbai", "Food", 50_000_000.0),
        ("Delhi", "Underwater Basket Weaving", 300_000.0),
    ] {
        let out = predictor.predict(city, category, "Brand New Idea", investment);
        assert_eq!(out.source, PredictionSource::Model);
        assert!((50.0..=100.0).contains(&out.demand), "{out:?}");
        assert!((20.0..=80.0).contains(&out.competition), "{out:?}");
        assert!((0.0..=1.0).contains(&out.confidence));
        assert!((out.market_gap - (out.demand - out.competition)).abs() <= 0.11);
    }
}

#[test]
fn invalid_investment_uses_category_table() {
    init_logger();
    let predictor = trained(ConfidencePolicy::default());
    let out = predictor.predict("Mumbai", "Healthcare", "Clinic", f64::NAN);
    assert_eq!(out.source, PredictionSource::Fallback);
    assert_eq!((out.demand, out.competition), (85.0, 45.0));
    assert!(matches!(
        predictor.try_predict("Mumbai", "Healthcare", "Clinic", -5.0),
        Err(MlError::InvalidInput(_))
    ));
}

#[test]
fn restored_models_predict_identically() {
    init_logger();
    let policy = ConfidencePolicy::Jitter {
        base: 0.85,
        std_dev: 0.1,
        seed: 7,
    };
    let original = trained(policy);
    let mut store = MemoryBlobStore::new();
    original.persist(&mut store).expect("persist");
    assert_eq!(
        store.keys(),
        vec![
            "competition_model",
            "demand_model",
            "feature_aggregates",
            "label_encoders",
            "scaler",
        ]
    );

    let mut restored = DemandCompetitionPredictor::new(policy);
    assert!(restored.restore(&store).expect("restore"));
    assert!(restored.performance().is_none());
    for (city, category, business, investment) in [
        ("Mumbai", "Tech", "Co-working Space", 2_500_000.0),
        ("Pune", "Fitness", "Yoga Studio", 400_000.0),
        ("Nowhere", "Retail", "Kiosk", 90_000.0),
    ] {
        assert_eq!(
            original.predict(city, category, business, investment),
            restored.predict(city, category, business, investment)
        );
    }
}

#[test]
fn file_store_round_trip() {
    init_logger();
    let dir = temp_dir();
    let original = trained(ConfidencePolicy::Fixed(0.75));
    {
        let mut store = FileBlobStore::open(&dir).expect("open store");
        original.persist(&mut store).expect("persist");
    }
    let store = FileBlobStore::open(&dir).expect("reopen store");
    let mut restored = DemandCompetitionPredictor::new(ConfidencePolicy::Fixed(0.75));
    assert!(restored.restore(&store).expect("restore"));
    assert_eq!(
        original.predict("Delhi", "Education", "Coaching Centre", 800_000.0),
        restored.predict("Delhi", "Education", "Coaching Centre", 800_000.0)
    );
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn restore_reports_missing_blobs() {
    init_logger();
    let mut predictor = DemandCompetitionPredictor::default();
    assert!(!predictor.restore(&MemoryBlobStore::new()).expect("restore"));
    assert!(!predictor.is_trained());

    let mut store = MemoryBlobStore::new();
    trained(ConfidencePolicy::default())
        .persist(&mut store)
        .expect("persist");
    assert!(store.remove("feature_aggregates"));
    assert!(!predictor.restore(&store).expect("restore"));
    assert!(!predictor.is_trained());
}

#[test]
fn restore_rejects_corrupt_blob() {
    init_logger();
    let mut store = MemoryBlobStore::new();
    trained(ConfidencePolicy::default())
        .persist(&mut store)
        .expect("persist");
    store.save("scaler", b"{not json").expect("overwrite");
    let mut predictor = DemandCompetitionPredictor::default();
    assert!(matches!(predictor.restore(&store), Err(MlError::Serde(_))));
    assert!(!predictor.is_trained());
}

#[test]
fn persist_requires_training() {
    let mut store = MemoryBlobStore::new();
    let predictor = DemandCompetitionPredictor::default();
    assert!(matches!(
        predictor.persist(&mut store),
        Err(MlError::NotTrained)
    ));
    assert!(store.keys().is_empty());
}

#[test]
fn importance_covers_all_features() {
    init_logger();
    let predictor = trained(ConfidencePolicy::default());
    let all = predictor.feature_importance(Target::Demand, usize::MAX);
    assert_eq!(all.len(), FEATURE_COUNT);
    let total: f64 = all.iter().map(|(_, v)| v).sum();
    assert!(total == 0.0 || (total - 1.0).abs() < 1e-9, "total = {total}");
    assert!(all.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(predictor.feature_importance(Target::Demand, 3).len(), 3);
}
