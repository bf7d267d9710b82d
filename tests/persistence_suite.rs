use explorations::config::{load_config_file, Value};
use explorations::persistence::StateStore;
use explorations::snapshots::{SnapshotBook, SnapshotError};
use explorations::{Config, ConfigChange, Exploration, Oklch};

#[test]
fn stored_state_is_a_flat_json_object() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let mut cfg = Exploration::GrainyGradient.defaults();
    cfg.apply(&ConfigChange::color("color1", Oklch::new(0.4, 0.1, 200.0)));
    cfg.set("grainStyle", Value::Text("ordered".into()));
    assert!(store.save("exploration-02", &cfg));

    let raw = std::fs::read_to_string(store.path_for("exploration-02")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj["grainStyle"], "ordered");
    assert_eq!(obj["color1H"], 200.0);
    assert!(obj.values().all(|v| !v.is_object() && !v.is_array()));
}

#[test]
fn unknown_and_missing_keys_shallow_merge() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    std::fs::write(
        store.path_for("exploration-05"),
        r#"{ "waveSpeed": 0, "legacyKnob": true }"#,
    )
    .unwrap();

    let saved = store.load("exploration-05").unwrap();
    let cfg = Exploration::Aurora.defaults().merged(&saved);
    assert_eq!(cfg.num("waveSpeed"), 0.0);
    assert_eq!(cfg.get("legacyKnob"), Some(&Value::Bool(true)));
    assert_eq!(cfg.num("curtainCount"), 4.0);
}

#[test]
fn export_all_keys_by_state_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store.save("exploration-01", &Exploration::PolarGrid.defaults());
    store.save("exploration-04", &Exploration::LoaderGrid.defaults());
    std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
    std::fs::write(store.path_for("exploration-06"), "garbage").unwrap();

    let all = store.export_all();
    let keys: Vec<_> = all.keys().map(String::as_str).collect();
    assert_eq!(keys, ["exploration-01-state", "exploration-04-state"]);

    let json = serde_json::to_value(&all).unwrap();
    assert_eq!(json["exploration-04-state"]["pattern"], "all");
}

#[test]
fn snapshots_live_under_the_exploration_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = SnapshotBook::open(dir.path(), "exploration-07").unwrap();
    book.save(&Config::new()).unwrap();
    book.save(&Exploration::DomainWarp.defaults()).unwrap();
    assert!(dir.path().join("exploration-07").join("snapshots.json").is_file());

    book.delete(1).unwrap();
    assert!(matches!(
        book.delete(5),
        Err(SnapshotError::InvalidIndex { index: 5, len: 1 })
    ));
    let names: Vec<_> = SnapshotBook::open(dir.path(), "exploration-07")
        .unwrap()
        .entries()
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(names, ["Snapshot 1"]);
}

#[test]
fn corrupt_snapshot_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("exploration-01")).unwrap();
    std::fs::write(dir.path().join("exploration-01/snapshots.json"), "[{").unwrap();
    assert!(matches!(
        SnapshotBook::open(dir.path(), "exploration-01"),
        Err(SnapshotError::Json(_))
    ));
}

#[test]
fn config_files_load_as_json_or_toml() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("look.toml");
    std::fs::write(&toml_path, "speed = 0.5\ngrainStyle = \"halftone\"\nanimated = false\n").unwrap();
    let cfg = load_config_file(&toml_path).unwrap();
    assert_eq!(cfg.num("speed"), 0.5);
    assert_eq!(cfg.text("grainStyle"), Some("halftone"));
    assert!(!cfg.flag("animated"));

    let json_path = dir.path().join("look.json");
    std::fs::write(&json_path, r#"{"speed": 2}"#).unwrap();
    assert_eq!(load_config_file(&json_path).unwrap().num("speed"), 2.0);
}

#[test]
fn non_finite_change_does_not_wipe_saved_state() {
    use explorations::driver::ManualScheduler;
    use explorations::Session;

    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let mut session = Session::open(
        Exploration::Aurora,
        Some(store.clone()),
        dir.path(),
        ManualScheduler::default(),
    )
    .unwrap();
    session
        .apply(&ConfigChange::parse("skyL=0.33").unwrap())
        .unwrap();
    assert!(ConfigChange::parse("waveSpeed=NaN").is_err());
    session
        .apply(&ConfigChange::scalar("waveSpeed", Value::Number(f64::NAN)))
        .unwrap();
    assert_eq!(session.config().num("waveSpeed"), 0.5);

    let mut raw = session.config().clone();
    raw.set("waveSpeed", Value::Number(f64::INFINITY));
    assert!(store.save(Exploration::Aurora.id(), &raw));

    let saved = store.load(Exploration::Aurora.id()).unwrap();
    assert_eq!(saved.num("skyL"), 0.33);
    assert_eq!(saved.get("waveSpeed"), None);
    let cfg = Exploration::Aurora.defaults().merged(&saved);
    assert_eq!(cfg.num("waveSpeed"), 0.5);
}
