use std::fs;

use pcr_config::ExperimentDocument;
use pcr_core::{EventBus, ExperimentStore, FsDocumentStore, PcrError, StandardCurvePoint};

fn open(dir: &std::path::Path) -> ExperimentStore<FsDocumentStore> {
    ExperimentStore::open(FsDocumentStore::new(dir, None), EventBus::new()).unwrap()
}

#[test]
fn empty_directory_gets_a_persisted_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path());
    assert_eq!(store.names(), &["untitled".to_string()]);
    assert!(dir.path().join("untitled.yml").is_file());
}

#[test]
fn names_come_from_file_stems_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["zeta", "alpha", "mid"] {
        fs::write(dir.path().join(format!("{name}.yml")), "experiment_name: ignored\n").unwrap();
    }
    let store = open(dir.path());
    assert_eq!(store.names(), &["alpha", "mid", "zeta"]);
    assert_eq!(store.current_name(), "alpha");
    assert_eq!(store.get("zeta").unwrap().name(), "zeta");
}

#[test]
fn saved_record_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = open(dir.path());
        store.create("dilution-a").unwrap();
        let rec = store.current_mut().unwrap();
        rec.set_intensity_threshold(7.5).unwrap();
        rec.set_concentration_coefficient("0.0250").unwrap();
        for (x, ct) in [(0.0, 31), (-1.0, 28), (-2.0, 24)] {
            rec.curve_mut().add(StandardCurvePoint::new(x, ct)).unwrap();
        }
        store.save("dilution-a").unwrap();
    }
    let store = open(dir.path());
    let rec = store.get("dilution-a").unwrap();
    assert_eq!(rec.intensity_threshold(), 7.5);
    assert_eq!(rec.concentration_coefficient(), "0.0250");
    assert_eq!(rec.curve().len(), 3);
    assert!(!rec.last_saved().is_empty());
}

#[test]
fn remove_deletes_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(dir.path());
    store.create("gone").unwrap();
    assert!(dir.path().join("gone.yml").is_file());
    store.remove("gone").unwrap();
    assert!(!dir.path().join("gone.yml").exists());
    assert_eq!(store.remove("gone"), Err(PcrError::NotFound("gone".into())));
}

#[test]
fn removing_last_record_recreates_default_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("only.yml"), "").unwrap();
    let mut store = open(dir.path());
    store.remove("only").unwrap();
    assert_eq!(store.names(), &["untitled".to_string()]);
    assert!(dir.path().join("untitled.yml").is_file());
    assert!(!dir.path().join("only.yml").exists());
}

#[test]
fn template_file_shapes_new_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = ExperimentDocument::template();
    t.max_cycle = 40;
    t.led_intensity_level = 60;
    fs::write(
        dir.path().join("template.yml"),
        pcr_config::to_yaml(&t).unwrap(),
    )
    .unwrap();
    let mut store = open(dir.path());
    store.create("fresh").unwrap();
    let rec = store.get("fresh").unwrap();
    assert_eq!(rec.max_cycle(), 40);
    assert_eq!(rec.samples().len(), 40);
    assert_eq!(rec.led_intensity_level(), 60);
}

#[test]
fn negative_intensity_file_is_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("broken.yml"),
        "light_sensor_data: [1.0, -3.0]\n",
    )
    .unwrap();
    fs::write(dir.path().join("fine.yml"), "").unwrap();
    let store = open(dir.path());
    assert_eq!(store.names(), &["fine".to_string()]);
    // left on disk for the operator to fix
    assert!(dir.path().join("broken.yml").is_file());
}

#[test]
fn template_file_cannot_be_claimed_by_an_experiment() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(dir.path());
    assert!(matches!(store.create("template"), Err(PcrError::InvalidName(_))));
    assert!(!dir.path().join("template.yml").exists());

    let reopened = open(dir.path());
    assert_eq!(reopened.names(), &["untitled".to_string()]);
}

#[test]
fn corrupt_template_leaves_sole_experiment_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open(dir.path());
    fs::write(dir.path().join("template.yml"), "max_cycle: [not, a, number]\n").unwrap();

    assert!(store.remove("untitled").is_err());
    assert_eq!(store.names(), &["untitled".to_string()]);
    assert!(dir.path().join("untitled.yml").is_file());
    assert_eq!(open(dir.path()).names(), &["untitled".to_string()]);
}
