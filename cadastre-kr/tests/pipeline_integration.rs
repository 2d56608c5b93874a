//! Tests d'intégration du pipeline complet: zip → shapefile → GeoJSON WGS84

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use cadastre_kr::pipeline::{count_all, process_all};
use cadastre_kr::{BatchStatus, RegionOutcome, Settings};
use serde_json::Value;
use shp::fixtures::{self, Shape};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const PREFIX: &str = "LSMD_CONT_LDREG_";

/// "서울특별시 종로구 청운동" en EUC-KR
const ADDRESS_EUC_KR: &[u8] = &[
    0xBC, 0xAD, 0xBF, 0xEF, 0xC6, 0xAF, 0xBA, 0xB0, 0xBD, 0xC3, 0x20, 0xC1, 0xBE, 0xB7, 0xCE, 0xB1,
    0xB8, 0x20, 0xC3, 0xBB, 0xBF, 0xEE, 0xB5, 0xBF,
];

fn settings(data_dir: &Path) -> Settings {
    Settings {
        data_dir: data_dir.to_path_buf(),
        ..Settings::default()
    }
}

/// Zippe les fichiers `files` (nom dans l'archive, contenu)
fn write_zip(zip_dir: &Path, region: &str, files: &[(String, Vec<u8>)]) -> PathBuf {
    std::fs::create_dir_all(zip_dir).unwrap();
    let path = zip_dir.join(format!("{}{}.zip", PREFIX, region));
    let mut writer = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    path
}

/// Écrit un shapefile dans un dossier de travail et retourne ses fichiers
fn shapefile_files(
    region: &str,
    shape_type: i32,
    shapes: &[Shape],
    fields: &[fixtures::Field],
    records: &[Vec<Vec<u8>>],
) -> Vec<(String, Vec<u8>)> {
    let work = tempfile::tempdir().unwrap();
    fixtures::write_shapefile(work.path(), region, shape_type, shapes, fields, records).unwrap();

    let mut files: Vec<(String, Vec<u8>)> = std::fs::read_dir(work.path())
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, std::fs::read(&path).unwrap())
        })
        .collect();
    files.sort();
    files
}

fn point_region(region: &str, x: f64, y: f64, name: &[u8]) -> Vec<(String, Vec<u8>)> {
    shapefile_files(
        region,
        1,
        &[Shape::Point(x, y)],
        &[("name", b'C', 40)],
        &[vec![name.to_vec()]],
    )
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn outcome<'a>(report: &'a cadastre_kr::BatchReport, region: &str) -> &'a RegionOutcome {
    &report
        .regions
        .iter()
        .find(|r| r.region == region)
        .unwrap_or_else(|| panic!("region {} missing from report", region))
        .outcome
}

#[test]
fn test_end_to_end_origin_point() {
    let data = tempfile::tempdir().unwrap();
    write_zip(
        &data.path().join("zip"),
        "11110",
        &point_region("11110", 200000.0, 600000.0, ADDRESS_EUC_KR),
    );

    let report = process_all(&settings(data.path())).unwrap();
    assert_eq!(report.status, BatchStatus::Success);
    assert_eq!(report.regions_succeeded, 1);
    assert_eq!(report.total_features, 1);

    // Extraction dans unzipped/<region>/
    assert!(data.path().join("unzipped/11110/11110.shp").exists());

    let output = data.path().join("json/11110-4326.json");
    let json = read_json(&output);
    assert_eq!(json["type"], "FeatureCollection");

    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["type"], "Feature");
    assert_eq!(features[0]["geometry"]["type"], "Point");

    let coords = &features[0]["geometry"]["coordinates"];
    let lon = coords[0].as_f64().unwrap();
    let lat = coords[1].as_f64().unwrap();
    assert!((lon - 127.0).abs() < 1e-6, "lon={}", lon);
    assert!((lat - 38.0).abs() < 1e-6, "lat={}", lat);

    assert_eq!(features[0]["properties"]["name"], "서울특별시 종로구 청운동");

    match outcome(&report, "11110") {
        RegionOutcome::Success { features, output: Some(path) } => {
            assert_eq!(*features, 1);
            assert_eq!(path, &output);
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[test]
fn test_skip_and_fail_do_not_stop_batch() {
    let data = tempfile::tempdir().unwrap();
    let zip_dir = data.path().join("zip");

    // 11110: sans .prj → SKIPPED
    let no_prj: Vec<_> = point_region("11110", 200000.0, 600000.0, b"a")
        .into_iter()
        .filter(|(name, _)| !name.ends_with(".prj"))
        .collect();
    write_zip(&zip_dir, "11110", &no_prj);

    // 11140: .shp corrompu → FAILED
    write_zip(
        &zip_dir,
        "11140",
        &[
            ("11140.shp".to_string(), b"this is not a shapefile".to_vec()),
            ("11140.prj".to_string(), fixtures::PRJ_5186.as_bytes().to_vec()),
        ],
    );

    // 11170: valide → SUCCESS (traité après les deux autres)
    write_zip(&zip_dir, "11170", &point_region("11170", 210000.0, 610000.0, b"ok"));

    let report = process_all(&settings(data.path())).unwrap();

    assert!(matches!(outcome(&report, "11110"), RegionOutcome::Skipped { .. }));
    assert!(matches!(outcome(&report, "11140"), RegionOutcome::Failed { .. }));
    assert!(matches!(outcome(&report, "11170"), RegionOutcome::Success { features: 1, .. }));

    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert!(report.has_failures());

    let json_dir = data.path().join("json");
    assert!(!json_dir.join("11110-4326.json").exists());
    assert!(!json_dir.join("11140-4326.json").exists());
    assert!(json_dir.join("11170-4326.json").exists());

    // Rapport trié par archive
    let order: Vec<&str> = report.regions.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(order, ["11110", "11140", "11170"]);
}

#[test]
fn test_decoding_failure_writes_nothing() {
    let data = tempfile::tempdir().unwrap();
    // 0xFF n'est pas un octet EUC-KR valide
    let files = shapefile_files(
        "11110",
        1,
        &[Shape::Point(200000.0, 600000.0), Shape::Point(200100.0, 600100.0)],
        &[("name", b'C', 10)],
        &[vec![b"ok".to_vec()], vec![vec![0xFF]]],
    );
    write_zip(&data.path().join("zip"), "11110", &files);

    let report = process_all(&settings(data.path())).unwrap();

    match outcome(&report, "11110") {
        RegionOutcome::Failed { kind, reason } => {
            assert_eq!(kind, "decoding");
            assert!(reason.contains("feature #1"), "{}", reason);
        }
        other => panic!("Expected failure, got {:?}", other),
    }
    assert_eq!(report.status, BatchStatus::Failed);
    assert!(!data.path().join("json/11110-4326.json").exists());
}

#[test]
fn test_empty_shapefile_gives_empty_collection() {
    let data = tempfile::tempdir().unwrap();
    let files = shapefile_files("11110", 5, &[], &[("PNU", b'C', 19)], &[]);
    write_zip(&data.path().join("zip"), "11110", &files);

    let report = process_all(&settings(data.path())).unwrap();
    assert!(matches!(outcome(&report, "11110"), RegionOutcome::Success { features: 0, .. }));

    let json = read_json(&data.path().join("json/11110-4326.json"));
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"], serde_json::json!([]));
}

#[test]
fn test_empty_zip_directory() {
    let data = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(data.path().join("zip")).unwrap();

    let report = process_all(&settings(data.path())).unwrap();
    assert_eq!(report.status, BatchStatus::Empty);
    assert!(!report.has_failures());
}

#[test]
fn test_missing_zip_directory_is_an_error() {
    let data = tempfile::tempdir().unwrap();
    assert!(process_all(&settings(data.path())).is_err());
}

#[test]
fn test_polygons_order_and_null_geometry() {
    let data = tempfile::tempdir().unwrap();
    let square = |x: f64, y: f64, size: f64| {
        // Sens horaire: anneau extérieur
        vec![(x, y), (x, y + size), (x + size, y + size), (x + size, y), (x, y)]
    };
    let hole = vec![
        (200020.0, 600020.0),
        (200040.0, 600020.0),
        (200040.0, 600040.0),
        (200020.0, 600040.0),
        (200020.0, 600020.0),
    ];
    let shapes = [
        Shape::Polygon(vec![square(200000.0, 600000.0, 100.0), hole]),
        Shape::Null,
        Shape::Polygon(vec![
            square(201000.0, 601000.0, 10.0),
            square(202000.0, 602000.0, 10.0),
        ]),
    ];
    let files = shapefile_files(
        "11110",
        5,
        &shapes,
        &[("PNU", b'C', 19), ("AREA", b'N', 10)],
        &[
            vec![b"1111010100100010000".to_vec(), b"9600".to_vec()],
            vec![b"1111010100100020000".to_vec(), b"".to_vec()],
            vec![b"1111010100100030000".to_vec(), b"12.5".to_vec()],
        ],
    );
    write_zip(&data.path().join("zip"), "11110", &files);

    let report = process_all(&settings(data.path())).unwrap();
    assert_eq!(report.status, BatchStatus::Success);

    let json = read_json(&data.path().join("json/11110-4326.json"));
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);

    // Ordre des enregistrements conservé
    let pnus: Vec<&str> = features
        .iter()
        .map(|f| f["properties"]["PNU"].as_str().unwrap())
        .collect();
    assert_eq!(
        pnus,
        ["1111010100100010000", "1111010100100020000", "1111010100100030000"]
    );

    // Polygone avec trou
    assert_eq!(features[0]["geometry"]["type"], "Polygon");
    let rings = features[0]["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(rings.len(), 2);
    assert_eq!(rings[0].as_array().unwrap().len(), 5);
    let first = &rings[0][0];
    assert!((first[0].as_f64().unwrap() - 127.0).abs() < 1e-6);
    assert!((first[1].as_f64().unwrap() - 38.0).abs() < 1e-6);
    assert_eq!(features[0]["properties"]["AREA"], 9600);

    // Shape Null → geometry null, attributs conservés
    assert!(features[1]["geometry"].is_null());
    assert!(features[1]["properties"]["AREA"].is_null());

    // Deux extérieurs → MultiPolygon
    assert_eq!(features[2]["geometry"]["type"], "MultiPolygon");
    assert_eq!(features[2]["geometry"]["coordinates"].as_array().unwrap().len(), 2);
    assert_eq!(features[2]["properties"]["AREA"], 12.5);
}

#[test]
fn test_not_a_zip_fails_region_only() {
    let data = tempfile::tempdir().unwrap();
    let zip_dir = data.path().join("zip");
    std::fs::create_dir_all(&zip_dir).unwrap();
    std::fs::write(zip_dir.join(format!("{}11110.zip", PREFIX)), b"garbage").unwrap();
    write_zip(&zip_dir, "11140", &point_region("11140", 200000.0, 600000.0, b"x"));

    let report = process_all(&settings(data.path())).unwrap();
    assert!(matches!(outcome(&report, "11110"), RegionOutcome::Failed { .. }));
    assert!(matches!(outcome(&report, "11140"), RegionOutcome::Success { .. }));
    assert_eq!(report.status, BatchStatus::PartialSuccess);

    // Aucun dossier extrait pour l'archive illisible
    assert!(!data.path().join("unzipped/11110").exists());
    let counted = count_all(&settings(data.path())).unwrap();
    assert_eq!(counted.regions.len(), 1);
    assert_eq!(counted.regions[0].region, "11140");
}

#[test]
fn test_reprocessing_overwrites_outputs() {
    let data = tempfile::tempdir().unwrap();
    let zip_dir = data.path().join("zip");
    write_zip(&zip_dir, "11110", &point_region("11110", 200000.0, 600000.0, b"first"));
    process_all(&settings(data.path())).unwrap();

    write_zip(&zip_dir, "11110", &point_region("11110", 200000.0, 600000.0, b"second"));
    process_all(&settings(data.path())).unwrap();

    let json = read_json(&data.path().join("json/11110-4326.json"));
    assert_eq!(json["features"][0]["properties"]["name"], "second");
}

#[test]
fn test_parallel_matches_sequential() {
    let data = tempfile::tempdir().unwrap();
    let zip_dir = data.path().join("zip");
    for (i, region) in ["11110", "11140", "11170", "11200", "11215"].iter().enumerate() {
        let x = 200000.0 + i as f64 * 1000.0;
        write_zip(&zip_dir, region, &point_region(region, x, 600000.0, b"p"));
    }

    let sequential = process_all(&settings(data.path())).unwrap();
    let parallel = process_all(&Settings {
        jobs: 3,
        ..settings(data.path())
    })
    .unwrap();

    let regions = |r: &cadastre_kr::BatchReport| -> Vec<String> {
        r.regions.iter().map(|x| x.region.clone()).collect()
    };
    assert_eq!(regions(&sequential), regions(&parallel));
    assert_eq!(parallel.regions_succeeded, 5);
    assert_eq!(parallel.status, BatchStatus::Success);
}

#[test]
fn test_count_after_process() {
    let data = tempfile::tempdir().unwrap();
    let zip_dir = data.path().join("zip");
    let points: Vec<Shape> = (0..3).map(|i| Shape::Point(200000.0 + i as f64, 600000.0)).collect();
    let files = shapefile_files("11110", 1, &points, &[], &[]);
    write_zip(&zip_dir, "11110", &files);
    write_zip(&zip_dir, "11140", &point_region("11140", 200000.0, 600000.0, b"x"));
    process_all(&settings(data.path())).unwrap();

    // Dossier sans .shp → ignoré
    std::fs::create_dir_all(data.path().join("unzipped/99999")).unwrap();

    let report = count_all(&settings(data.path())).unwrap();
    assert!(matches!(outcome(&report, "11110"), RegionOutcome::Success { features: 3, .. }));
    assert!(matches!(outcome(&report, "11140"), RegionOutcome::Success { features: 1, .. }));
    assert!(matches!(outcome(&report, "99999"), RegionOutcome::Skipped { .. }));
    assert_eq!(report.total_features, 4);
    assert_eq!(report.status, BatchStatus::Success);
}
