//! Tests d'intégration: jeu enrichi -> export CSV -> rechargement

use cadastre_formations::export::{export_csv, export_to_geojson, write_csv, GeoJsonMode};
use cadastre_formations::report::{ReferenceStatus, RunReport};
use formations::loader::{load_reference, load_table};
use formations::views::Filter;
use formations::{Dataset, DurationScale, GeoReference, Province};

const FORMATIONS: &str = "\
intitule;type_organisme;denomination_sociale;localisation_potentielle;duree;courte;moyenne;longue;qualifiante;certifiante;public
\"Python; les bases\";ASBL;Technofutur;Charleroi;3 jours;OUI;NON;NON;OUI;NON;Demandeurs d'emploi
Réseaux;Centre de compétence;Technifutur;Seraing;6 mois;NON;NON;OUI;OUI;OUI;Tout public
Excel;CPAS;\"CPAS; Namur\";Namur;;NON;OUI;NON;NON;NON;
";

const REFERENCE: &str = "\
Municipality name (French);Arrondissement name (French);Province name (French);_Geo Point
Charleroi;Charleroi;Hainaut;50.4108,4.4446
Seraing;Liège;Liège;50.5833,5.5000
";

fn dataset() -> Dataset {
    let geo = GeoReference::from_reference(&load_reference("codes_postaux.csv", REFERENCE.as_bytes()));
    Dataset::build(
        "formations.csv",
        FORMATIONS.as_bytes(),
        &geo,
        &DurationScale::default(),
    )
    .unwrap()
}

#[test]
fn test_csv_export_reloads_losslessly() {
    let data = dataset();
    let columns = data.export_columns(true);
    assert!(columns.len() > 5);

    let mut buf = Vec::new();
    write_csv(&mut buf, &data.all(), &columns).unwrap();

    let reloaded = load_table("export.csv", &buf).unwrap();
    assert_eq!(reloaded.delimiter, b';');
    let headers: Vec<&str> = columns.iter().map(|c| c.header()).collect();
    assert_eq!(reloaded.table.columns, headers);
    assert_eq!(reloaded.table.rows.len(), data.formations.len());

    for (formation, row) in data.formations.iter().zip(&reloaded.table.rows) {
        for column in &columns {
            assert_eq!(
                row.get(column.header()).map(str::to_string),
                column.value(formation),
                "column {}",
                column.header()
            );
        }
    }

    let charleroi = &reloaded.table.rows[0];
    assert_eq!(charleroi.get("ville"), Some("Charleroi"));
    assert_eq!(charleroi.get("duree_heures"), Some("24"));
    assert_eq!(charleroi.get("latitude"), Some("50.4108"));
    assert_eq!(charleroi.get("longitude"), Some("4.4446"));
    // Namur absent du référentiel
    assert_eq!(reloaded.table.rows[2].get("ville"), None);
}

#[test]
fn test_filtered_export_to_file() {
    let data = dataset();
    let filter = Filter {
        provinces: vec![Province::Liege],
        ..Default::default()
    };
    let selected = data.filtered(&filter);
    assert_eq!(selected.len(), 1);

    let path = std::env::temp_dir().join("cadastre_formations_liege.csv");
    export_csv(&path, &selected, &data.display_columns()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
    let reloaded = load_table("liege.csv", &bytes).unwrap();
    assert_eq!(reloaded.table.rows.len(), 1);
    assert_eq!(reloaded.table.rows[0].get("province"), Some("Liège"));
    assert_eq!(reloaded.table.rows[0].get("intitule"), Some("Réseaux"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_geojson_from_enriched_dataset() {
    let data = dataset();
    let path = std::env::temp_dir().join("cadastre_formations_points.geojson");

    let points =
        export_to_geojson(&data.all(), &data.mapping, GeoJsonMode::Formations, &path).unwrap();
    // Namur absent du référentiel: pas de coordonnées
    assert_eq!(points, 2);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["features"].as_array().map(Vec::len), Some(2));
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_run_report_counts() {
    let report = RunReport::from_dataset(&dataset());
    assert_eq!(report.reference, ReferenceStatus::Applied);
    assert_eq!(report.rows, 3);
    assert_eq!(report.geo_matches, 2);
    assert_eq!(report.provinces_backfilled, 1);
    // Une durée vide n'est pas une durée illisible
    assert_eq!(report.unparsed_durations, 0);
}
