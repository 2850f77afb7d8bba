//! Benchmarks pour le chargement et l'enrichissement

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use formations::loader::load_reference;
use formations::{Dataset, DurationScale, GeoReference};

const VILLES: [&str; 8] = [
    "Charleroi", "Namur", "Seraing", "Fleurus", "Arlon", "Wavre", "Bruxelles", "Ottignies",
];
const DUREES: [&str; 6] = ["3 jours", "6 mois", "2 ans", "35 heures", "2 semaines", "à définir"];

fn synthetic_formations(rows: usize) -> String {
    let mut csv = String::from(
        "intitule;type_organisme;localisation_potentielle;duree;courte;moyenne;longue;qualifiante;certifiante\n",
    );
    for i in 0..rows {
        csv.push_str(&format!(
            "Formation {};Organisme {};{};{};{};NON;NON;OUI;NON\n",
            i,
            i % 37,
            VILLES[i % VILLES.len()],
            DUREES[i % DUREES.len()],
            if i % 2 == 0 { "OUI" } else { "NON" },
        ));
    }
    csv
}

fn synthetic_reference() -> String {
    let mut csv = String::from(
        "Municipality name (French);Arrondissement name (French);Province name (French);_Geo Point\n",
    );
    for i in 0..2500 {
        csv.push_str(&format!("Commune {};Arr {};Namur;50.{},4.{}\n", i, i % 20, i, i));
    }
    for ville in VILLES {
        csv.push_str(&format!("{};Arr;Liège;50.5,5.5\n", ville));
    }
    csv
}

fn bench_build(c: &mut Criterion) {
    let data = synthetic_formations(5_000);
    let reference = load_reference("bench", synthetic_reference().as_bytes());
    let geo = GeoReference::from_reference(&reference);
    let scale = DurationScale::default();

    let mut group = c.benchmark_group("dataset");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("build_with_reference", |b| {
        b.iter(|| {
            let dataset =
                Dataset::build("bench.csv", black_box(data.as_bytes()), &geo, &scale).unwrap();
            black_box(dataset)
        })
    });

    group.bench_function("build_without_reference", |b| {
        b.iter(|| {
            let dataset = Dataset::build(
                "bench.csv",
                black_box(data.as_bytes()),
                &GeoReference::none(),
                &scale,
            )
            .unwrap();
            black_box(dataset)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
