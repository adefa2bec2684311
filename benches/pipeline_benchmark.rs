//! Performance benchmarks for the normalization path
//!
//! Run with: cargo bench

use ads_insights::adapters::{CsvAdapter, JsonAdapter, SourceAdapter};
use ads_insights::brand::BrandResolver;
use ads_insights::headers::HeaderMapping;
use ads_insights::normalizer::normalize_table;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const CAMPAIGNS: [&str; 6] = [
    "Fiat Pulse Oferta",
    "Jeep Compass Sinal",
    "Omoda 5 Lançamento",
    "Jaecoo 7 Test Drive",
    "Citroën C3 Aircross",
    "Campanha institucional",
];

/// Generate a Meta Ads style export with `num_rows` rows
fn generate_csv(num_rows: usize) -> String {
    let mut csv = String::from(
        "Reporting starts,Account,Campaign name,Ad set name,Ad name,Amount spent (BRL),Leads,Impressions,Clicks (all),Cost per lead (BRL),CPC (all)\n",
    );
    for i in 0..num_rows {
        let campaign = CAMPAIGNS[i % CAMPAIGNS.len()];
        csv.push_str(&format!(
            "2024-{:02}-{:02},Loja {},{},Conjunto {},Anúncio {},\"{},{:02}\",{},{},{},0,0\n",
            i % 12 + 1,
            i % 28 + 1,
            i % 7,
            campaign,
            i % 5,
            i,
            100 + i % 900,
            i % 100,
            i % 40,
            1000 + i,
            i % 300
        ));
    }
    csv
}

fn generate_json(num_rows: usize) -> String {
    let rows: Vec<serde_json::Value> = (0..num_rows)
        .map(|i| {
            serde_json::json!({
                "Reporting starts": format!("2024-01-{:02}", i % 28 + 1),
                "Campaign name": CAMPAIGNS[i % CAMPAIGNS.len()],
                "Amount spent (BRL)": 100 + i % 900,
                "Leads": i % 40,
            })
        })
        .collect();
    serde_json::json!({ "Omoda Jaecoo": rows }).to_string()
}

fn bench_csv_pipeline(c: &mut Criterion) {
    let resolver = BrandResolver::default();
    let mut group = c.benchmark_group("csv_pipeline");

    for size in [100, 1_000, 10_000] {
        let csv = generate_csv(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &csv, |b, csv| {
            b.iter(|| {
                let tables = CsvAdapter.parse(black_box(csv)).unwrap();
                let records: usize = tables
                    .iter()
                    .map(|t| normalize_table(t, &resolver).records.len())
                    .sum();
                black_box(records)
            })
        });
    }
    group.finish();
}

fn bench_json_pipeline(c: &mut Criterion) {
    let resolver = BrandResolver::default();
    let json = generate_json(1_000);

    c.bench_function("json_pipeline_1000", |b| {
        b.iter(|| {
            let tables = JsonAdapter.parse(black_box(&json)).unwrap();
            black_box(normalize_table(&tables[0], &resolver).records.len())
        })
    });
}

fn bench_header_resolution(c: &mut Criterion) {
    let headers = [
        "\u{feff}Início da veiculação",
        "Nome da conta",
        "Nome da campanha",
        "Nome do conjunto de anúncios",
        "Nome do anúncio",
        "Valor gasto (BRL) - total",
        "Resultados",
        "Impressões",
        "Cliques (todos)",
        "Custo por resultado",
        "CPC (todos)",
    ];
    c.bench_function("header_resolution", |b| {
        b.iter(|| black_box(HeaderMapping::resolve(black_box(&headers))))
    });
}

criterion_group!(benches, bench_csv_pipeline, bench_json_pipeline, bench_header_resolution);
criterion_main!(benches);
