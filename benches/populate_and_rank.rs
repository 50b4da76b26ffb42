use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use school_ranker::{
    load::{LoadOptions, Loader, rank_period},
    models::{ExamResult, RESULT_SCHEMA},
    ranking,
    rows::populate,
    schema::ColumnIndex,
    store::MemoryStore,
};

const HEADER: &[&str] = &[
    "name",
    "locality",
    "small",
    "median_vce_score",
    "percent_completion_vce",
    "percent_score_40_and_over",
    "no_vce_students",
];

fn generate_rows(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            let median = match i % 7 {
                0 => "N/A".to_string(),
                other => (20 + other).to_string(),
            };
            vec![
                format!("SCHOOL number {i}"),
                format!("locality {}", i % 50),
                if i % 3 == 0 { "Y" } else { "" }.to_string(),
                median,
                (60 + i % 40).to_string(),
                format!("{}.{}", i % 30, i % 10),
                if i % 11 == 0 { "<4".to_string() } else { (i % 200).to_string() },
            ]
        })
        .collect()
}

fn bench_populate(c: &mut Criterion) {
    let rows = generate_rows(1_000);
    let index = ColumnIndex::build(HEADER, &RESULT_SCHEMA);
    c.bench_function("populate_results_1k", |b| {
        b.iter(|| {
            rows.iter()
                .map(|row| populate::<_, ExamResult>(row, &index, &RESULT_SCHEMA))
                .collect::<Result<Vec<_>, _>>()
                .expect("rows populate")
        })
    });
}

fn bench_load_and_rank(c: &mut Criterion) {
    let rows = generate_rows(1_000);
    c.bench_function("load_and_rank_1k", |b| {
        b.iter_batched(
            MemoryStore::new,
            |mut store| {
                Loader::new(&mut store, HEADER, LoadOptions::new(2015))
                    .load_rows(&rows)
                    .expect("rows load");
                rank_period(&mut store, 2015).expect("period ranks")
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_assign_ranks(c: &mut Criterion) {
    let mut scores = (0..10_000).map(|i| (i % 997) as f32).collect::<Vec<_>>();
    scores.sort_by(|a, b| b.total_cmp(a));
    c.bench_function("assign_ranks_10k", |b| {
        b.iter(|| ranking::assign_ranks(&scores))
    });
}

criterion_group!(benches, bench_populate, bench_load_and_rank, bench_assign_ranks);
criterion_main!(benches);
