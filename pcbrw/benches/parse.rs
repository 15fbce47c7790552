use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pcbrw::parse::parse_str;
use pcbrw::primitives::Format;
use pcbrw::write::write_elements;

fn sample_document() -> String {
    let mut input = String::new();
    for index in 0..200 {
        input.push_str(&format!(
            "TRACK,LAYER=1,WIDTH=2000,P0={x}/0,P1={x}/5000;\n\
             PAD,LAYER=2,POS={x}/6000,SIZE=2000,DRILL=800,FORM=2,PAD_ID={index};\n",
            x = index * 100,
        ));
    }
    input.push_str("GROUP;ZONE,LAYER=7,WIDTH=100,P0=0/0,P1=0/1000,P2=1000/1000;END_GROUP;\n");
    input
}

fn criterion_benchmark(c: &mut Criterion) {
    let input = sample_document();
    c.bench_function("parse 401 elements", |b| {
        b.iter(|| parse_str(black_box(&input)).expect("parse failed"))
    });

    let parsed = parse_str(&input).expect("parse failed");
    c.bench_function("emit raw", |b| {
        b.iter(|| write_elements(black_box(&parsed.elements), Format::Raw).expect("emit failed"))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
