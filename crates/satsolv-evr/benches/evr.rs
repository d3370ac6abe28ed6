use criterion::{black_box, criterion_group, criterion_main, Criterion};
use satsolv_evr::{compare_evr, parse_dependency, vercmp, EvrCmp};

fn bench_vercmp(c: &mut Criterion) {
    let cases = [
        ("1.2.3", "1.2.4"),
        ("2.4.0alpha", "2.4.0"),
        ("1.0.10", "1.0.9"),
        ("2020.04.20", "2020.4.20"),
        ("1.2.3rc1", "1.2.3"),
        ("0.99.5.20240101", "0.99.5.20231231"),
    ];

    c.bench_function("vercmp", |b| {
        b.iter(|| {
            for (left, right) in cases {
                black_box(vercmp(black_box(left), black_box(right)));
            }
        })
    });
}

fn bench_compare_evr(c: &mut Criterion) {
    let cases = [
        ("1:2.17-55.el7", "2.17-55.el7"),
        ("2.17-55.el7", "2.17-106.el7"),
        ("0:1.0", "1.0"),
        ("3.10.0-1160.el7", "3.10.0-957.el7"),
        ("bad token", "1.0"),
    ];

    c.bench_function("compare_evr", |b| {
        b.iter(|| {
            for (left, right) in cases {
                black_box(compare_evr(black_box(left), black_box(right), EvrCmp::Compare));
                black_box(compare_evr(black_box(left), black_box(right), EvrCmp::MatchRelease));
            }
        })
    });
}

fn bench_parse_dependency(c: &mut Criterion) {
    let deps = ["glibc >= 2:2.17-55", "libfoo", "bar<2", "python3 = 3.6.8-18.el7"];

    c.bench_function("parse_dependency", |b| {
        b.iter(|| {
            for dep in deps {
                let _ = black_box(parse_dependency(black_box(dep)));
            }
        })
    });
}

criterion_group!(benches, bench_vercmp, bench_compare_evr, bench_parse_dependency);
criterion_main!(benches);
