use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mirror_pypi::parser::IndexParser;

fn synthetic_index_page(releases: usize) -> String {
    let mut body = String::from("<html><body>\n");
    for i in 0..releases {
        body.push_str(&format!(
            "<a href=\"Django-{i}.0.tar.gz#md5=deadbeef{i:04}\">Django-{i}.0.tar.gz</a>\n"
        ));
    }
    body.push_str("</body></html>");
    body
}

fn bench_parse_index(c: &mut Criterion) {
    let body = synthetic_index_page(500);

    c.bench_function("parse_index_500_releases", |b| {
        b.iter(|| {
            let mut parser = IndexParser::new("django");
            parser
                .parse_index("https://pypi.org/simple/Django/", black_box(&body), true)
                .unwrap();
            black_box(parser.releaselinks())
        });
    });
}

fn bench_releaselinks_sort(c: &mut Criterion) {
    let body = synthetic_index_page(2000);
    let mut parser = IndexParser::new("django");
    parser
        .parse_index("https://pypi.org/simple/Django/", &body, true)
        .unwrap();

    c.bench_function("releaselinks_sort_2000_releases", |b| {
        b.iter(|| black_box(parser.releaselinks()));
    });
}

criterion_group!(benches, bench_parse_index, bench_releaselinks_sort);
criterion_main!(benches);
