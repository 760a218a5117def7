use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ib_regexp::{matcher::input::ReaderSource, Regex, Syntax};

pub fn criterion_benchmark(c: &mut Criterion) {
    let ascii_20 = "12345678901234567890pyEverythingss";

    c.bench_function("compile_perl5", |b| {
        b.iter(|| Regex::new(black_box(r"(\w+)@(\w+)\.(com|org|net)")))
    });
    c.bench_function("compile_posix_basic", |b| {
        b.iter(|| {
            Regex::builder()
                .syntax(Syntax::POSIX_BASIC)
                .build(black_box(r"\([a-z]*\)\{2,4\}[[:digit:]]\1"))
        })
    });

    {
        let re = Regex::new("ss").unwrap();
        assert!(re.find(ascii_20).is_some());
        c.bench_function("find_literal", |b| b.iter(|| re.find(black_box(ascii_20))));

        let re = regex::Regex::new("ss").unwrap();
        assert!(re.find(ascii_20).is_some());
        c.bench_function("find_literal_regex", |b| {
            b.iter(|| re.find(black_box(ascii_20)))
        });
    }

    {
        let re = Regex::new(r"py[^\\]*ss").unwrap();
        assert!(re.find(ascii_20).is_some());
        c.bench_function("find_backtrack", |b| b.iter(|| re.find(black_box(ascii_20))));

        let re = Regex::new(r"py[^\\]*?ss").unwrap();
        assert!(re.find(ascii_20).is_some());
        c.bench_function("find_backtrack_stingy", |b| {
            b.iter(|| re.find(black_box(ascii_20)))
        });

        let re = Regex::new(r"(\d)\d*\1").unwrap();
        assert!(re.find(ascii_20).is_some());
        c.bench_function("find_backref", |b| b.iter(|| re.find(black_box(ascii_20))));
    }

    let text = "GET /index.html 200\nPOST /api 404\n".repeat(100);
    {
        let re = Regex::new(r"\d{3}").unwrap();
        assert_eq!(re.find_all(&text).len(), 200);
        c.bench_function("find_all", |b| b.iter(|| re.find_all(black_box(&text))));

        c.bench_function("find_iter_reader", |b| {
            b.iter(|| {
                let mut source = ReaderSource::new(black_box(text.as_bytes()));
                re.find_iter(&mut source).count()
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
