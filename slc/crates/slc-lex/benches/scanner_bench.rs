//! Scanner throughput benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slc_lex::{LexKind, Scanner};
use slc_util::SourceMap;

fn sample_source(repeats: usize) -> String {
    let unit = "0 while dup 100 < do dup dump 1 + end drop // count up\n\
                \"a string with \\n escapes\" drop drop\n\
                memory buf 1024 end\n";
    unit.repeat(repeats)
}

fn bench_scanner(c: &mut Criterion) {
    let source = sample_source(64);
    c.bench_function("scan_64_blocks", |b| {
        b.iter(|| {
            let mut sources = SourceMap::new();
            let id = sources.add_file("bench.sl", source.as_str());
            let mut scanner = Scanner::new(sources.file(id).unwrap());
            let mut count = 0usize;
            loop {
                let token = scanner.next_token().unwrap();
                if token.kind == LexKind::Eof {
                    break;
                }
                count += 1;
            }
            black_box(count)
        })
    });
}

criterion_group!(benches, bench_scanner);
criterion_main!(benches);
