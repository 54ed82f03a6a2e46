use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sat_syntax::{Parser, Status};

const SAMPLE: &[u8] = br#"
package: sat-syntax
description:
  Incremental, indentation-sensitive parser for the sat surface syntax
  distributed under an open license

dependencies:
  core 1 2 3
  extra (a b c) (d e f)
  inline { x; y; z }

# trailing remark
targets: lib bench test
"#;

fn parse_all(input: &[u8]) {
    let mut parser = Parser::new("root");
    let buf = parser.acquire_buffer(input.len()).unwrap();
    buf[..input.len()].copy_from_slice(input);
    parser.commit(input.len(), true);
    loop {
        match parser.step().unwrap() {
            Status::Ready => {
                while let Some(expr) = parser.next_result() {
                    black_box(expr);
                }
            }
            Status::More => continue,
            Status::Done => break,
        }
    }
}

fn parse_sat_benchmark(c: &mut Criterion) {
    c.bench_function("parse_sat_syntax", |b| {
        b.iter(|| parse_all(black_box(SAMPLE)));
    });
}

criterion_group!(benches, parse_sat_benchmark);
criterion_main!(benches);
