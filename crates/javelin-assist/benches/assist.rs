use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use javelin_assist::{parse_for_completion, parse_for_selection, ParseMode};

const SMALL_JAVA: &str = "package bench;

import java.util.List;

public class Small {
  private final List<String> names;

  Small(List<String> names) { this.names = names; }

  int count(String prefix) {
    int n = 0;
    for (String name : names) {
      if (name.startsWith(prefix)) { n++; }
    }
    return n;
  }
}
";

fn large_java_source() -> String {
    let mut out = String::from("package bench;\n\npublic class Large {\n");
    for i in 0..1000u32 {
        out.push_str(&format!(
            "  public int method{0}(int x) {{ int y = x + {0}; return y * 2; }}\n",
            i
        ));
    }
    out.push_str("}\n");
    out
}

/// Caret at the end of `return y` in the middle method of `source`.
fn completion_caret(source: &str) -> usize {
    let methods: Vec<_> = source.match_indices("return y").map(|(idx, _)| idx).collect();
    methods
        .get(methods.len() / 2)
        .map(|idx| idx + "return y".len())
        .unwrap_or(source.len())
}

fn bench_completion(c: &mut Criterion) {
    let large_java = large_java_source();

    let mut group = c.benchmark_group("assist_completion");
    group.measurement_time(Duration::from_secs(2));
    group.warm_up_time(Duration::from_secs(1));
    group.sample_size(20);

    for (id, src) in [("small", SMALL_JAVA), ("large", large_java.as_str())] {
        let caret = completion_caret(src);
        for mode in [ParseMode::Diet, ParseMode::Method] {
            group.bench_with_input(BenchmarkId::new(id, mode), src, |b, src| {
                b.iter(|| black_box(parse_for_completion(black_box(src), caret, mode)))
            });
        }
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let large_java = large_java_source();

    let mut group = c.benchmark_group("assist_selection");
    group.measurement_time(Duration::from_secs(2));
    group.warm_up_time(Duration::from_secs(1));
    group.sample_size(20);

    for (id, src) in [("small", SMALL_JAVA), ("large", large_java.as_str())] {
        let start = src.rfind("x + ").unwrap_or(0);
        group.bench_with_input(BenchmarkId::from_parameter(id), src, |b, src| {
            b.iter(|| black_box(parse_for_selection(black_box(src), start, start + 1)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_completion, bench_selection);
criterion_main!(benches);
