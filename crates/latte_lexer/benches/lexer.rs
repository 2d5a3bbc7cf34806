use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use latte_lexer::{tokenize, LexOptions};

const SAMPLE: &str = r##"# order bookkeeping
grind = (beans, setting = 5) ->
  throw 'no beans' unless beans?
  beans.size / setting

class Order
  constructor: (@drink, @shots = 1) ->

  total: ->
    base = prices[@drink] ? 2.5
    base + 0.5 * (@shots - 1)

prices =
  espresso: 2.0
  latte: 3.5
  mocha: 4.25

orders = for name, price of prices
  new Order name

report = (order) ->
  label = "#{order.drink}: #{order.total()}"
  console.log label if verbose

matcher = ///
  ^ (espresso | latte | mocha)   # drink
  \s+ x (\d+)                    # shot count
///i

parse = (line) ->
  [_, drink, shots] = line.match matcher
  switch drink
    when 'espresso' then new Order drink, +shots
    when 'latte', 'mocha'
      order = new Order drink, +shots
      order
    else null

report order for order in orders when order?
"##;

pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample");
    group.throughput(Throughput::Bytes(SAMPLE.len() as u64));
    group.bench_function("scan", |b| {
        b.iter(|| {
            tokenize(black_box(SAMPLE), LexOptions { rewrite: false, ..Default::default() })
        })
    });
    group.bench_function("scan_rewrite", |b| {
        b.iter(|| tokenize(black_box(SAMPLE), LexOptions::default()))
    });
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
