//! Benchmarks for deck loading and export.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use slidedeck::{Deck, Location, Target, serialize_document};

/// A synthetic deck with a mix of headings, lists, tables and formulas.
fn sample_deck(pages: usize) -> String {
    let mut out = String::from("<body dpc='white'>\n");
    for i in 0..pages {
        out.push_str(&format!(
            concat!(
                "<page key='p{i} topic{m}'>\n",
                "  <h1>Slide {i}</h1>\n",
                "  <ul>\n    <li>first <b>point</b></li>\n    <li>second &amp; last</li>\n  </ul>\n",
                "  <table><tr><td>a</td><td>b</td></tr></table>\n",
                "  <p>Inline <script type='math/tex'>x_{i}^2</script> formula.</p>\n",
                "  <!-- speaker note {i} -->\n",
                "</page>\n"
            ),
            i = i,
            m = i % 7
        ));
    }
    out.push_str("<bubble id='help'>Keys</bubble>\n</body>");
    out
}

fn bench_open(c: &mut Criterion) {
    let markup = sample_deck(200);
    c.bench_function("open_deck", |b| {
        b.iter(|| Deck::open_str(black_box(&markup)).unwrap())
    });
}

fn bench_export(c: &mut Criterion) {
    let mut deck = Deck::open_str(&sample_deck(200)).unwrap();
    deck.start("#100?view=grid").unwrap();

    for target in [Target::Markup, Target::Highlighted, Target::Typeset] {
        c.bench_function(&format!("export_{target}"), |b| {
            b.iter(|| serialize_document(black_box(&deck.doc), &deck.provenance, target))
        });
    }
}

fn bench_reindex(c: &mut Criterion) {
    let mut deck = Deck::open_str(&sample_deck(200)).unwrap();
    c.bench_function("reindex", |b| b.iter(|| deck.reindex()));
}

fn bench_location_codec(c: &mut Criterion) {
    c.bench_function("location_decode_encode", |b| {
        b.iter(|| {
            let location = Location::decode(black_box("#%C3%BCber?view=grid?tb=0?lang=de"));
            location.encode()
        })
    });
}

criterion_group!(
    benches,
    bench_open,
    bench_export,
    bench_reindex,
    bench_location_codec
);

criterion_main!(benches);
