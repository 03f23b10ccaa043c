use criterion::{Criterion, black_box, criterion_group, criterion_main};

use peerclass::content::{flatten, render, sanitize};
use peerclass::ui::components::comment_card::content_lines;
use peerclass::ui::theme::Theme;

fn make_comment(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "<p>Figure {i} shows <b>duplicated</b> bands in panel <i>B</i>; see \
                 <a href=\"https://example.org/f{i}\" target=\"_blank\">this image</a>.\
                 <br>p &lt; 0.05 <script>alert({i})</script></p>\
                 <ul><li>first point</li><li>second <code>n={i}</code></li></ul>"
            )
        })
        .collect()
}

fn bench_sanitize(c: &mut Criterion) {
    let html = make_comment(200);

    c.bench_function("sanitize (200 paragraphs)", |b| {
        b.iter(|| sanitize(black_box(&html)))
    });
}

fn bench_flatten(c: &mut Criterion) {
    let clean = sanitize(&make_comment(200));

    c.bench_function("flatten (200 paragraphs)", |b| {
        b.iter(|| flatten(black_box(&clean)))
    });
}

fn bench_full_render(c: &mut Criterion) {
    let html = make_comment(200);
    let theme = Theme::default();

    c.bench_function("render + content_lines (200 paragraphs)", |b| {
        b.iter(|| {
            let content = render(black_box(&html));
            content_lines(&content, &theme)
        })
    });
}

criterion_group!(benches, bench_sanitize, bench_flatten, bench_full_render);
criterion_main!(benches);
