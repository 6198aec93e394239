use criterion::{criterion_group, criterion_main, Criterion};

use rendershot::{prepare_document, RenderOptions, StyleLibraries, Template};

// Everything up to the browser: render, style extraction, assembly and encoding
fn bench_prepare_document(c: &mut Criterion) {
    let mut rows = String::new();
    for i in 0..200 {
        rows.push_str(&format!(
            "<li class=\"{{{{css padding:{}px}}}}\">{{{{item}}}} {}</li>",
            i % 8,
            i
        ));
    }
    let list = Template::new(format!("<ul class=\"{{{{css margin:0}}}}\">{}</ul>", rows));
    let libraries = StyleLibraries::default();

    for library in [None, Some("styled-components"), Some("emotion")] {
        let mut opts = RenderOptions::new(800, 600);
        opts.props.insert("item".into(), "row".into());
        opts.css_library = library.map(String::from);

        let name = format!("prepare_document/{}", library.unwrap_or("none"));
        c.bench_function(&name, |b| {
            b.iter(|| prepare_document(&libraries, &list, &opts).unwrap())
        });
    }
}

criterion_group!(benches, bench_prepare_document);
criterion_main!(benches);
