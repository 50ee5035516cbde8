use criterion::{criterion_group, criterion_main, Criterion};
use sift_core::tokenizer::tokenize;
use sift_core::StopWords;

const TEXT: &str = "From: someone@example.com (Some One)\n\
Subject: Re: science and religion, again?\n\
\n\
In article <1993Apr5.123456@example.com>, another writes:\n\
> Is there any evidence that the two are compatible? I'd like to see some \"real\" data.\n\
Plenty of scientists have been religious; plenty haven't. Neither fact settles anything.\n";

fn bench_tokenize(c: &mut Criterion) {
    let stop = StopWords::english();
    c.bench_function("tokenize_newsgroup_post", |b| {
        b.iter(|| TEXT.lines().map(|l| tokenize(l, 15, &stop).len()).sum::<usize>())
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
