use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bytes::Bytes;

use msgdump::{FeedExtractor, PullExtractor, RecordRead};

const N_MESSAGES: usize = 1000;

fn synth_dump(n: usize) -> Vec<u8> {
	let mut doc = String::with_capacity(n * 256);
	doc.push_str("<FileDump>");
	for i in 0..n {
		doc.push_str(&format!(
			"<Message><From>user{}@example.com</From><Message>Neque porro <b class=\"x\">quisquam</b> est qui <script>alert({})</script> dolorem ipsum</Message></Message>",
			i, i
		));
	}
	doc.push_str("</FileDump>");
	doc.into_bytes()
}

fn benchmark(c: &mut Criterion) {
	let doc = synth_dump(N_MESSAGES);
	let chunk = Bytes::from(doc.clone());

	c.bench_function("feed_extract", |b| {
		b.iter(|| {
			let mut fx = FeedExtractor::new();
			fx.feed(chunk.clone());
			fx.feed_eof();
			let mut n = 0usize;
			fx.read_all(|rec| {
				black_box(&rec);
				n += 1;
			})
			.unwrap();
			assert_eq!(n, N_MESSAGES);
		})
	});

	c.bench_function("pull_extract", |b| {
		b.iter(|| {
			let mut src = &doc[..];
			let mut px = PullExtractor::new(&mut src);
			let mut n = 0usize;
			px.read_all(|rec| {
				black_box(&rec);
				n += 1;
			})
			.unwrap();
			assert_eq!(n, N_MESSAGES);
		})
	});
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
