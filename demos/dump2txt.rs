use std::io;
use std::process::exit;

use msgdump::{Error, PullExtractor, RecordRead, TAG_FROM, TAG_MESSAGE};

fn main() {
	let stdin = io::BufReader::new(io::stdin());
	let mut extractor = PullExtractor::new(stdin);
	let mut count = 0usize;
	let result = extractor.read_all(|rec| {
		let from = rec.get(TAG_FROM).map(|v| v.as_str()).unwrap_or("(missing)");
		let body = rec
			.get(TAG_MESSAGE)
			.map(|v| v.as_str())
			.unwrap_or("(missing)");
		println!("From: {}", from);
		println!("Message: {}", body);
		println!();
		count += 1;
	});
	match result {
		Ok(()) => eprintln!("finished, {} message(s)", count),
		Err(Error::IO(e)) => {
			eprintln!("I/O error: {}", e);
			exit(1);
		}
		Err(e) => {
			eprintln!("invalid dump on input: {}", e);
			exit(1);
		}
	}
}
