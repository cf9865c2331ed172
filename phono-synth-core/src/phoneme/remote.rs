use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};

use super::PhonemeSource;
use crate::error::{SynthError, SynthResult};

pub const DEFAULT_URL: &str = "http://upodn.com/phon.php";

const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/57.0.2987.133 Safari/537.36";

/// Transcribes words by posting them to an HTML phonetic converter and
/// scraping the answer.
///
/// The transcription is the text of the first `<font>` element inside the
/// second `<td>` of the response.
///
/// The underlying blocking client must not be created (or dropped) inside
/// an async runtime.
#[derive(Debug)]
pub struct RemotePhonemeSource {
	url: String,
	client: Client,
}

impl RemotePhonemeSource {
	/// Creates a source posting to `url` with a 10 s timeout.
	///
	/// # Errors
	/// Returns an error if the HTTP client cannot be built.
	pub fn new(url: &str) -> SynthResult<Self> {
		let client = Client::builder()
			.timeout(Duration::new(10, 0))
			.build()
			.map_err(|e| SynthError::Http(e.to_string()))?;
		Ok(Self {
			url: url.to_owned(),
			client,
		})
	}

	fn fetch(&self, word: &str) -> reqwest::Result<String> {
		self.client
			.post(&self.url)
			.header(USER_AGENT, BROWSER_AGENT)
			.form(&[("intext", word), ("ipa", "0")])
			.send()?
			.error_for_status()?
			.text()
	}
}

impl PhonemeSource for RemotePhonemeSource {
	fn text_to_phoneme(&self, word: &str) -> SynthResult<String> {
		let html = self.fetch(word).map_err(|e| SynthError::Http(e.to_string()))?;
		let transcription = extract_transcription(&html)?;
		debug!("{} -> {transcription}", word);
		Ok(transcription)
	}
}

fn selector(css: &str) -> SynthResult<Selector> {
	Selector::parse(css).map_err(|e| SynthError::Scrape(format!("invalid selector `{css}`: {e:?}")))
}

/// Pulls the transcription field out of the converter's response page.
pub(crate) fn extract_transcription(html: &str) -> SynthResult<String> {
	let document = Html::parse_document(html);
	let cell = selector("td")?;
	let font = selector("font")?;

	let text = document
		.select(&cell)
		.nth(1)
		.and_then(|td| td.select(&font).next())
		.map(|element| element.text().collect::<String>())
		.ok_or_else(|| SynthError::Scrape("second table cell has no <font> element".to_owned()))?;

	Ok(text.trim().to_owned())
}
