use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use clap::{Parser, ValueEnum};
use log::{error, info};
use serde::Deserialize;

use phono_synth_core::cache::DEFAULT_CACHE_FILE;
use phono_synth_core::io::read_text;
use phono_synth_core::phoneme::espeak::{DEFAULT_PROGRAM, DEFAULT_VOICE};
use phono_synth_core::phoneme::remote::DEFAULT_URL;
use phono_synth_core::{
	ChunkMode, CorpusModel, Criterion, Direction, GroupSize, JsonFileCache, MemoryCache, PhonemeSource, SourceConfig,
	StaticPhonemeSource, SynthError, SynthesisParams, Synthesizer, TranscriptionCache, TranscriptionMarks, Transcriptions,
	text,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceKind {
	Remote,
	Espeak,
}

/// HTTP front end for phonetic text synthesis.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Transcription cache file
	#[arg(long, default_value = DEFAULT_CACHE_FILE)]
	cache: PathBuf,

	#[arg(long, value_enum, default_value_t = SourceKind::Remote)]
	source: SourceKind,

	/// Lookup form url of the remote source
	#[arg(long, default_value = DEFAULT_URL)]
	url: String,

	/// Phonemizer executable of the espeak source
	#[arg(long, default_value = DEFAULT_PROGRAM)]
	program: String,

	/// Voice of the espeak source
	#[arg(long, default_value = DEFAULT_VOICE)]
	voice: String,

	/// Serve from a fixed JSON word → transcription table, without
	/// touching any provider or the cache file
	#[arg(long, value_name = "TABLE")]
	dry_run: Option<PathBuf>,
}

/// Body of `POST /v1/synthesize`
#[derive(Deserialize)]
struct SynthesizeRequest {
	text: String,
	mode: Option<String>,
	direction: Option<String>,
	criterion: Option<String>,
	threshold: Option<f64>,
	group_size: Option<u8>,
}

/// Body of `POST /v1/distribution`
#[derive(Deserialize)]
struct DistributionRequest {
	text: String,
	group_size: Option<u8>,
}

/// Provider and cache shared by every request.
///
/// The lock is held for a whole corpus build so that two requests never
/// interleave their cache checkpoints.
struct SharedData {
	source: Box<dyn PhonemeSource + Send + Sync>,
	cache: Box<dyn TranscriptionCache + Send>,
	marks: TranscriptionMarks,
}

/// Failure of a request handler.
#[derive(Debug)]
enum ApiError {
	Lock,
	Blocking,
	Synth(SynthError),
}

impl From<SynthError> for ApiError {
	fn from(e: SynthError) -> Self {
		ApiError::Synth(e)
	}
}

impl ApiError {
	fn into_response(self) -> HttpResponse {
		match self {
			ApiError::Lock => HttpResponse::InternalServerError().body("Shared state lock failed"),
			ApiError::Blocking => HttpResponse::InternalServerError().body("Worker pool failure"),
			ApiError::Synth(e) if e.is_provider_failure() => {
				error!("{e}");
				HttpResponse::BadGateway().body(e.to_string())
			}
			ApiError::Synth(e @ SynthError::InvalidParameter(_)) => HttpResponse::BadRequest().body(e.to_string()),
			ApiError::Synth(e) => {
				error!("{e}");
				HttpResponse::InternalServerError().body(e.to_string())
			}
		}
	}
}

impl SynthesizeRequest {
	/// Resolves the optional fields against the defaults.
	fn params(&self) -> Result<SynthesisParams, SynthError> {
		let mut params = SynthesisParams::default();
		if let Some(mode) = &self.mode {
			params.mode = mode.parse::<ChunkMode>()?;
		}
		if let Some(direction) = &self.direction {
			params.direction = direction.parse::<Direction>()?;
		}
		if let Some(criterion) = &self.criterion {
			params.criterion = criterion.parse::<Criterion>()?;
		}
		if let Some(size) = self.group_size {
			params.group_size = GroupSize::new(size)?;
		}
		if let Some(threshold) = self.threshold {
			params.set_threshold(threshold)?;
		}
		Ok(params)
	}
}

impl SharedData {
	fn from_args(args: &Args) -> Result<Self, SynthError> {
		if let Some(table) = &args.dry_run {
			let mapping: Transcriptions = serde_json::from_str(&read_text(table)?)?;
			info!("dry run: {} transcriptions from {}", mapping.len(), table.display());
			return Ok(Self {
				source: Box::new(StaticPhonemeSource::new(mapping)),
				cache: Box::new(MemoryCache::default()),
				marks: TranscriptionMarks::default(),
			});
		}

		let config = match args.source {
			SourceKind::Remote => SourceConfig::Remote { url: args.url.clone() },
			SourceKind::Espeak => SourceConfig::Espeak {
				program: args.program.clone(),
				voice: args.voice.clone(),
			},
		};
		info!("phoneme source: {config:?}, cache: {}", args.cache.display());
		Ok(Self {
			source: config.build()?,
			cache: Box::new(JsonFileCache::new(&args.cache)),
			marks: TranscriptionMarks::default(),
		})
	}
}

fn build_corpus(data: &Mutex<SharedData>, raw: &str) -> Result<CorpusModel, ApiError> {
	if text::is_blank(raw) {
		return Err(SynthError::InvalidParameter("text has no words".to_owned()).into());
	}
	let mut shared = data.lock().map_err(|_| ApiError::Lock)?;
	let shared = &mut *shared;
	Ok(CorpusModel::build(raw, &*shared.source, &mut *shared.cache, &shared.marks)?)
}

/// HTTP POST endpoint `/v1/synthesize`
///
/// Builds the corpus of `text` and returns the synthesis report as JSON.
#[post("/v1/synthesize")]
async fn post_synthesize(data: web::Data<Mutex<SharedData>>, body: web::Json<SynthesizeRequest>) -> impl Responder {
	let request = body.into_inner();
	let params = match request.params() {
		Ok(p) => p,
		Err(e) => return ApiError::from(e).into_response(),
	};

	let outcome = web::block(move || -> Result<_, ApiError> {
		let corpus = build_corpus(&data, &request.text)?;
		Ok(Synthesizer::new(&corpus, params).run()?)
	})
	.await;

	match outcome {
		Ok(Ok(report)) => {
			info!("{}", report.summary());
			HttpResponse::Ok().json(report)
		}
		Ok(Err(e)) => e.into_response(),
		Err(_) => ApiError::Blocking.into_response(),
	}
}

/// HTTP POST endpoint `/v1/distribution`
///
/// Returns the corpus-wide phoneme-group distribution of `text`.
#[post("/v1/distribution")]
async fn post_distribution(data: web::Data<Mutex<SharedData>>, body: web::Json<DistributionRequest>) -> impl Responder {
	let request = body.into_inner();
	let group_size = match request.group_size.map(GroupSize::new).transpose() {
		Ok(size) => size.unwrap_or_default(),
		Err(e) => return ApiError::from(e).into_response(),
	};

	let outcome = web::block(move || -> Result<_, ApiError> {
		let corpus = build_corpus(&data, &request.text)?;
		Ok(corpus.corpus_percentage(group_size))
	})
	.await;

	match outcome {
		Ok(Ok(distribution)) => HttpResponse::Ok().json(distribution),
		Ok(Err(e)) => e.into_response(),
		Err(_) => ApiError::Blocking.into_response(),
	}
}

#[get("/v1/cache")]
async fn get_cache(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let outcome = web::block(move || -> Result<_, ApiError> {
		let shared = data.lock().map_err(|_| ApiError::Lock)?;
		Ok(shared.cache.get().len())
	})
	.await;

	match outcome {
		Ok(Ok(count)) => HttpResponse::Ok().body(count.to_string()),
		Ok(Err(e)) => e.into_response(),
		Err(_) => ApiError::Blocking.into_response(),
	}
}

#[get("/v1/health")]
async fn get_health() -> impl Responder {
	HttpResponse::Ok().body("ok")
}

/// Main entry point for the server.
///
/// Builds the phoneme source and cache before the async runtime starts
/// (the blocking HTTP client must not be created inside it), wraps them in
/// a `Mutex` and serves the API.
fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let shared_data = SharedData::from_args(&args).map_err(|e| std::io::Error::other(e.to_string()))?;
	let shared_data = web::Data::new(Mutex::new(shared_data));
	let app_data = shared_data.clone();
	let address = (args.host.clone(), args.port);
	info!("listening on {}:{}", address.0, address.1);

	actix_web::rt::System::new().block_on(async move {
		HttpServer::new(move || {
			App::new()
				.wrap(Cors::permissive())
				.app_data(app_data.clone())
				.service(post_synthesize)
				.service(post_distribution)
				.service(get_cache)
				.service(get_health)
		})
			.bind(address)?
			.run()
			.await
	})?;

	drop(shared_data);
	Ok(())
}
