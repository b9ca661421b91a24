mod api_error;
mod session_store;

use std::env;
use std::sync::PoisonError;

use actix_cors::Cors;
use actix_web::cookie::Cookie;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, get, middleware, post, web};
use log::{debug, info};
use rs_chat_core::{ChatRequest, Generator, GeneratorConfig};
use serde::Serialize;

use api_error::ApiError;
use session_store::SessionStore;

const SESSION_COOKIE: &str = "rs_chat_session";
const DEFAULT_BIND: &str = "127.0.0.1:5000";

struct AppState {
	generator: Generator,
	sessions: SessionStore,
}

#[derive(Serialize)]
struct ResetResponse {
	reset: bool,
}

fn session_cookie(id: String) -> Cookie<'static> {
	Cookie::build(SESSION_COOKIE, id).path("/").http_only(true).finish()
}

/// HTTP POST endpoint `/v1/chat`
///
/// Answers the JSON `ChatRequest` within the conversation named by the
/// session cookie. Without a live session the reply runs on a fresh one,
/// which is stored only if the request succeeds.
#[post("/v1/chat")]
async fn post_chat(
	req: HttpRequest,
	data: web::Data<AppState>,
	body: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
	let request = body.into_inner();
	let existing = req.cookie(SESSION_COOKIE).and_then(|cookie| {
		let id = cookie.value().to_owned();
		data.sessions.get(&id).map(|session| (id, session))
	});

	let state = data.clone();
	let (id, response) = match existing {
		Some((id, session)) => {
			let response = web::block(move || {
				let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
				state.generator.reply(&mut session, &request)
			})
			.await??;
			(id, response)
		}
		None => {
			let (session, response) = web::block(move || {
				let mut session = state.generator.new_session();
				state.generator.reply(&mut session, &request).map(|response| (session, response))
			})
			.await??;
			let id = data.sessions.insert(session);
			debug!("new session, {} active", data.sessions.len());
			(id, response)
		}
	};

	Ok(HttpResponse::Ok().cookie(session_cookie(id)).json(response))
}

/// HTTP POST endpoint `/v1/reset`
///
/// Clears the history of the caller's conversation, if there is one. The
/// session lock may be held by a running reply, so it is taken off the
/// async worker.
#[post("/v1/reset")]
async fn post_reset(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
	let session = req.cookie(SESSION_COOKIE).and_then(|cookie| data.sessions.get(cookie.value()));
	let reset = match session {
		Some(session) => {
			web::block(move || session.lock().unwrap_or_else(PoisonError::into_inner).reset()).await?;
			true
		}
		None => false,
	};
	Ok(HttpResponse::Ok().json(ResetResponse { reset }))
}

/// HTTP GET endpoint `/v1/models`
///
/// Lists the weights files of the models directory, newest first.
#[get("/v1/models")]
async fn get_models(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
	Ok(HttpResponse::Ok().json(data.generator.list_models()?))
}

/// HTTP GET endpoint `/v1/models/{name}`
///
/// Loads the weights file if needed and returns its summary.
#[get("/v1/models/{name}")]
async fn get_model_info(data: web::Data<AppState>, name: web::Path<String>) -> Result<HttpResponse, ApiError> {
	let name = name.into_inner();
	let state = data.clone();
	let info = web::block(move || state.generator.model_info(&name)).await??;
	Ok(HttpResponse::Ok().json(info))
}

/// Rejected JSON bodies get the same `{"error": ...}` shape as other errors.
fn json_config() -> web::JsonConfig {
	web::JsonConfig::default().error_handler(|err, _req| ApiError::Body(err.to_string()).into())
}

fn routes(cfg: &mut web::ServiceConfig) {
	cfg.app_data(json_config())
		.service(post_chat)
		.service(post_reset)
		.service(get_models)
		.service(get_model_info);
}

fn load_config() -> std::io::Result<GeneratorConfig> {
	match env::var("RS_CHAT_CONFIG") {
		Ok(path) => {
			info!("reading configuration from {path}");
			GeneratorConfig::from_file(&path).map_err(std::io::Error::other)
		}
		Err(_) => Ok(GeneratorConfig::default()),
	}
}

/// Main entry point for the server.
///
/// Reads the engine configuration, then starts an Actix-web HTTP server
/// sharing one `Generator` and one session store between all workers.
///
/// # Notes
/// - `RS_CHAT_CONFIG` names an optional TOML configuration file.
/// - `RS_CHAT_BIND` overrides the listening address (default 127.0.0.1:5000).
/// - `RUST_LOG` sets the log level (default `info`).
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = load_config()?;
	let generator = Generator::new(config).map_err(std::io::Error::other)?;
	let state = web::Data::new(AppState { generator, sessions: SessionStore::default() });

	let bind = env::var("RS_CHAT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_owned());
	info!("listening on {bind}");

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.wrap(middleware::Logger::default())
			.app_data(state.clone())
			.configure(routes)
	})
		.workers(num_cpus::get())
		.bind(bind.as_str())?
		.run()
		.await
}
