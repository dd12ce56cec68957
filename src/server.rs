//! HTTP endpoints for the chat widget.

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ChatError;
use crate::export::ExportOptions;
use crate::language::Language;
use crate::session::{ChatReply, ChatService};

impl ResponseError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChatError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ChatError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    pub session_id: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub reply: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub messages: Option<bool>,
    pub context: Option<bool>,
    pub anonymize: Option<bool>,
}

impl From<ExportQuery> for ExportOptions {
    fn from(query: ExportQuery) -> Self {
        let defaults = ExportOptions::default();
        ExportOptions {
            include_messages: query.messages.unwrap_or(defaults.include_messages),
            include_context: query.context.unwrap_or(defaults.include_context),
            anonymize: query.anonymize.unwrap_or(defaults.anonymize),
        }
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("index.html"))
}

#[post("/session")]
async fn open_session(
    req: Option<web::Json<OpenSessionRequest>>,
    data: web::Data<ChatService>,
) -> Result<HttpResponse, ChatError> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    let language = req
        .language
        .as_deref()
        .map(str::parse::<Language>)
        .transpose()?;
    let snapshot = data.open_session(req.session_id.as_deref(), language);
    Ok(HttpResponse::Ok().json(snapshot))
}

#[post("/chat")]
async fn chat(req: web::Json<ChatRequest>, data: web::Data<ChatService>) -> Result<HttpResponse, ChatError> {
    if req.message.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "message is empty" })));
    }
    let reply = data.send_message(&req.session_id, &req.message).await?;
    Ok(HttpResponse::Ok().json(ChatResponseBody { reply }))
}

#[post("/session/{id}/clear")]
async fn clear_session(path: web::Path<String>, data: web::Data<ChatService>) -> Result<HttpResponse, ChatError> {
    let snapshot = data.clear_session(&path)?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[post("/session/{id}/language")]
async fn switch_language(
    path: web::Path<String>,
    req: web::Json<LanguageRequest>,
    data: web::Data<ChatService>,
) -> Result<HttpResponse, ChatError> {
    let language: Language = req.language.parse()?;
    let snapshot = data.switch_language(&path, language)?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[get("/session/{id}/stats")]
async fn session_stats(path: web::Path<String>, data: web::Data<ChatService>) -> Result<HttpResponse, ChatError> {
    Ok(HttpResponse::Ok().json(data.stats(&path)?))
}

#[get("/session/{id}/export")]
async fn export_session(
    path: web::Path<String>,
    query: web::Query<ExportQuery>,
    data: web::Data<ChatService>,
) -> Result<HttpResponse, ChatError> {
    let export = data.export(&path, query.into_inner().into())?;
    Ok(HttpResponse::Ok().json(export))
}

#[delete("/session/{id}")]
async fn close_session(path: web::Path<String>, data: web::Data<ChatService>) -> Result<HttpResponse, ChatError> {
    data.close_session(&path)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Registers every chat endpoint; the caller provides `web::Data<ChatService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(open_session)
        .service(chat)
        .service(clear_session)
        .service(switch_language)
        .service(session_stats)
        .service(export_session)
        .service(close_session);
}
