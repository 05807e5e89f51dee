//! HTTP server and router
//!
//! `trailmap serve` → single-threaded tiny_http loop. Every `/api/*` route
//! dispatches into the handler modules and answers JSON; `/uploads/*` serves
//! stored attachment bytes back.

use std::io::Read;

use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::api::{self, internal, not_found, parse_query, ApiReply, ApiResult};
use crate::store::Store;

// One byte over the upload cap so oversized bodies are seen, not truncated
const MAX_BODY_BYTES: u64 = (api::upload::MAX_FILE_SIZE as u64) + 1;

/// Everything a request handler needs, owned for the lifetime of the server.
pub struct ServerContext {
    pub store: Store,
    pub github_token: Option<String>,
}

/// Run the API server until the process is interrupted.
pub fn start_server(port: u16, ctx: ServerContext) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    eprintln!("\n\x1b[1;32m🗺  trailmap\x1b[0m");
    eprintln!("   API: http://localhost:{}/api", port);
    eprintln!("   Press Ctrl+C to stop\n");

    serve(server, ctx);
    Ok(())
}

/// Drive an already-bound server until its listener closes.
pub fn serve(server: Server, ctx: ServerContext) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&ctx, request) {
            eprintln!("Error: {}", e);
        }
    }
}

fn handle_request(ctx: &ServerContext, mut request: Request) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/").to_string();
    let raw_query = url.split_once('?').map(|(_, q)| q.to_string());
    let method = request.method().clone();

    // Attachment bytes bypass the JSON envelope entirely
    if method == Method::Get {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if let ["uploads", section_id, filename] = segments.as_slice() {
            return serve_upload(ctx, request, section_id, filename);
        }
    }

    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string());

    let mut body = Vec::new();
    if let Err(e) = request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut body)
    {
        let reply = api::bad_request(format!("Failed to read body: {}", e));
        return respond_json(request, reply);
    }

    let reply = route(
        ctx,
        &method,
        &path,
        raw_query.as_deref(),
        content_type.as_deref(),
        &body,
    )
    .unwrap_or_else(|e| internal(e.to_string()));
    respond_json(request, reply)
}

fn respond_json(request: Request, reply: ApiReply) -> std::io::Result<()> {
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap());
    request.respond(response)
}

/// Dispatch one request to its handler. Pure over the parsed request parts,
/// so the whole route table is exercisable without a socket.
pub fn route(
    ctx: &ServerContext,
    method: &Method,
    path: &str,
    raw_query: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> ApiResult {
    let store = &ctx.store;
    let query = parse_query(raw_query);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (Method::Get, [""]) => Ok(api::ok(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }))),

        // Roadmap
        (Method::Get, ["api", "roadmap"]) => api::roadmap::get_roadmap(store),
        (Method::Put, ["api", "roadmap"]) => api::roadmap::put_roadmap(store, body),
        (Method::Post, ["api", "roadmap"]) => api::roadmap::add_phase(store, body),
        (Method::Get, ["api", "roadmap", pid]) => api::roadmap::get_phase(store, pid),
        (Method::Put, ["api", "roadmap", pid]) => api::roadmap::update_phase(store, pid, body),
        (Method::Delete, ["api", "roadmap", pid]) => api::roadmap::delete_phase(store, pid),
        (Method::Post, ["api", "roadmap", pid, "sections"]) => {
            api::roadmap::add_section(store, pid, body)
        }
        (Method::Put, ["api", "roadmap", pid, "sections"]) => {
            api::roadmap::reorder_sections(store, pid, body)
        }
        (Method::Get, ["api", "roadmap", pid, "sections", sid]) => {
            api::roadmap::get_section(store, pid, sid)
        }
        (Method::Put, ["api", "roadmap", pid, "sections", sid]) => {
            api::roadmap::update_section(store, pid, sid, body)
        }
        (Method::Delete, ["api", "roadmap", pid, "sections", sid]) => {
            api::roadmap::delete_section(store, pid, sid)
        }

        // Progress
        (Method::Get, ["api", "progress"]) => api::progress::get_all(store),
        (Method::Put, ["api", "progress"]) => api::progress::put_all(store, body),
        (Method::Post, ["api", "progress"]) => api::progress::init_section(store, body),
        (Method::Get, ["api", "progress", sid]) => api::progress::get_section(store, sid),
        (Method::Put, ["api", "progress", sid]) => api::progress::put_section(store, sid, body),
        (Method::Patch, ["api", "progress", sid]) => api::progress::patch_section(store, sid, body),

        // Notes
        (Method::Get, ["api", "notes"]) => api::notes::list(store, &query),
        (Method::Post, ["api", "notes"]) => api::notes::create(store, body),
        (Method::Get, ["api", "notes", id]) => api::notes::get(store, id),
        (Method::Put, ["api", "notes", id]) => api::notes::update(store, id, body),
        (Method::Delete, ["api", "notes", id]) => api::notes::delete(store, id),

        // Resources
        (Method::Get, ["api", "resources"]) => api::resources::list(store, &query),
        (Method::Post, ["api", "resources"]) => api::resources::create(store, body),
        (Method::Get, ["api", "resources", id]) => api::resources::get(store, id),
        (Method::Put, ["api", "resources", id]) => api::resources::update(store, id, body),
        (Method::Delete, ["api", "resources", id]) => api::resources::delete(store, id),

        // Projects
        (Method::Get, ["api", "projects"]) => api::projects::list(store),
        (Method::Post, ["api", "projects"]) => api::projects::create(store, body),
        (Method::Get, ["api", "projects", id]) => api::projects::get(store, id),
        (Method::Put, ["api", "projects", id]) => api::projects::update(store, id, body),
        (Method::Delete, ["api", "projects", id]) => api::projects::delete(store, id),
        (Method::Post, ["api", "projects", id, "github"]) => {
            api::projects::refresh_github(store, id, &query, ctx.github_token.as_deref())
        }

        // Settings
        (Method::Get, ["api", "settings"]) => api::settings::get(store),
        (Method::Put, ["api", "settings"]) => api::settings::put(store, body),
        (Method::Post, ["api", "settings"]) => api::settings::record_session(store, body),

        // Uploads
        (Method::Post, ["api", "upload"]) => api::upload::post(store, &query, content_type, body),
        (Method::Get, ["api", "upload"]) => api::upload::list(store, &query),
        (Method::Delete, ["api", "upload", filename]) => {
            api::upload::delete(store, filename, &query)
        }

        // Backup
        (Method::Post, ["api", "backup"]) => api::backup::post(store),

        _ => Ok(not_found(format!("No route for {} {}", method, path))),
    }
}

fn serve_upload(
    ctx: &ServerContext,
    request: Request,
    section_id: &str,
    filename: &str,
) -> std::io::Result<()> {
    if section_id.contains("..") || filename.contains("..") {
        return respond_json(request, api::bad_request("Invalid path"));
    }
    let path = ctx.store.upload_path(section_id, filename);
    match std::fs::read(&path) {
        Ok(bytes) => {
            let mime = content_type_for(filename);
            let response = Response::from_data(bytes).with_header(
                Header::from_bytes(&b"Content-Type"[..], mime.as_bytes()).unwrap(),
            );
            request.respond(response)
        }
        Err(_) => respond_json(request, not_found("File not found")),
    }
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default();
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
