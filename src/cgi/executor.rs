//! Runs resolved CGI scripts.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::cgi::resolver::{CgiResolution, is_executable};
use crate::config::ServerConfig;
use crate::http::parser::find_headers_end;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub const GATEWAY_INTERFACE: &str = "CGI/1.1";
pub const SERVER_SOFTWARE: &str = concat!("sensible-server/", env!("CARGO_PKG_VERSION"));

/// Ways a CGI invocation can fail before producing a usable response.
#[derive(Debug)]
pub enum CgiError {
    /// The script named by the resolution does not exist
    NotFound(PathBuf),
    /// The script exists but cannot be executed
    NotExecutable(PathBuf),
    /// The process could not be started
    Spawn(std::io::Error),
    /// The script ran longer than the configured limit
    Timeout,
    /// The output had no header block or an unknown status
    BadOutput(String),
}

impl From<CgiError> for Response {
    fn from(err: CgiError) -> Self {
        match err {
            CgiError::NotFound(_) => Response::not_found(),
            CgiError::NotExecutable(_) => Response::empty(StatusCode::Forbidden),
            CgiError::Spawn(_) => Response::internal_error(),
            CgiError::Timeout => Response::empty(StatusCode::GatewayTimeout),
            CgiError::BadOutput(_) => Response::empty(StatusCode::BadGateway),
        }
    }
}

/// Where a resolved request lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTarget {
    /// URL path of the script, e.g. `/app/run.py`
    pub script_name: String,
    /// Extra path after the script, with its leading `/`, already decoded
    pub path_info: String,
    /// Absolute path of the script file
    pub script_file: PathBuf,
}

/// Splits a resolution into script and extra path info.
///
/// Leading tail segments that name directories belong to the script's
/// directory; the next segment is the script; the rest is `PATH_INFO`.
/// The resolution is already percent-decoded and is not decoded again.
pub async fn locate_script(resolution: &CgiResolution, document_root: &Path) -> ScriptTarget {
    let mut dir = resolution.head.clone();
    let mut rest = resolution.tail.as_str();

    while let Some((segment, remainder)) = rest.split_once('/') {
        let next_dir = format!("{}/{}", dir, segment);
        let is_dir = tokio::fs::metadata(document_root.join(next_dir.trim_start_matches('/')))
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false);
        if is_dir {
            dir = next_dir;
            rest = remainder;
        } else {
            break;
        }
    }

    let (script, path_info) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let script_name = format!("{}/{}", dir, script);
    let script_file = document_root.join(script_name.trim_start_matches('/'));

    ScriptTarget {
        script_name,
        path_info: path_info.to_string(),
        script_file,
    }
}

/// Builds the CGI/1.1 variables passed to a script.
pub fn cgi_environment(
    config: &ServerConfig,
    request: &Request,
    target: &ScriptTarget,
    query: Option<&str>,
    peer: SocketAddr,
) -> HashMap<String, String> {
    let mut env = HashMap::new();

    let mut set = |key: &str, value: String| {
        env.insert(key.to_string(), value);
    };

    set("GATEWAY_INTERFACE", GATEWAY_INTERFACE.to_string());
    set("SERVER_SOFTWARE", SERVER_SOFTWARE.to_string());
    set(
        "SERVER_NAME",
        request
            .header("Host")
            .map(|host| host.split(':').next().unwrap_or(host).to_string())
            .unwrap_or_else(|| config.bind_addr.to_string()),
    );
    set("SERVER_PORT", config.port.to_string());
    set("SERVER_PROTOCOL", request.version.clone());
    set("REQUEST_METHOD", request.method.as_str().to_string());
    set("SCRIPT_NAME", target.script_name.clone());
    set("PATH_INFO", target.path_info.clone());
    set(
        "PATH_TRANSLATED",
        config
            .document_root
            .join(target.path_info.trim_start_matches('/'))
            .display()
            .to_string(),
    );
    set("QUERY_STRING", query.unwrap_or("").to_string());
    set("REMOTE_ADDR", peer.ip().to_string());
    set("DOCUMENT_ROOT", config.document_root.display().to_string());
    set("CONTENT_LENGTH", String::new());

    if let Some(content_type) = request.header("Content-Type") {
        set("CONTENT_TYPE", content_type.to_string());
    }

    for (name, value) in &request.headers {
        let name = name.trim();
        // A client `Proxy` header must not become HTTP_PROXY (httpoxy)
        if name.eq_ignore_ascii_case("Proxy") {
            continue;
        }
        let key = format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"));
        set(&key, value.clone());
    }

    env
}

/// Turns raw script output into a response.
///
/// The output must start with a header block ending in a blank line.
/// `Status` picks the status code, `Location` alone means 302, and every
/// other header is passed through in order.
pub fn parse_cgi_output(output: &[u8]) -> Result<Response, CgiError> {
    let (headers_end, terminator) = find_headers_end(output)
        .ok_or_else(|| CgiError::BadOutput("missing header block".to_string()))?;

    let head = String::from_utf8_lossy(&output[..headers_end]);
    let body = output[headers_end + terminator..].to_vec();

    let mut status = None;
    let mut has_location = false;
    let mut headers = Vec::new();

    for line in head.lines().map(|line| line.trim_end_matches('\r')) {
        if line.is_empty() {
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| CgiError::BadOutput(format!("malformed header '{}'", line)))?;
        let value = value.trim();

        if name.eq_ignore_ascii_case("Status") {
            let code = value
                .split_whitespace()
                .next()
                .and_then(|code| code.parse::<u16>().ok())
                .ok_or_else(|| CgiError::BadOutput(format!("bad status '{}'", value)))?;
            status = Some(
                StatusCode::from_u16(code)
                    .ok_or_else(|| CgiError::BadOutput(format!("unknown status {}", code)))?,
            );
            continue;
        }

        if name.eq_ignore_ascii_case("Location") {
            has_location = true;
        }
        // Framing is recomputed from the body
        if name.eq_ignore_ascii_case("Content-Length") {
            continue;
        }

        headers.push((name.to_string(), value.to_string()));
    }

    let status = status.unwrap_or(if has_location {
        StatusCode::Found
    } else {
        StatusCode::Ok
    });

    let builder = headers
        .into_iter()
        .fold(ResponseBuilder::new(status), |builder, (name, value)| {
            builder.header(name, value)
        });

    Ok(builder.body(body).build())
}

/// Executes CGI scripts on behalf of the dispatcher.
#[derive(Debug, Clone)]
pub struct CgiExecutor {
    config: Arc<ServerConfig>,
}

impl CgiExecutor {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    /// Runs the script named by `resolution` and returns its response.
    ///
    /// Failures are mapped to error responses; HEAD requests get the
    /// headers of the script output without its body.
    pub async fn execute(
        &self,
        request: &Request,
        resolution: &CgiResolution,
        peer: SocketAddr,
    ) -> Response {
        let response = match self.run(request, resolution, peer).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    CgiError::Spawn(io) => error!(error = %io, "Failed to start CGI script"),
                    other => warn!(error = ?other, path = %request.path, "CGI request failed"),
                }
                Response::from(e)
            }
        };

        if request.method == Method::HEAD {
            response.without_body()
        } else {
            response
        }
    }

    async fn run(
        &self,
        request: &Request,
        resolution: &CgiResolution,
        peer: SocketAddr,
    ) -> Result<Response, CgiError> {
        let target = locate_script(resolution, &self.config.document_root).await;

        // The tail may have been rewritten to an index script, so check again
        let metadata = tokio::fs::metadata(&target.script_file)
            .await
            .map_err(|_| CgiError::NotFound(target.script_file.clone()))?;
        if !metadata.is_file() {
            return Err(CgiError::NotFound(target.script_file.clone()));
        }
        if !is_executable(&metadata) {
            return Err(CgiError::NotExecutable(target.script_file.clone()));
        }

        let env = cgi_environment(
            &self.config,
            request,
            &target,
            resolution.query.as_deref(),
            peer,
        );

        debug!(
            script = %target.script_file.display(),
            script_name = %target.script_name,
            path_info = %target.path_info,
            "Running CGI script"
        );

        let child = Command::new(&target.script_file)
            .current_dir(&self.config.document_root)
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(CgiError::Spawn)?;

        let output = timeout(self.config.cgi_timeout, child.wait_with_output())
            .await
            .map_err(|_| CgiError::Timeout)?
            .map_err(CgiError::Spawn)?;

        if !output.status.success() {
            warn!(
                script = %target.script_name,
                status = %output.status,
                "CGI script exited unsuccessfully"
            );
        }

        parse_cgi_output(&output.stdout)
    }
}
