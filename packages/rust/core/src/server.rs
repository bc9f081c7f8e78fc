//! Model server lifecycle.
//!
//! [`ModelServer`] is a scoped handle: a server that was already running is
//! borrowed and left alone, a server this process spawned is killed and
//! reaped when the handle is dropped.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use pdfsorter_extract::OllamaClient;
use pdfsorter_shared::{PdfSorterError, Result, ServerConfig};
use tracing::{debug, info, instrument, warn};

/// Delay between readiness probes after spawning.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Handle to the model server used for one run.
#[derive(Debug)]
pub struct ModelServer {
    child: Option<Child>,
    command: String,
}

impl ModelServer {
    /// Make sure a model server answers at the client's host.
    ///
    /// Reuses a server that already answers `GET /api/tags`. Otherwise spawns
    /// `config.command` and waits up to `config.startup_timeout_secs` for it
    /// to answer. The spawned process is killed if it never becomes ready.
    #[instrument(skip_all, fields(host = %client.host()))]
    pub async fn start(config: &ServerConfig, client: &OllamaClient) -> Result<Self> {
        if client.is_running().await {
            info!("model server already running, reusing it");
            return Ok(Self::external());
        }

        let mut server = Self::spawn(config)?;
        let deadline = Instant::now() + Duration::from_secs(config.startup_timeout_secs);

        loop {
            if client.is_running().await {
                info!(command = %server.command, "model server ready");
                return Ok(server);
            }

            if let Some(status) = server.exited() {
                return Err(PdfSorterError::ModelServer(format!(
                    "`{}` exited before the server became ready ({status})",
                    server.command
                )));
            }

            if Instant::now() >= deadline {
                return Err(PdfSorterError::ModelServer(format!(
                    "`{}` did not answer at {} within {}s",
                    server.command,
                    client.host(),
                    config.startup_timeout_secs
                )));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Spawn the configured server command without waiting for readiness.
    pub fn spawn(config: &ServerConfig) -> Result<Self> {
        let command = display_command(config);
        info!(%command, "spawning model server");

        let child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                PdfSorterError::ModelServer(format!(
                    "failed to spawn `{command}`: {e}. Is `{}` installed?",
                    config.command
                ))
            })?;

        debug!(pid = child.id(), "model server process started");
        Ok(Self {
            child: Some(child),
            command,
        })
    }

    /// Handle for a server this process does not own.
    fn external() -> Self {
        Self {
            child: None,
            command: String::new(),
        }
    }

    /// Whether this handle owns a spawned process.
    pub fn is_managed(&self) -> bool {
        self.child.is_some()
    }

    /// Process id of the owned server, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Stop the server now. Returns the exit status of an owned process.
    pub fn shutdown(mut self) -> Option<ExitStatus> {
        self.stop()
    }

    fn exited(&mut self) -> Option<ExitStatus> {
        self.child.as_mut().and_then(|c| c.try_wait().ok().flatten())
    }

    fn stop(&mut self) -> Option<ExitStatus> {
        let mut child = self.child.take()?;

        if let Err(e) = child.kill() {
            // Already exited; wait() below still reaps it.
            debug!(error = %e, "kill failed");
        }

        match child.wait() {
            Ok(status) => {
                info!(command = %self.command, ?status, "model server stopped");
                Some(status)
            }
            Err(e) => {
                warn!(command = %self.command, "model server wait error: {e}");
                None
            }
        }
    }
}

impl Drop for ModelServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn display_command(config: &ServerConfig) -> String {
    std::iter::once(config.command.as_str())
        .chain(config.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn unreachable_client() -> OllamaClient {
        OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap()
    }

    fn server_config(command: &str, args: &[&str], timeout: u64) -> ServerConfig {
        ServerConfig {
            manage: true,
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            startup_timeout_secs: timeout,
        }
    }

    /// Whether a process with `pid` still exists.
    #[cfg(unix)]
    fn process_alive(pid: u32) -> bool {
        Command::new("sh")
            .args(["-c", &format!("kill -0 {pid} 2>/dev/null")])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn display_command_joins_args() {
        let config = server_config("ollama", &["serve"], 30);
        assert_eq!(display_command(&config), "ollama serve");
    }

    #[tokio::test]
    async fn reuses_running_server() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "models": [] })))
            .mount(&mock)
            .await;

        let client = OllamaClient::new(&mock.uri(), Duration::from_secs(1)).unwrap();
        // A command that cannot exist: it must not be spawned.
        let config = server_config("pdfsorter-no-such-binary", &[], 1);

        let server = ModelServer::start(&config, &client).await.unwrap();
        assert!(!server.is_managed());
        assert!(server.shutdown().is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_model_server_error() {
        let config = server_config("pdfsorter-no-such-binary", &[], 1);
        let err = ModelServer::start(&config, &unreachable_client())
            .await
            .unwrap_err();

        assert!(matches!(err, PdfSorterError::ModelServer(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn early_exit_is_reported() {
        let config = server_config("true", &[], 10);
        let err = ModelServer::start(&config, &unreachable_client())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exited before"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn startup_timeout_is_reported() {
        let config = server_config("sleep", &["30"], 1);
        let started = Instant::now();
        let err = ModelServer::start(&config, &unreachable_client())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("did not answer"));
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[cfg(unix)]
    #[test]
    fn shutdown_kills_spawned_process() {
        let config = server_config("sleep", &["30"], 1);
        let server = ModelServer::spawn(&config).unwrap();
        assert!(server.is_managed());

        let status = server.shutdown().expect("owned process has a status");
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[test]
    fn drop_kills_spawned_process() {
        let config = server_config("sleep", &["30"], 1);
        let server = ModelServer::spawn(&config).unwrap();
        let pid = server.pid().expect("owned process has a pid");
        assert!(process_alive(pid));

        drop(server);
        assert!(!process_alive(pid));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn startup_timeout_kills_spawned_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("server.pid");
        let script = format!("echo $$ > {}; exec sleep 30", pid_file.display());
        let config = server_config("sh", &["-c", &script], 2);

        ModelServer::start(&config, &unreachable_client())
            .await
            .unwrap_err();

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(!process_alive(pid));
    }
}
