use crate::{
    hooks::HookRegistry,
    sync::{report, sync_hook},
    vcs::VcsRunner,
};
use log::{debug, info, warn};
use std::{
    io::Read,
    sync::Arc,
    thread::{self, JoinHandle},
};
use thiserror::Error;
use tiny_http::{Method, Request, Response, Server, StatusCode};

/// A custom error for describing the error cases of the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server cannot listen on the address. The parameters are the address and the reason.
    #[error("cannot start server on {0}: {1}")]
    BindFailed(String, String),
}

/// An HTTP server with a route for every registered hook.
///
/// This could be called from git remotes (e.g. GitHub, GitLab) with webhooks.
/// Every `POST /hooks/<id>` returns 200 immediately and pulls the repository
/// in the background, the result of the pull is only written to the log.
pub struct HookServer {
    server: Arc<Server>,
    address: String,
}

/// A handle which can stop the [HookServer] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<Server>);

impl ShutdownHandle {
    /// Stop accepting triggers, the server returns after the running pulls finished.
    pub fn shutdown(&self) {
        self.0.unblock();
    }
}

impl HookServer {
    /// Start listening on an address, for example "0.0.0.0:1234".
    pub fn bind(address: &str) -> Result<Self, ServerError> {
        let server = Server::http(address)
            .map_err(|err| ServerError::BindFailed(address.to_string(), err.to_string()))?;

        Ok(HookServer {
            server: Arc::new(server),
            address: address.to_string(),
        })
    }

    /// The port the server actually listens on.
    pub fn port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|addr| addr.port())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.server))
    }

    /// Accept triggers until the server is shut down, then wait for the running pulls.
    pub fn serve(&self, registry: Arc<HookRegistry>, runner: Arc<dyn VcsRunner>) {
        info!("App server listening at {}.", self.address);

        let mut running: Vec<JoinHandle<()>> = vec![];
        for request in self.server.incoming_requests() {
            running.retain(|handle| !handle.is_finished());
            if let Some(handle) = Self::handle_request(request, &registry, &runner) {
                running.push(handle);
            }
        }

        if !running.is_empty() {
            info!("Waiting for {} running pulls to finish.", running.len());
        }
        for handle in running {
            if handle.join().is_err() {
                warn!("A pull terminated unexpectedly.");
            }
        }
        debug!("Server stopped.");
    }

    fn handle_request(
        mut request: Request,
        registry: &HookRegistry,
        runner: &Arc<dyn VcsRunner>,
    ) -> Option<JoinHandle<()>> {
        let url = request.url().to_string();
        let route = url.split('?').next().unwrap_or_default();
        debug!("Received request on {} {}.", request.method(), url);

        let Some(entry) = registry.find_by_route(route) else {
            Self::respond(
                request,
                Response::from_string("Not Found").with_status_code(StatusCode(404)),
            );
            return None;
        };
        if *request.method() != Method::Post {
            Self::respond(
                request,
                Response::from_string("Method Not Allowed").with_status_code(StatusCode(405)),
            );
            return None;
        }

        let mut body = String::new();
        if let Err(err) = request.as_reader().read_to_string(&mut body) {
            warn!("Cannot read the body of the trigger for {}: {err}.", entry.id());
        }
        info!("Received trigger for hook {}.", entry.id());
        debug!("{body}");

        // Acknowledge before pulling, the caller never waits for the result.
        Self::respond(request, Response::from_string("OK"));

        let runner = Arc::clone(runner);
        Some(thread::spawn(move || {
            let result = sync_hook(&entry, runner.as_ref());
            report(&result);
        }))
    }

    fn respond<R: Read>(request: Request, response: Response<R>) {
        if let Err(err) = request.respond(response) {
            warn!("Cannot respond to the request: {err}.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{CapturedOutput, MockVcsRunner};
    use std::{
        error::Error,
        sync::{mpsc, Mutex},
        time::Duration,
    };

    fn status(result: Result<ureq::Response, ureq::Error>) -> u16 {
        match result {
            Ok(response) => response.status(),
            Err(ureq::Error::Status(code, _)) => code,
            Err(err) => panic!("request failed: {err}"),
        }
    }

    /// A repository on main, where every pull sends a message and waits for a response.
    fn blocking_runner(
        pulled: mpsc::Sender<()>,
        finish: mpsc::Receiver<()>,
    ) -> Arc<dyn VcsRunner> {
        let pulled = Mutex::new(pulled);
        let finish = Mutex::new(finish);
        let mut runner = MockVcsRunner::new();
        runner.expect_run().returning(move |_, _, args| {
            match args.join(" ").as_str() {
                "pull" => {
                    pulled.lock().unwrap().send(()).unwrap();
                    finish.lock().unwrap().recv().unwrap();
                    Ok(CapturedOutput::new("Already up to date.", ""))
                }
                "rev-parse --abbrev-ref HEAD" => Ok(CapturedOutput::new("main", "")),
                _ => Ok(CapturedOutput::default()),
            }
        });
        Arc::new(runner)
    }

    fn start_server(
        runner: Arc<dyn VcsRunner>,
    ) -> Result<(String, ShutdownHandle, JoinHandle<()>), Box<dyn Error>> {
        let registry = Arc::new(HookRegistry::build([("deploy", "/repo")], runner.as_ref()));
        let server = HookServer::bind("127.0.0.1:0")?;
        let url = format!("http://127.0.0.1:{}", server.port().unwrap());
        let shutdown = server.shutdown_handle();
        let handle = thread::spawn(move || server.serve(registry, runner));

        Ok((url, shutdown, handle))
    }

    #[test]
    fn it_should_fail_on_an_invalid_address() {
        let result = HookServer::bind("not an address");
        assert!(
            matches!(result, Err(ServerError::BindFailed(_, _))),
            "should be BindFailed"
        );
    }

    #[test]
    fn it_should_respond_before_the_pull_finishes() -> Result<(), Box<dyn Error>> {
        let (pulled_tx, pulled_rx) = mpsc::channel();
        let (finish_tx, finish_rx) = mpsc::channel();
        let (url, shutdown, handle) = start_server(blocking_runner(pulled_tx, finish_rx))?;

        let response = ureq::post(&format!("{url}/hooks/deploy"))
            .set("Content-Type", "application/json")
            .send_string(r#"{"ref": "refs/heads/main"}"#)?;
        assert_eq!(200, response.status());
        assert_eq!("OK", response.into_string()?);

        // The pull is still running after the response
        pulled_rx.recv_timeout(Duration::from_secs(5))?;
        finish_tx.send(())?;

        shutdown.shutdown();
        handle.join().unwrap();

        Ok(())
    }

    #[test]
    fn it_should_not_pull_unknown_hooks() -> Result<(), Box<dyn Error>> {
        let (pulled_tx, pulled_rx) = mpsc::channel();
        let (_finish_tx, finish_rx) = mpsc::channel();
        let (url, shutdown, handle) = start_server(blocking_runner(pulled_tx, finish_rx))?;

        assert_eq!(404, status(ureq::post(&format!("{url}/hooks/unknown")).call()));
        assert_eq!(404, status(ureq::post(&format!("{url}/deploy")).call()));
        assert_eq!(405, status(ureq::get(&format!("{url}/hooks/deploy")).call()));
        assert!(pulled_rx.recv_timeout(Duration::from_millis(200)).is_err());

        shutdown.shutdown();
        handle.join().unwrap();

        Ok(())
    }

    #[test]
    fn it_should_ignore_the_query_string() -> Result<(), Box<dyn Error>> {
        let (pulled_tx, pulled_rx) = mpsc::channel();
        let (finish_tx, finish_rx) = mpsc::channel();
        let (url, shutdown, handle) = start_server(blocking_runner(pulled_tx, finish_rx))?;

        assert_eq!(
            200,
            status(ureq::post(&format!("{url}/hooks/deploy?source=github")).call())
        );
        pulled_rx.recv_timeout(Duration::from_secs(5))?;
        finish_tx.send(())?;

        shutdown.shutdown();
        handle.join().unwrap();

        Ok(())
    }
}
