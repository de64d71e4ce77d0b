use super::protocol::{self, BANNER_PREFIX, TERSE_MODE};
use super::{SessionError, Verdict, WordChecker};
use crate::Config;
use log::{debug, trace, warn};
use std::ffi::OsString;
use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    AwaitingReply,
    Terminated,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::AwaitingReply => "awaiting a reply",
            SessionState::Terminated => "terminated",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How to launch and talk to the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub command: String,
    /// Base arguments; must put the engine in pipe mode (`-a`).
    pub args: Vec<String>,
    /// Accept run-together words (`-C`).
    pub compound: bool,
    /// Words of at most this many characters are always accepted (`-W`).
    pub word_len: Option<usize>,
    pub personal_dictionary: Option<PathBuf>,
    /// Dictionary/language selection (`-d`).
    pub language: Option<String>,
    /// Line sent before closing the engine's input. `ispell -a` exits on
    /// end of input, so this is usually unset.
    pub exit_command: Option<String>,
    pub read_timeout: Option<Duration>,
    pub shutdown_timeout: Duration,
    /// Queries written before their replies are drained.
    pub batch_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            command: "ispell".to_string(),
            args: vec!["-a".to_string()],
            compound: true,
            word_len: Some(3),
            personal_dictionary: None,
            language: None,
            exit_command: None,
            read_timeout: None,
            shutdown_timeout: Duration::from_millis(2000),
            batch_size: 64,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            command: config.engine_command.clone(),
            args: config.engine_args.clone(),
            compound: config.compound,
            word_len: config.word_len,
            personal_dictionary: config.personal_dictionary.clone(),
            language: config.language.clone(),
            exit_command: config.exit_command.clone(),
            read_timeout: config.read_timeout_ms.map(Duration::from_millis),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn with_personal_dictionary(mut self, path: impl Into<PathBuf>) -> Self {
        self.personal_dictionary = Some(path.into());
        self
    }

    /// Arguments passed to the engine, directives included.
    pub fn command_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        if self.compound {
            args.push("-C".into());
        }
        if let Some(len) = self.word_len {
            args.push(format!("-W{}", len).into());
        }
        if let Some(path) = &self.personal_dictionary {
            args.push("-p".into());
            args.push(path.clone().into_os_string());
        }
        if let Some(language) = &self.language {
            args.push("-d".into());
            args.push(language.into());
        }
        args
    }
}

type Line = io::Result<String>;

/// One long-lived conversation with the engine.
///
/// Queries and replies are strictly interleaved: every query is drained to
/// its blank terminator line before the session is `Ready` again. Any I/O or
/// protocol failure moves the session to `Failed`, after which only
/// [`Session::shutdown`] is allowed.
pub struct Session {
    options: EngineOptions,
    state: SessionState,
    input: Option<Box<dyn Write + Send>>,
    lines: Option<Receiver<Line>>,
    child: Option<Child>,
    banner: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("command", &self.options.command)
            .field("state", &self.state)
            .field("pid", &self.child.as_ref().map(Child::id))
            .field("banner", &self.banner)
            .finish()
    }
}

impl Session {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            state: SessionState::Uninitialized,
            input: None,
            lines: None,
            child: None,
            banner: None,
        }
    }

    /// Start a session, run `f` against it and tear it down again, whatever
    /// `f` returned.
    pub fn scoped<T, E, F>(options: EngineOptions, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Session) -> Result<T, E>,
        E: From<SessionError>,
    {
        let mut session = Session::new(options);
        session.start()?;
        let result = f(&mut session);
        let closed = session.shutdown();

        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Error while shutting down spelling engine: {}", close_err);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Launch the engine process and perform the startup exchange.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Uninitialized, "start")?;

        let args = self.options.command_args();
        debug!(
            "Starting spelling engine: {} {}",
            self.options.command,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut child = Command::new(&self.options.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                self.state = SessionState::Failed;
                if e.kind() == io::ErrorKind::NotFound {
                    SessionError::Start(format!(
                        "spelling engine not found: '{}' (is it installed and on PATH?)",
                        self.options.command
                    ))
                } else {
                    SessionError::Start(format!(
                        "cannot execute '{}': {}",
                        self.options.command, e
                    ))
                }
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        self.child = Some(child);

        match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => {
                self.attach(Box::new(BufWriter::new(stdin)), BufReader::new(stdout))
            }
            _ => {
                self.state = SessionState::Failed;
                Err(SessionError::Start(
                    "engine pipes were not available".to_string(),
                ))
            }
        }
    }

    /// Perform the startup exchange over already-open streams instead of a
    /// spawned process.
    pub fn start_with_streams<W, R>(&mut self, input: W, output: R) -> Result<(), SessionError>
    where
        W: Write + Send + 'static,
        R: BufRead + Send + 'static,
    {
        self.expect_state(SessionState::Uninitialized, "start")?;
        self.attach(Box::new(input), output)
    }

    fn attach<R>(&mut self, input: Box<dyn Write + Send>, output: R) -> Result<(), SessionError>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        // Exits once the engine's output closes or the session drops the
        // receiving end.
        let spawned = thread::Builder::new()
            .name("spell-engine-reader".to_string())
            .spawn(move || {
                let mut output = output;
                loop {
                    let mut line = String::new();
                    match output.read_line(&mut line) {
                        Ok(0) => break,
                        Ok(_) => {
                            if tx.send(Ok(line)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            break;
                        }
                    }
                }
            });

        if let Err(e) = spawned {
            self.state = SessionState::Failed;
            return Err(SessionError::Start(format!(
                "cannot spawn engine reader thread: {}",
                e
            )));
        }

        self.input = Some(input);
        self.lines = Some(rx);

        let handshake = self.handshake();
        if handshake.is_err() {
            self.state = SessionState::Failed;
        }
        handshake
    }

    fn handshake(&mut self) -> Result<(), SessionError> {
        let banner = self.read_line().map_err(|e| match e {
            SessionError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                SessionError::Start("spelling engine exited before printing its banner".into())
            }
            SessionError::Timeout(after) => SessionError::Start(format!(
                "spelling engine printed no banner within {:?}",
                after
            )),
            other => SessionError::Start(other.to_string()),
        })?;

        if !banner.starts_with(BANNER_PREFIX) {
            return Err(SessionError::Start(format!(
                "expected a banner starting with {:?} from the engine, got {:?}",
                BANNER_PREFIX, banner
            )));
        }
        debug!("Spelling engine banner: {}", banner);
        self.banner = Some(banner);

        self.write_line(TERSE_MODE)
            .and_then(|()| self.flush())
            .map_err(|e| SessionError::Start(format!("cannot enable terse mode: {}", e)))?;

        self.state = SessionState::Ready;
        Ok(())
    }

    /// Check a single word.
    pub fn check(&mut self, word: &str) -> Result<Verdict, SessionError> {
        let mut verdicts = self.check_batch(&[word])?;
        verdicts
            .pop()
            .ok_or_else(|| SessionError::Protocol(format!("no verdict for {:?}", word)))
    }

    /// Check words in order, returning one verdict per word.
    ///
    /// Queries go out in chunks of `batch_size`; each chunk is fully drained
    /// before the next is written so neither pipe can fill up.
    pub fn check_batch<S: AsRef<str>>(&mut self, words: &[S]) -> Result<Vec<Verdict>, SessionError> {
        self.expect_state(SessionState::Ready, "check words")?;

        if let Some(bad) = words
            .iter()
            .map(|w| -> &str { w.as_ref() })
            .find(|w| w.is_empty() || w.chars().any(char::is_whitespace))
        {
            return Err(SessionError::Protocol(format!(
                "cannot query {:?}: a query must be a single word",
                bad
            )));
        }

        let mut verdicts = Vec::with_capacity(words.len());
        for chunk in words.chunks(self.options.batch_size.max(1)) {
            if let Err(e) = self.exchange(chunk, &mut verdicts) {
                self.state = SessionState::Failed;
                return Err(e);
            }
        }
        Ok(verdicts)
    }

    fn exchange<S: AsRef<str>>(
        &mut self,
        chunk: &[S],
        verdicts: &mut Vec<Verdict>,
    ) -> Result<(), SessionError> {
        self.state = SessionState::AwaitingReply;

        for word in chunk {
            trace!("engine <- ^{}", word.as_ref());
            self.write_raw(&protocol::encode_query(word.as_ref()))?;
        }
        self.flush()?;

        for word in chunk {
            let lines = self.read_reply()?;
            trace!("engine -> {:?}", lines);
            verdicts.push(protocol::decode_reply(word.as_ref(), &lines)?);
        }

        self.state = SessionState::Ready;
        Ok(())
    }

    /// Collect result lines up to the blank terminator.
    fn read_reply(&mut self) -> Result<Vec<String>, SessionError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            if line.is_empty() {
                return Ok(lines);
            }
            lines.push(line);
        }
    }

    fn read_line(&mut self) -> Result<String, SessionError> {
        let lines = self
            .lines
            .as_ref()
            .ok_or(SessionError::InvalidState(self.state, "read from the engine"))?;

        let received = match self.options.read_timeout {
            Some(limit) => lines.recv_timeout(limit).map_err(|e| match e {
                RecvTimeoutError::Timeout => SessionError::Timeout(limit),
                RecvTimeoutError::Disconnected => closed_output(),
            })?,
            None => lines.recv().map_err(|_| closed_output())?,
        };

        let mut line = received?;
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.write_raw(&format!("{}\n", line))
    }

    fn write_raw(&mut self, data: &str) -> Result<(), SessionError> {
        let input = self
            .input
            .as_mut()
            .ok_or(SessionError::InvalidState(self.state, "write to the engine"))?;
        input.write_all(data.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        if let Some(input) = self.input.as_mut() {
            input.flush()?;
        }
        Ok(())
    }

    fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState(self.state, action))
        }
    }

    /// End the session: send the exit command (if any) and close the
    /// engine's input, wait up to `shutdown_timeout` for it to exit, then
    /// kill it. A failed session is killed straight away.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Terminated => return Ok(()),
            SessionState::Uninitialized => {
                self.state = SessionState::Terminated;
                return Ok(());
            }
            _ => {}
        }

        let graceful = self.state == SessionState::Ready;
        if graceful {
            if let Some(command) = self.options.exit_command.clone() {
                if let Err(e) = self.write_line(&command).and_then(|()| self.flush()) {
                    debug!("Could not send exit command to spelling engine: {}", e);
                }
            }
        }

        // Closing stdin is what makes `ispell -a` exit.
        drop(self.input.take());
        let result = match self.child.take() {
            Some(mut child) if graceful => wait_or_kill(&mut child, self.options.shutdown_timeout),
            Some(mut child) => kill(&mut child),
            None => Ok(()),
        };
        self.lines = None;
        self.state = SessionState::Terminated;

        result.map_err(SessionError::from)
    }
}

fn closed_output() -> SessionError {
    SessionError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "spelling engine closed its output",
    ))
}

fn wait_or_kill(child: &mut Child, timeout: Duration) -> io::Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait()? {
            Some(status) => {
                if status.success() {
                    debug!("Spelling engine exited gracefully");
                } else {
                    warn!("Spelling engine exited with {}", status);
                }
                return Ok(());
            }
            None if Instant::now() >= deadline => {
                warn!(
                    "Spelling engine did not exit within {:?}, killing it",
                    timeout
                );
                return kill(child);
            }
            None => thread::sleep(EXIT_POLL_INTERVAL),
        }
    }
}

fn kill(child: &mut Child) -> io::Result<()> {
    if let Err(e) = child.kill() {
        // Already gone.
        debug!("Kill of spelling engine {} failed: {}", child.id(), e);
    }
    let status = child.wait()?;
    debug!("Spelling engine {} stopped: {}", child.id(), status);
    Ok(())
}

impl WordChecker for Session {
    fn check_words(&mut self, words: &[String]) -> Result<Vec<Verdict>, SessionError> {
        self.check_batch(words)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Session dropped without shutdown, killing spelling engine");
            drop(self.input.take());
            if let Err(e) = kill(&mut child) {
                warn!("Failed to reap spelling engine: {}", e);
            }
        }
    }
}
