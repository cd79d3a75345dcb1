//! The connected-device client
//!
//! [`Client`] owns one authenticated control connection: a TCP session
//! through the multiplexing dispatcher, a background reader task and,
//! once logged in, a keepalive task paced by the interval the device
//! announced at login.

use std::time::Duration;

use chrono::NaiveDateTime;
use dvrip_core::{auth, MessageType, Session, SessionState};
use dvrip_transport::{FrameReader, FrameWriter, TcpTransport};
use dvrip_types::{
    DvrTime, FileEntry, FileKind, FileQuery, GetTimeReply, GetTimeRequest,
    KeepAliveRequest, LoginReply, LoginRequest, LogoutRequest, MonitorAction,
    MonitorReply, MonitorRequest, OperationReply, OperationRequest,
    PlaybackAction, PlaybackReply, PlaybackRequest, Quality, SessionId,
    SystemInfo, SystemInfoReply, SystemInfoRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::search::FileSearch;
use crate::stream::{DvrStream, StopCommand};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Keepalive intervals outside this range are clamped; some firmwares
/// report nonsense.
const MIN_ALIVE_INTERVAL: u32 = 5;
const MAX_ALIVE_INTERVAL: u32 = 300;

/// Configures and opens a [`Client`].
///
/// # Examples
///
/// ```no_run
/// # async fn demo() -> dvrip::Result<()> {
/// use std::time::Duration;
///
/// let client = dvrip::ClientBuilder::new("192.168.1.10:34567")
///     .connect_timeout(Duration::from_secs(3))
///     .call_timeout(Duration::from_secs(10))
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    addr: String,
    connect_timeout: Duration,
    call_timeout: Duration,
}

impl ClientBuilder {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Deadline for establishing the TCP connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Deadline for each individual command reply.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Open the control connection. The session is connected but not
    /// yet authenticated; call [`Client::login`] next.
    pub async fn connect(self) -> Result<Client> {
        let session = Session::new();
        session.begin_connect()?;

        let (reader, writer) =
            match TcpTransport::connect(&self.addr, self.connect_timeout).await {
                Ok(pair) => pair,
                Err(e) => {
                    session.fail();
                    return Err(e.into());
                }
            };
        debug!("connected to {}", self.addr);

        Ok(Client::attach(session, reader, writer, self.call_timeout))
    }
}

/// An open DVRIP control connection.
pub struct Client {
    dispatcher: Dispatcher,
    reader_task: JoinHandle<()>,
    keepalive_task: Option<JoinHandle<()>>,
    username: Option<String>,
    call_timeout: Duration,
}

impl Client {
    /// Connect with default timeouts. See [`ClientBuilder`] to tune
    /// them.
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(addr).connect().await
    }

    pub(crate) fn attach(
        session: Session,
        reader: FrameReader,
        writer: FrameWriter,
        call_timeout: Duration,
    ) -> Self {
        let dispatcher = Dispatcher::new(session, writer);
        let reader_task = dispatcher.spawn_reader(reader);
        Self {
            dispatcher,
            reader_task,
            keepalive_task: None,
            username: None,
            call_timeout,
        }
    }

    /// Session state as tracked locally.
    pub fn state(&self) -> SessionState {
        self.dispatcher.session().state()
    }

    /// Device-assigned session identifier; zero until logged in.
    pub fn session_id(&self) -> SessionId {
        SessionId(self.dispatcher.session().id())
    }

    /// Authenticate.
    ///
    /// The password is hashed with the device's XM-MD5 scheme before
    /// it goes on the wire. Rejected credentials fail the whole
    /// session; reconnect before trying again.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.dispatcher.session().begin_login()?;

        let request = LoginRequest::new(username, auth::xm_md5(password));
        let reply: LoginReply = match self
            .call(MessageType::Login, &request)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                self.dispatcher.fail();
                return Err(e);
            }
        };

        if !reply.ret.is_success() {
            warn!("login rejected for {username:?}: {}", reply.ret);
            self.dispatcher.fail();
            return Err(Error::Auth(reply.ret));
        }

        self.dispatcher.session().ready(reply.session.0)?;
        self.username = Some(username.to_owned());

        let interval = reply
            .alive_interval
            .clamp(MIN_ALIVE_INTERVAL, MAX_ALIVE_INTERVAL);
        self.keepalive_task = Some(spawn_keepalive(
            self.dispatcher.clone(),
            Duration::from_secs(interval as u64),
        ));

        info!(
            "logged in as {username:?} ({}, keepalive every {interval}s)",
            reply.session.0
        );
        Ok(())
    }

    /// Device clock.
    pub async fn get_time(&self) -> Result<DvrTime> {
        self.ensure_ready()?;
        let request = GetTimeRequest::new(self.session_id());
        let reply: GetTimeReply = self.call(MessageType::GetTime, &request).await?;
        check_device(reply.ret)?;
        Ok(reply.time)
    }

    /// Set the device clock.
    pub async fn set_time(&self, time: NaiveDateTime) -> Result<()> {
        self.ensure_ready()?;
        let request = OperationRequest::set_time(self.session_id(), time);
        let reply: OperationReply =
            self.call(MessageType::Operation, &request).await?;
        check_device(reply.ret)
    }

    /// Reboot the device. The session will drop shortly after the
    /// device acknowledges.
    pub async fn reboot(&self) -> Result<()> {
        self.ensure_ready()?;
        let request = OperationRequest::reboot(self.session_id());
        let reply: OperationReply =
            self.call(MessageType::Operation, &request).await?;
        check_device(reply.ret)
    }

    /// Device identity and capability block.
    pub async fn system_info(&self) -> Result<SystemInfo> {
        self.ensure_ready()?;
        let request = SystemInfoRequest::new(self.session_id());
        let reply: SystemInfoReply =
            self.call(MessageType::SystemInfo, &request).await?;
        check_device(reply.ret)?;
        reply.system.ok_or(Error::MissingSection("SystemInfo"))
    }

    /// Time since the device booted, at minute granularity.
    pub async fn uptime(&self) -> Result<chrono::Duration> {
        Ok(self.system_info().await?.uptime())
    }

    /// Search for recordings in a time window.
    ///
    /// Returns a lazy pager; no request goes out until the first
    /// [`FileSearch::next`] call.
    pub fn find_files(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        channel: u32,
        kind: FileKind,
    ) -> Result<FileSearch> {
        self.ensure_ready()?;
        let query =
            FileQuery::new(DvrTime::some(start), DvrTime::some(end), channel, kind);
        Ok(FileSearch::new(
            self.dispatcher.clone(),
            self.session_id(),
            query,
            self.call_timeout,
        ))
    }

    /// Download a recording found through [`Client::find_files`].
    ///
    /// The stream is bounded by the recording's advertised size and
    /// ends exactly there. One download at a time per session.
    pub async fn open_download(&self, file: &FileEntry) -> Result<DvrStream> {
        self.ensure_ready()?;
        let session = self.session_id();
        let rx = self.dispatcher.open_stream(MessageType::PlaybackData)?;

        let result = async {
            let claim = PlaybackRequest::for_file(session, PlaybackAction::Claim, file);
            let reply: PlaybackReply =
                self.call(MessageType::PlaybackClaim, &claim).await?;
            check_device(reply.ret)?;

            let start =
                PlaybackRequest::for_file(session, PlaybackAction::DownloadStart, file);
            let reply: PlaybackReply =
                self.call(MessageType::Playback, &start).await?;
            check_device(reply.ret)
        }
        .await;

        if let Err(e) = result {
            self.dispatcher.close_stream(MessageType::PlaybackData);
            return Err(e);
        }

        trace!("download started: {} ({} bytes)", file.name, file.size_bytes());
        Ok(DvrStream::bounded(
            rx,
            file.size_bytes(),
            self.dispatcher.clone(),
            MessageType::PlaybackData,
            StopCommand::Download {
                session,
                file: file.clone(),
            },
            self.call_timeout,
        ))
    }

    /// Open a live monitor stream for one channel.
    ///
    /// The stream runs until cancelled or the session drops. One
    /// monitor at a time per session.
    pub async fn open_monitor(
        &self,
        channel: u32,
        quality: Quality,
    ) -> Result<DvrStream> {
        self.ensure_ready()?;
        let session = self.session_id();
        let rx = self.dispatcher.open_stream(MessageType::MonitorData)?;

        let result = async {
            let claim =
                MonitorRequest::new(session, MonitorAction::Claim, channel, quality);
            let reply: MonitorReply =
                self.call(MessageType::MonitorClaim, &claim).await?;
            check_device(reply.ret)?;

            let start =
                MonitorRequest::new(session, MonitorAction::Start, channel, quality);
            let reply: MonitorReply = self.call(MessageType::Monitor, &start).await?;
            check_device(reply.ret)
        }
        .await;

        if let Err(e) = result {
            self.dispatcher.close_stream(MessageType::MonitorData);
            return Err(e);
        }

        trace!("monitor started on channel {channel}");
        Ok(DvrStream::unbounded(
            rx,
            self.dispatcher.clone(),
            MessageType::MonitorData,
            StopCommand::Monitor {
                session,
                channel,
                quality,
            },
            self.call_timeout,
        ))
    }

    /// Log out and tear the connection down.
    ///
    /// The logout command is best effort; local cleanup happens
    /// regardless of whether the device acknowledges it.
    pub async fn close(mut self) -> Result<()> {
        if self.dispatcher.session().is_ready() {
            let request = LogoutRequest {
                username: self.username.clone().unwrap_or_default(),
                session: self.session_id(),
            };
            if let Err(e) = self
                .dispatcher
                .call(MessageType::Logout, &request, self.call_timeout)
                .await
            {
                debug!("logout not acknowledged: {e}");
            }
        }

        self.dispatcher.close();
        self.dispatcher.shutdown_writer().await;
        self.stop_tasks();
        Ok(())
    }

    async fn call<Req, Rep>(&self, message_type: MessageType, body: &Req) -> Result<Rep>
    where
        Req: Serialize,
        Rep: DeserializeOwned,
    {
        let reply = self
            .dispatcher
            .call(message_type, body, self.call_timeout)
            .await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.dispatcher.session().is_ready() {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }

    fn stop_tasks(&mut self) {
        self.reader_task.abort();
        if let Some(task) = self.keepalive_task.take() {
            task.abort();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Dropping without close() skips the logout command but must
        // not leak tasks or leave waiters hanging.
        self.stop_tasks();
        self.dispatcher.close();
    }
}

fn check_device(ret: dvrip_core::Status) -> Result<()> {
    if ret.is_success() {
        Ok(())
    } else {
        Err(Error::Device(ret))
    }
}

/// Periodic keepalive. Also watches for a silent device: a session
/// with no inbound traffic for three intervals is considered dead.
fn spawn_keepalive(dispatcher: Dispatcher, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let grace = interval * 3;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // the first tick fires immediately

        loop {
            ticker.tick().await;
            if dispatcher.session().state().is_terminal() {
                break;
            }
            if dispatcher.session().last_activity().elapsed() > grace {
                warn!("no traffic for {}s; failing session", grace.as_secs());
                dispatcher.fail();
                break;
            }

            let request = KeepAliveRequest::new(SessionId(dispatcher.session().id()));
            match dispatcher
                .call(MessageType::KeepAlive, &request, interval)
                .await
            {
                Ok(_) => trace!("keepalive acknowledged"),
                Err(Error::SessionClosed) => break,
                // Transient; the grace window decides when to give up.
                Err(e) => debug!("keepalive: {e}"),
            }
        }
    })
}
