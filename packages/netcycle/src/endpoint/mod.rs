mod validate;

use core::net::{IpAddr, SocketAddr};

use embassy_time::{with_timeout, Duration, Timer};
use embedded_io_async::{Error as _, Read, Write};
use heapless::Vec;
use log::{debug, error, info};

pub use validate::{ResponseValidator, SuffixMatch};

use crate::error::{DialError, EndpointError, NetworkStage};

pub const RESPONSE_CAPACITY: usize = 1024;
const READ_CHUNK: usize = 256;

/// Name resolution and stream socket creation.
#[allow(async_fn_in_trait)]
pub trait Dialer {
    type Socket<'s>: StreamSocket
    where
        Self: 's;

    async fn resolve(&mut self, host: &str) -> Result<IpAddr, DialError>;

    /// Connects with the platform's default connect timeout.
    async fn connect(&mut self, remote: SocketAddr) -> Result<Self::Socket<'_>, DialError>;
}

#[allow(async_fn_in_trait)]
pub trait StreamSocket: Read + Write {
    async fn close(&mut self);
}

/// Fixed request the device sends on every wake. `path` carries the access
/// token; never log it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestDescriptor<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
    pub request: &'a [u8],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    pub receive_timeout: Duration,
    /// Pause between sending and the first read. Some drivers report a failed
    /// read when polled straight after the send.
    pub warm_up: Duration,
}

impl EndpointConfig {
    pub const fn new() -> Self {
        Self {
            receive_timeout: Duration::from_secs(5),
            warm_up: Duration::from_millis(500),
        }
    }

    pub const fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub const fn with_warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = warm_up;
        self
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EndpointClient<'a, D: Dialer, V: ResponseValidator, const N: usize = RESPONSE_CAPACITY>
{
    dialer: D,
    request: RequestDescriptor<'a>,
    validator: V,
    config: EndpointConfig,
}

impl<'a, D: Dialer, V: ResponseValidator, const N: usize> EndpointClient<'a, D, V, N> {
    pub fn new(dialer: D, request: RequestDescriptor<'a>, validator: V) -> Self {
        Self {
            dialer,
            request,
            validator,
            config: EndpointConfig::new(),
        }
    }

    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    /// One request/response exchange. The socket is closed on every path
    /// once it is connected.
    pub async fn request_and_validate(&mut self) -> Result<(), EndpointError> {
        let request = self.request;
        let address = self.dialer.resolve(request.host).await.map_err(|err| {
            error!("dns lookup for {} failed: {}", request.host, err);
            EndpointError::NetworkUnavailable(NetworkStage::Resolve, err)
        })?;

        let remote = SocketAddr::new(address, request.port);
        let mut socket = self.dialer.connect(remote).await.map_err(|err| {
            error!("socket connect to {} failed: {}", remote, err);
            EndpointError::NetworkUnavailable(NetworkStage::Connect, err)
        })?;
        info!("connected to {}:{} ({})", request.host, request.port, remote);

        let outcome =
            exchange::<_, _, N>(&mut socket, request.request, &self.validator, &self.config).await;
        socket.close().await;
        if let Err(err) = outcome {
            error!("{}: {}", request.host, err);
        }
        outcome
    }
}

async fn exchange<S, V, const N: usize>(
    socket: &mut S,
    request: &[u8],
    validator: &V,
    config: &EndpointConfig,
) -> Result<(), EndpointError>
where
    S: StreamSocket,
    V: ResponseValidator,
{
    match socket.write(request).await {
        Ok(written) if written == request.len() => info!("socket send success"),
        Ok(written) => {
            return Err(EndpointError::SendFailed {
                written: Some(written),
            })
        }
        Err(err) => {
            debug!("socket write err={:?}", err.kind());
            return Err(EndpointError::SendFailed { written: None });
        }
    }

    if config.warm_up > Duration::from_ticks(0) {
        Timer::after(config.warm_up).await;
    }

    let mut response = Vec::<u8, N>::new();
    receive(socket, &mut response, config.receive_timeout).await?;

    match core::str::from_utf8(&response) {
        Ok(text) => debug!("server response:\n{}", text),
        Err(_) => debug!("server response: {} bytes, not utf8", response.len()),
    }

    validator.validate(&response).map_err(EndpointError::from)
}

/// Appends reads until the peer closes, a read fails or a read times out.
async fn receive<S: Read, const N: usize>(
    socket: &mut S,
    response: &mut Vec<u8, N>,
    timeout: Duration,
) -> Result<(), EndpointError> {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        // A full buffer still polls one byte so an over-long reply is caught.
        let window = chunk.len().min(N - response.len()).max(1);
        let read = with_timeout(timeout, socket.read(&mut chunk[..window])).await;
        let received = match read {
            Ok(Ok(0)) => {
                debug!("peer closed after {} bytes", response.len());
                return Ok(());
            }
            Ok(Ok(received)) => received,
            Ok(Err(err)) => {
                debug!("read err={:?} after {} bytes", err.kind(), response.len());
                return Ok(());
            }
            Err(_) => {
                debug!("read timed out after {} bytes", response.len());
                return Ok(());
            }
        };

        debug!("read(&recv_buf[{}], {}) = {}", response.len(), window, received);
        if response.extend_from_slice(&chunk[..received]).is_err() {
            return Err(EndpointError::ResponseOverflow { capacity: N });
        }
    }
}
