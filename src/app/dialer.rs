use core::net::{IpAddr, SocketAddr};

use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, IpAddress, IpEndpoint, Stack};
use embassy_time::with_timeout;
use embedded_io_async::{ErrorType, Read, Write};
use esp_println::println;
use netcycle::{DialError, Dialer, StreamSocket};

use super::config::{CLOSE_FLUSH_TIMEOUT, CONNECT_TIMEOUT, SOCKET_RX_BUF, SOCKET_TX_BUF};

/// Resolves through the stack's DNS client and opens TCP sockets over
/// caller-owned buffers. One socket at a time.
pub(crate) struct EmbassyDialer {
    stack: Stack<'static>,
    rx_buffer: &'static mut [u8; SOCKET_RX_BUF],
    tx_buffer: &'static mut [u8; SOCKET_TX_BUF],
}

impl EmbassyDialer {
    pub(crate) fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8; SOCKET_RX_BUF],
        tx_buffer: &'static mut [u8; SOCKET_TX_BUF],
    ) -> Self {
        Self {
            stack,
            rx_buffer,
            tx_buffer,
        }
    }
}

impl Dialer for EmbassyDialer {
    type Socket<'s> = NetSocket<'s>;

    async fn resolve(&mut self, host: &str) -> Result<IpAddr, DialError> {
        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|err| {
                println!("dialer: dns query {} err={:?}", host, err);
                DialError::DnsFailed
            })?;
        addresses
            .first()
            .map(|address| match *address {
                IpAddress::Ipv4(v4) => IpAddr::V4(v4),
                IpAddress::Ipv6(v6) => IpAddr::V6(v6),
            })
            .ok_or(DialError::NoAddress)
    }

    async fn connect(&mut self, remote: SocketAddr) -> Result<NetSocket<'_>, DialError> {
        let mut socket = TcpSocket::new(
            self.stack,
            &mut self.rx_buffer[..],
            &mut self.tx_buffer[..],
        );
        let address = match remote.ip() {
            IpAddr::V4(v4) => IpAddress::Ipv4(v4),
            IpAddr::V6(v6) => IpAddress::Ipv6(v6),
        };
        let endpoint = IpEndpoint::new(address, remote.port());

        let connected = with_timeout(CONNECT_TIMEOUT, socket.connect(endpoint)).await;
        let err = match connected {
            Ok(Ok(())) => return Ok(NetSocket(socket)),
            Ok(Err(embassy_net::tcp::ConnectError::NoRoute)) => DialError::NoRoute,
            Ok(Err(embassy_net::tcp::ConnectError::TimedOut)) | Err(_) => DialError::TimedOut,
            Ok(Err(err)) => {
                println!("dialer: tcp connect err={:?}", err);
                DialError::ConnectionRefused
            }
        };
        socket.abort();
        Err(err)
    }
}

pub(crate) struct NetSocket<'s>(TcpSocket<'s>);

impl ErrorType for NetSocket<'_> {
    type Error = embassy_net::tcp::Error;
}

impl Read for NetSocket<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0.read(buf).await
    }
}

impl Write for NetSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().await
    }
}

impl StreamSocket for NetSocket<'_> {
    async fn close(&mut self) {
        if with_timeout(CLOSE_FLUSH_TIMEOUT, self.0.flush()).await.is_err() {
            println!("dialer: flush before close timed out");
        }
        self.0.close();
    }
}
