use core::fmt;

/// Failure reported by the radio driver seam.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverError {
    NotInitialized,
    NotStarted,
    Unavailable,
    Rejected(&'static str),
}

impl DriverError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotInitialized => "driver not initialized",
            Self::NotStarted => "driver not started",
            Self::Unavailable => "driver unavailable",
            Self::Rejected(reason) => reason,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectFailure {
    RetriesExhausted { attempts: u8 },
    AssociationRequest(DriverError),
    ReadyTimeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectError {
    InProgress,
    ResourceExhausted,
    Driver(DriverError),
    ConnectFailed(ConnectFailure),
}

impl ConnectError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "connect already in progress",
            Self::ResourceExhausted => "no free ready signal",
            Self::Driver(err) => err.as_str(),
            Self::ConnectFailed(ConnectFailure::RetriesExhausted { .. }) => {
                "too many connection attempts"
            }
            Self::ConnectFailed(ConnectFailure::AssociationRequest(_)) => {
                "association request failed"
            }
            Self::ConnectFailed(ConnectFailure::ReadyTimeout) => "timed out waiting for addresses",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownError {
    Stop(DriverError),
    Deinit(DriverError),
}

impl ShutdownError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop(_) => "driver stop failed",
            Self::Deinit(_) => "driver deinit failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialError {
    NoAddress,
    DnsFailed,
    ConnectionRefused,
    TimedOut,
    NoRoute,
}

impl DialError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAddress => "no address",
            Self::DnsFailed => "dns lookup failed",
            Self::ConnectionRefused => "connection refused",
            Self::TimedOut => "timed out",
            Self::NoRoute => "no route",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStage {
    Resolve,
    Connect,
}

/// Verdict of a [`ResponseValidator`](crate::ResponseValidator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    TooShort {
        received: usize,
        required: usize,
    },
    Mismatch {
        index: usize,
        received: u8,
        expected: u8,
    },
    Rejected(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointError {
    NetworkUnavailable(NetworkStage, DialError),
    SendFailed {
        written: Option<usize>,
    },
    ResponseTooShort {
        received: usize,
        required: usize,
    },
    ResponseMismatch {
        index: usize,
        received: u8,
        expected: u8,
    },
    ResponseRejected(&'static str),
    ResponseOverflow {
        capacity: usize,
    },
}

impl EndpointError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkUnavailable(NetworkStage::Resolve, _) => "name resolution failed",
            Self::NetworkUnavailable(NetworkStage::Connect, _) => "socket connect failed",
            Self::SendFailed { .. } => "socket send failed",
            Self::ResponseTooShort { .. } => "response too short",
            Self::ResponseMismatch { .. } => "response mismatch",
            Self::ResponseRejected(reason) => reason,
            Self::ResponseOverflow { .. } => "response exceeds buffer",
        }
    }
}

impl From<ValidationError> for EndpointError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::TooShort { received, required } => {
                Self::ResponseTooShort { received, required }
            }
            ValidationError::Mismatch {
                index,
                received,
                expected,
            } => Self::ResponseMismatch {
                index,
                received,
                expected,
            },
            ValidationError::Rejected(reason) => Self::ResponseRejected(reason),
        }
    }
}

/// Overall result of one wake cycle, tagged by the stage that failed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleError {
    Platform(DriverError),
    Connect(ConnectError),
    Endpoint(EndpointError),
    Shutdown(ShutdownError),
}

impl CycleError {
    pub const fn stage(self) -> &'static str {
        match self {
            Self::Platform(_) => "platform",
            Self::Connect(_) => "connect",
            Self::Endpoint(_) => "endpoint",
            Self::Shutdown(_) => "shutdown",
        }
    }
}

impl From<ConnectError> for CycleError {
    fn from(err: ConnectError) -> Self {
        Self::Connect(err)
    }
}

impl From<EndpointError> for CycleError {
    fn from(err: EndpointError) -> Self {
        Self::Endpoint(err)
    }
}

impl From<ShutdownError> for CycleError {
    fn from(err: ShutdownError) -> Self {
        Self::Shutdown(err)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(err) => write!(f, "station driver: {}", err),
            Self::ConnectFailed(ConnectFailure::RetriesExhausted { attempts }) => {
                write!(f, "{} ({} disconnects)", self.as_str(), attempts)
            }
            Self::ConnectFailed(ConnectFailure::AssociationRequest(err)) => {
                write!(f, "{}: {}", self.as_str(), err)
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop(err) | Self::Deinit(err) => write!(f, "{}: {}", self.as_str(), err),
        }
    }
}

impl fmt::Display for DialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnavailable(_, err) => write!(f, "{}: {}", self.as_str(), err),
            Self::SendFailed {
                written: Some(written),
            } => write!(f, "{} after {} bytes", self.as_str(), written),
            Self::ResponseTooShort { received, required } => write!(
                f,
                "{}: {} bytes, need at least {}",
                self.as_str(),
                received,
                required
            ),
            Self::ResponseMismatch {
                index,
                received,
                expected,
            } => write!(
                f,
                "{} at i = {}, {:?} != {:?}",
                self.as_str(),
                index,
                *received as char,
                *expected as char
            ),
            Self::ResponseOverflow { capacity } => {
                write!(f, "{} of {} bytes", self.as_str(), capacity)
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform(err) => write!(f, "platform: {}", err),
            Self::Connect(err) => write!(f, "connect: {}", err),
            Self::Endpoint(err) => write!(f, "endpoint: {}", err),
            Self::Shutdown(err) => write!(f, "shutdown: {}", err),
        }
    }
}
