//! Surface errors
//!
//! Every failing console call surfaces as exactly one of these, tagged with
//! what the surface was doing and the platform code it got back.

use crate::console::ErrorCode;

pub type SurfaceResult<T> = Result<T, SurfaceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// No screen buffer could be obtained
    #[error("{context} (error code {})", .code.raw())]
    Acquisition {
        context: &'static str,
        #[source]
        code: ErrorCode,
    },
    /// A state-changing call was refused
    #[error("{context} (error code {})", .code.raw())]
    PlatformCall {
        context: &'static str,
        #[source]
        code: ErrorCode,
    },
    /// Text or an escape sequence could not be written
    #[error("{context} (error code {})", .code.raw())]
    Write {
        context: &'static str,
        #[source]
        code: ErrorCode,
    },
    /// Read-back or a state query failed
    #[error("{context} (error code {})", .code.raw())]
    Read {
        context: &'static str,
        #[source]
        code: ErrorCode,
    },
}

impl SurfaceError {
    pub(crate) fn acquisition(context: &'static str) -> impl FnOnce(ErrorCode) -> Self {
        move |code| Self::Acquisition { context, code }
    }

    pub(crate) fn platform_call(context: &'static str) -> impl FnOnce(ErrorCode) -> Self {
        move |code| Self::PlatformCall { context, code }
    }

    pub(crate) fn write(context: &'static str) -> impl FnOnce(ErrorCode) -> Self {
        move |code| Self::Write { context, code }
    }

    pub(crate) fn read(context: &'static str) -> impl FnOnce(ErrorCode) -> Self {
        move |code| Self::Read { context, code }
    }

    /// Platform error code behind the failure
    pub fn code(&self) -> ErrorCode {
        match *self {
            Self::Acquisition { code, .. }
            | Self::PlatformCall { code, .. }
            | Self::Write { code, .. }
            | Self::Read { code, .. } => code,
        }
    }

    /// Which operation failed
    pub fn context(&self) -> &'static str {
        match *self {
            Self::Acquisition { context, .. }
            | Self::PlatformCall { context, .. }
            | Self::Write { context, .. }
            | Self::Read { context, .. } => context,
        }
    }
}
