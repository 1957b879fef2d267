use std::ffi::CStr;

use log::debug;

use crate::channel::MethodError;
use crate::error::ChannelError;
use crate::handler::MethodTable;
use crate::value::Value;

/// Method name served by [`platform_version_table`].
pub const METHOD_GET_PLATFORM_VERSION: &str = "getPlatformVersion";

/// Host OS system-identification facility, behind a trait so tests can
/// substitute a fixed version string.
pub trait SystemInfo: Send + Sync {
    /// The kernel build/version string (`utsname.version`).
    fn version(&self) -> Result<String, ChannelError>;
}

/// `uname(2)`-backed [`SystemInfo`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Uname;

impl SystemInfo for Uname {
    fn version(&self) -> Result<String, ChannelError> {
        let mut data: libc::utsname = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::uname(&mut data) };
        if rc != 0 {
            return Err(ChannelError::OsQueryFailed(
                std::io::Error::last_os_error().to_string(),
            ));
        }
        // The buffer is NUL-terminated by the kernel.
        let version = unsafe { CStr::from_ptr(data.version.as_ptr()) };
        Ok(version.to_string_lossy().into_owned())
    }
}

/// Builds the method table for the platform-version channel.
///
/// `getPlatformVersion` takes no arguments (extras are ignored) and
/// answers `"Linux <version>"`. An OS query failure comes back as a
/// structured `os_query_failed` error rather than a fault.
pub fn platform_version_table<S: SystemInfo + 'static>(sys: S) -> MethodTable {
    MethodTable::new().method(METHOD_GET_PLATFORM_VERSION, move |_args| {
        match sys.version() {
            Ok(version) => {
                let display = format!("Linux {}", version);
                debug!("platform version query answered: {}", display);
                Ok(Value::String(display))
            }
            Err(e) => Err(MethodError::new("os_query_failed", e.to_string())),
        }
    })
}
