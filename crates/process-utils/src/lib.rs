//! Child-process helpers used by the stream acquirer.
//!
//! - a windowless async command builder (a no-op outside Windows)
//! - [`OutputRecordReader`], which splits a diagnostic stream on `\r` as well
//!   as `\n` so in-place status updates surface as separate records

#[cfg(feature = "tokio")]
mod records;

#[cfg(feature = "tokio")]
pub use records::OutputRecordReader;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Keep spawned tools from opening a console window on Windows.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Async command builder for long-running children.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<std::ffi::OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}
