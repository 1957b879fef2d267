/*
 *  capability.rs
 *
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 *
 *  Environment capability publisher - set-if-absent process-wide path
 *  variables resolved relative to the running executable
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::io;
use std::path::Path;
use std::sync::Mutex;

use log::{debug, info};

use crate::error::ChannelError;

// Serializes the check+set against concurrent publishers in the same
// process. Racing writers compute the same value, so losing the race
// is benign.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Publishes `var_name` as `<executable-directory>/<segments...>`,
/// set-if-absent.
///
/// An externally pre-set value always wins, supporting deployment and
/// test overrides. Segments are trusted literals; no normalization is
/// applied. Must run before any consumer reads the variable - here,
/// during plugin registration, ahead of all dispatch traffic.
pub fn publish(var_name: &str, segments: &[&str]) -> Result<(), ChannelError> {
    let exe = std::env::current_exe().map_err(ChannelError::ExecutableResolution)?;
    let dir = exe.parent().ok_or_else(|| {
        ChannelError::ExecutableResolution(io::Error::new(
            io::ErrorKind::NotFound,
            "executable path has no parent directory",
        ))
    })?;
    publish_relative_to(var_name, dir, segments);
    Ok(())
}

/// Same as [`publish`] but with the base directory supplied by the
/// caller. Split out so the join/set-if-absent contract is testable
/// without moving the test binary around.
pub fn publish_relative_to(var_name: &str, base_dir: &Path, segments: &[&str]) {
    let mut path = base_dir.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    set_if_absent(var_name, &path);
}

fn set_if_absent(var_name: &str, value: &Path) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(existing) = std::env::var_os(var_name) {
        debug!(
            "{} already set to '{}', leaving as-is",
            var_name,
            existing.to_string_lossy()
        );
        return;
    }

    info!("publishing {}={}", var_name, value.display());
    // Writes are serialized by ENV_LOCK and happen once per process
    // before consumers are loaded.
    unsafe {
        std::env::set_var(var_name, value);
    }
}
