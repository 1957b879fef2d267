/*
 *  plugin.rs
 *
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 *
 *  lot_gpiod plugin assembly - capability publish plus channel
 *  registration
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

use log::error;

use crate::capability;
use crate::error::ChannelError;
use crate::platform::{platform_version_table, SystemInfo, Uname};
use crate::registry::{Channel, Messenger};

/// Channel name shared by convention with the host; must match exactly
/// on both sides or no calls are ever delivered.
pub const CHANNEL_NAME: &str = "lot_gpiod";

/// Capability variable consumed by later-loaded GPIO access code.
pub const LIBLOT_GPIOD_PATH_VAR: &str = "LIBLOT_GPIOD_PATH";

/// Relative location of the bundled GPIO shared library. Referenced by
/// path only; this plugin never loads it.
const LIBGPIOD_SEGMENTS: &[&str] = &["lib", "libgpiod.so"];

/// The lot_gpiod plugin: one platform-version method over
/// [`CHANNEL_NAME`], plus the [`LIBLOT_GPIOD_PATH_VAR`] capability.
///
/// Registration publishes the capability first (dispatch can only start
/// once the channel exists, so consumers observe the variable before
/// any traffic), then registers the channel. The channel unregisters
/// when the plugin is dropped.
#[derive(Debug)]
pub struct LotGpiodPlugin {
    channel: Channel,
}

impl LotGpiodPlugin {
    /// Registers the plugin on `messenger` using the real `uname(2)`
    /// query.
    pub fn register_with(messenger: &Messenger) -> Result<Self, ChannelError> {
        Self::register_with_system(messenger, Uname)
    }

    /// Registration with a caller-supplied OS query, for tests and
    /// embedding hosts.
    pub fn register_with_system<S: SystemInfo + 'static>(
        messenger: &Messenger,
        sys: S,
    ) -> Result<Self, ChannelError> {
        // Capability publish failure is non-fatal: the plugin stays
        // functional with the variable unpublished.
        if let Err(e) = capability::publish(LIBLOT_GPIOD_PATH_VAR, LIBGPIOD_SEGMENTS) {
            error!("failed to publish {}: {}", LIBLOT_GPIOD_PATH_VAR, e);
        }

        let channel = messenger.register(CHANNEL_NAME, platform_version_table(sys))?;
        Ok(Self { channel })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MethodCall, MethodResponse};
    use crate::dispatch::{dispatch, dispatch_to};
    use crate::platform::METHOD_GET_PLATFORM_VERSION;
    use crate::value::Value;

    struct FixedVersion(&'static str);

    impl SystemInfo for FixedVersion {
        fn version(&self) -> Result<String, ChannelError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_register_and_query() {
        let messenger = Messenger::new();
        let plugin =
            LotGpiodPlugin::register_with_system(&messenger, FixedVersion("5.15.0-generic"))
                .unwrap();

        let resp = dispatch(
            plugin.channel(),
            MethodCall::new(METHOD_GET_PLATFORM_VERSION, Value::Null),
        );
        assert_eq!(resp, MethodResponse::Success(Value::from("Linux 5.15.0-generic")));

        // The capability is published during registration.
        assert!(std::env::var(LIBLOT_GPIOD_PATH_VAR).is_ok());
        assert!(
            std::env::var(LIBLOT_GPIOD_PATH_VAR)
                .unwrap()
                .ends_with("lib/libgpiod.so")
        );
    }

    #[test]
    fn test_registration_is_exclusive() {
        let messenger = Messenger::new();
        let plugin = LotGpiodPlugin::register_with(&messenger).unwrap();

        let err = LotGpiodPlugin::register_with(&messenger).unwrap_err();
        assert!(matches!(err, ChannelError::DuplicateChannel(n) if n == CHANNEL_NAME));

        // Dropping the plugin frees the channel name.
        drop(plugin);
        let _again = LotGpiodPlugin::register_with(&messenger).unwrap();
    }

    #[test]
    fn test_real_uname_query() {
        let messenger = Messenger::new();
        let _plugin = LotGpiodPlugin::register_with(&messenger).unwrap();

        let resp = dispatch_to(
            &messenger,
            CHANNEL_NAME,
            MethodCall::new(METHOD_GET_PLATFORM_VERSION, Value::Null),
        )
        .expect("channel registered");

        let text = resp.result().and_then(Value::as_str).expect("success payload");
        assert!(text.starts_with("Linux "));
        assert!(text.len() > "Linux ".len());
    }
}
