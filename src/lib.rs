/*
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! # lot_gpiod
//!
//! A minimal method-channel dispatch core for bridging a UI host and a
//! native backend, with the `lot_gpiod` platform plugin as its worked
//! example.
//!
//! ## Pieces
//!
//! - [`Messenger`]: channel registry, at most one handler per name
//! - [`MethodTable`]: finite method set resolved at registration
//! - [`dispatch`]: one call in, exactly one [`MethodResponse`] out -
//!   success, typed error, or not-implemented; handler faults are
//!   contained, never fatal
//! - [`StandardMethodCodec`]: the binary wire encoding for calls and
//!   response envelopes
//! - [`capability::publish`]: set-if-absent environment capability
//!   variables resolved against the executable directory
//!
//! ## The worked example
//!
//! ```no_run
//! use lot_gpiod::{dispatch, LotGpiodPlugin, Messenger, MethodCall, Value};
//!
//! let messenger = Messenger::new();
//! let plugin = LotGpiodPlugin::register_with(&messenger)?;
//!
//! // LIBLOT_GPIOD_PATH now points at <exe-dir>/lib/libgpiod.so
//! // (unless the deployment pre-set it).
//!
//! let resp = dispatch(
//!     plugin.channel(),
//!     MethodCall::new("getPlatformVersion", Value::Null),
//! );
//! # Ok::<(), lot_gpiod::ChannelError>(())
//! ```

pub mod capability;
pub mod channel;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod platform;
pub mod plugin;
pub mod registry;
pub mod value;

// Re-exports for convenience
pub use channel::{MethodCall, MethodError, MethodResponse, Responder};
pub use codec::StandardMethodCodec;
pub use dispatch::{dispatch, dispatch_to, INTERNAL_ERROR_CODE};
pub use error::{ChannelError, CodecError};
pub use handler::{MethodFn, MethodResult, MethodTable};
pub use platform::{SystemInfo, Uname, METHOD_GET_PLATFORM_VERSION};
pub use plugin::{LotGpiodPlugin, CHANNEL_NAME, LIBLOT_GPIOD_PATH_VAR};
pub use registry::{Channel, Messenger};
pub use value::Value;
