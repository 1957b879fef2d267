/*
 *  dispatch.rs
 *
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 *
 *  Method dispatcher - resolves a call against a channel's method set
 *  and produces exactly one response per call
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

use std::panic::{self, AssertUnwindSafe};

use log::{debug, trace, warn};

use crate::channel::{MethodCall, MethodResponse, Responder};
use crate::registry::{Channel, Messenger};

/// Error code attached to responses converted from handler faults.
pub const INTERNAL_ERROR_CODE: &str = "internal";

/// Resolves `call` against the channel's method set and returns its one
/// response.
///
/// Runs the handler synchronously on the calling thread. Outcomes:
/// handler success, handler error, handler fault (panic, caught and
/// converted to an `internal` error) or method unknown
/// ([`MethodResponse::NotImplemented`]). A handler fault never takes the
/// hosting process down.
pub fn dispatch(channel: &Channel, call: MethodCall) -> MethodResponse {
    let mut responder = Responder::new(call.method.clone());
    trace!("dispatching '{}' on channel '{}'", call.method, channel.name());

    let outcome = if channel.table().supports(&call.method) {
        responder.begin();
        run_handler(channel, &call)
    } else {
        debug!(
            "channel '{}' does not implement '{}'",
            channel.name(),
            call.method
        );
        MethodResponse::NotImplemented
    };

    // `respond` cannot fail here: the responder is fresh and this is
    // its single response.
    let _ = responder.respond(outcome);
    responder
        .into_response()
        .unwrap_or(MethodResponse::NotImplemented)
}

/// Host-side delivery by channel name. `None` means the name is not
/// registered on this messenger and the call was never delivered.
pub fn dispatch_to(
    messenger: &Messenger,
    channel_name: &str,
    call: MethodCall,
) -> Option<MethodResponse> {
    let table = messenger.lookup(channel_name)?;

    let mut responder = Responder::new(call.method.clone());
    let outcome = if table.supports(&call.method) {
        responder.begin();
        invoke_caught(|| table.invoke(&call.method, &call.arguments), &call.method)
    } else {
        MethodResponse::NotImplemented
    };

    let _ = responder.respond(outcome);
    responder.into_response()
}

fn run_handler(channel: &Channel, call: &MethodCall) -> MethodResponse {
    invoke_caught(
        || channel.table().invoke(&call.method, &call.arguments),
        &call.method,
    )
}

/// Invokes a handler with fault containment: a panic becomes an
/// `internal` error response instead of propagating.
fn invoke_caught<F>(f: F, method: &str) -> MethodResponse
where
    F: FnOnce() -> Option<crate::handler::MethodResult>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Some(Ok(value))) => MethodResponse::Success(value),
        Ok(Some(Err(e))) => MethodResponse::from(e),
        // supports() said yes but the entry vanished; tables are
        // immutable after registration, so this is unreachable in
        // practice. Answer NotImplemented rather than fault.
        Ok(None) => MethodResponse::NotImplemented,
        Err(fault) => {
            let diagnostic = panic_message(&*fault);
            warn!("handler for '{}' faulted: {}", method, diagnostic);
            MethodResponse::Error {
                code: INTERNAL_ERROR_CODE.to_string(),
                message: diagnostic,
                details: crate::value::Value::Null,
            }
        }
    }
}

fn panic_message(fault: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = fault.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = fault.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
