/*
 *  tests/channel_integration.rs
 *
 *  Integration tests for the channel dispatch core
 *
 *  lot_gpiod - LOT platform channel bridge
 *  (c) 2020-26 Stuart Hunter
 */

use anyhow::Result;
use lot_gpiod::{
    dispatch, dispatch_to, ChannelError, LotGpiodPlugin, Messenger, MethodCall, MethodError,
    MethodResponse, MethodTable, StandardMethodCodec, SystemInfo, Value, CHANNEL_NAME,
    LIBLOT_GPIOD_PATH_VAR, METHOD_GET_PLATFORM_VERSION,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct FixedVersion(&'static str);

impl SystemInfo for FixedVersion {
    fn version(&self) -> std::result::Result<String, ChannelError> {
        Ok(self.0.to_string())
    }
}

#[test]
fn test_every_call_yields_exactly_one_response() {
    init_logging();
    let messenger = Messenger::new();
    let table = MethodTable::new()
        .method("ok", |_| Ok(Value::Null))
        .method("err", |_| Err(MethodError::new("e", "nope")))
        .method("boom", |_| panic!("fault"));
    let channel = messenger.register("stress", table).unwrap();

    let calls = ["ok", "err", "boom", "missing", "ok", "missing", "err"];
    let responses: Vec<MethodResponse> = calls
        .iter()
        .map(|m| dispatch(&channel, MethodCall::new(*m, Value::Null)))
        .collect();

    // No double-response, no missing response.
    assert_eq!(responses.len(), calls.len());
    assert_eq!(responses[3], MethodResponse::NotImplemented);
    assert!(matches!(&responses[2], MethodResponse::Error { code, .. } if code == "internal"));
}

#[test]
fn test_plugin_end_to_end_over_the_wire() -> Result<()> {
    init_logging();
    let messenger = Messenger::new();
    let _plugin =
        LotGpiodPlugin::register_with_system(&messenger, FixedVersion("5.15.0-generic"))?;

    // Host side: encode the call, deliver by channel name, encode the
    // response back - the full round trip a UI host performs.
    let call_bytes =
        StandardMethodCodec::encode_call(&MethodCall::new(METHOD_GET_PLATFORM_VERSION, Value::Null));
    let call = StandardMethodCodec::decode_call(&call_bytes)?;

    let response = dispatch_to(&messenger, CHANNEL_NAME, call).expect("channel registered");
    assert_eq!(
        response,
        MethodResponse::Success(Value::from("Linux 5.15.0-generic"))
    );

    let reply_bytes = StandardMethodCodec::encode_response(&response);
    assert_eq!(StandardMethodCodec::decode_response(&reply_bytes)?, response);

    Ok(())
}

#[test]
fn test_unknown_method_is_not_implemented_on_the_wire() -> Result<()> {
    init_logging();
    let messenger = Messenger::new();
    let _plugin = LotGpiodPlugin::register_with_system(&messenger, FixedVersion("6.1.0"))?;

    let mut args = std::collections::BTreeMap::new();
    args.insert("anything".to_string(), Value::I32(1));
    let call = MethodCall::new("unknownThing", Value::Map(args));

    let response = dispatch_to(&messenger, CHANNEL_NAME, call).expect("channel registered");
    assert_eq!(response, MethodResponse::NotImplemented);

    // Not-implemented travels as the empty message.
    assert!(StandardMethodCodec::encode_response(&response).is_empty());
    Ok(())
}

#[test]
fn test_duplicate_channel_then_reuse() {
    init_logging();
    let messenger = Messenger::new();
    let first = messenger.register("only_one", MethodTable::new()).unwrap();

    let err = messenger.register("only_one", MethodTable::new()).unwrap_err();
    assert!(matches!(err, ChannelError::DuplicateChannel(n) if n == "only_one"));

    messenger.unregister(first);
    messenger
        .register("only_one", MethodTable::new())
        .expect("name reusable after unregister");
}

#[test]
fn test_capability_variable_points_at_bundled_library() -> Result<()> {
    init_logging();
    let messenger = Messenger::new();
    let _plugin = LotGpiodPlugin::register_with_system(&messenger, FixedVersion("6.1.0"))?;

    let exe_dir = std::env::current_exe()?
        .parent()
        .expect("test binary has a directory")
        .to_path_buf();
    let expected = exe_dir.join("lib").join("libgpiod.so");
    assert_eq!(
        std::env::var(LIBLOT_GPIOD_PATH_VAR)?,
        expected.to_string_lossy()
    );
    Ok(())
}

#[test]
fn test_concurrent_hosts_each_get_one_response() {
    init_logging();
    let messenger = std::sync::Arc::new(Messenger::new());
    let table = MethodTable::new().method("echo", |args| Ok(args.clone()));
    let _channel = messenger.register("shared", table).unwrap();

    // Several host threads delivering by name; every call must come
    // back with exactly one response.
    let handles: Vec<_> = (0..8i64)
        .map(|t| {
            let messenger = std::sync::Arc::clone(&messenger);
            std::thread::spawn(move || {
                let mut count = 0;
                for i in 0..50i64 {
                    let resp = dispatch_to(
                        &messenger,
                        "shared",
                        MethodCall::new("echo", Value::I64(t * 1000 + i)),
                    );
                    assert_eq!(resp, Some(MethodResponse::Success(Value::I64(t * 1000 + i))));
                    count += 1;
                }
                count
            })
        })
        .collect();

    let total: i32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 8 * 50);
}

#[test]
fn test_serial_calls_keep_order() {
    init_logging();
    let messenger = Messenger::new();
    let table = MethodTable::new().method("echo", |args| Ok(args.clone()));
    let channel = messenger.register("ordered", table).unwrap();

    for i in 0..100i64 {
        let resp = dispatch(&channel, MethodCall::new("echo", Value::I64(i)));
        assert_eq!(resp, MethodResponse::Success(Value::I64(i)));
    }
}
