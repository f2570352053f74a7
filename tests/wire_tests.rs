// Wire format tests: message JSON shapes, sample codec, endpoint derivation

use livecap::transport::wire::{decode_samples, encode_samples, endpoint_url};
use livecap::transport::{InboundMessage, OutboundMessage};

#[test]
fn audio_data_message_shape() {
    let message = OutboundMessage::audio(&[1.0f32]);

    let json: serde_json::Value = serde_json::to_value(&message).unwrap();
    assert_eq!(json["type"], "audio_data");
    // 1.0f32 little-endian is 00 00 80 3F
    assert_eq!(json["data"], "AACAPw==");
}

#[test]
fn end_stream_message_shape() {
    let json = serde_json::to_string(&OutboundMessage::EndStream).unwrap();
    assert_eq!(json, r#"{"type":"end_stream"}"#);
}

#[test]
fn parses_transcription_messages() {
    let interim: InboundMessage =
        serde_json::from_str(r#"{"type":"transcription","text":"hello","final":false}"#).unwrap();
    assert_eq!(
        interim,
        InboundMessage::Transcription {
            text: "hello".to_string(),
            is_final: false,
        }
    );

    let final_msg: InboundMessage =
        serde_json::from_str(r#"{"type":"transcription","text":"hello.","final":true}"#).unwrap();
    assert_eq!(
        final_msg,
        InboundMessage::Transcription {
            text: "hello.".to_string(),
            is_final: true,
        }
    );
}

#[test]
fn missing_final_flag_defaults_to_interim() {
    let message: InboundMessage =
        serde_json::from_str(r#"{"type":"transcription","text":"hi"}"#).unwrap();
    assert_eq!(
        message,
        InboundMessage::Transcription {
            text: "hi".to_string(),
            is_final: false,
        }
    );
}

#[test]
fn unknown_message_types_are_tolerated() {
    let message: InboundMessage =
        serde_json::from_str(r#"{"type":"heartbeat","seq":42}"#).unwrap();
    assert_eq!(message, InboundMessage::Unknown);
}

#[test]
fn malformed_payloads_fail_to_parse() {
    assert!(serde_json::from_str::<InboundMessage>("not json").is_err());
    assert!(serde_json::from_str::<InboundMessage>(r#"{"no_type":true}"#).is_err());
}

#[test]
fn sample_codec_round_trips_exactly() {
    let samples = vec![
        0.0f32,
        1.0,
        -1.0,
        0.5,
        -0.25,
        f32::MIN_POSITIVE,
        f32::MAX,
        f32::MIN,
        1.0e-7,
    ];

    let encoded = encode_samples(&samples);
    let decoded = decode_samples(&encoded).unwrap();

    assert_eq!(decoded, samples);
}

#[test]
fn empty_chunk_encodes_to_empty_payload() {
    let encoded = encode_samples(&[]);
    assert_eq!(encoded, "");
    assert_eq!(decode_samples(&encoded).unwrap(), Vec::<f32>::new());
}

#[test]
fn decode_rejects_bad_payloads() {
    assert!(decode_samples("!!!not base64!!!").is_err());
    // 3 bytes: not a whole number of f32 values
    assert!(decode_samples("AAAA").is_err());
}

#[test]
fn endpoint_derivation_upgrades_scheme() {
    assert_eq!(
        endpoint_url("http://localhost:8000").unwrap(),
        "ws://localhost:8000/ws/transcribe/"
    );
    assert_eq!(
        endpoint_url("https://captions.example.com").unwrap(),
        "wss://captions.example.com/ws/transcribe/"
    );
    // Trailing slash on the origin is tolerated
    assert_eq!(
        endpoint_url("https://captions.example.com/").unwrap(),
        "wss://captions.example.com/ws/transcribe/"
    );
    // Explicit ws(s) origins pass through
    assert_eq!(
        endpoint_url("ws://127.0.0.1:9000").unwrap(),
        "ws://127.0.0.1:9000/ws/transcribe/"
    );

    assert!(endpoint_url("ftp://example.com").is_err());
}

#[test]
fn config_file_lowers_into_session_config() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("livecap.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
[service]
name = "livecap"

[server]
origin = "https://captions.example.com"

[audio]
sample_rate = 16000
channels = 1
frame_len = 4096
chunk_interval_ms = 1000
reconnect_backoff_ms = 1000
"#
    )
    .unwrap();

    let config = livecap::Config::load(path.to_str().unwrap()).unwrap();
    assert_eq!(config.service.name, "livecap");

    let session = config.session_config();
    assert_eq!(session.server_origin, "https://captions.example.com");
    assert_eq!(session.sample_rate, 16000);
    assert_eq!(session.frame_len, 4096);
    assert_eq!(session.chunk_interval.as_millis(), 1000);
    assert_eq!(session.reconnect_backoff.as_millis(), 1000);
}
