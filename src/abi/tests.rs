//! Integration tests for ABI module

#[cfg(test)]
mod integration_tests {
    use crate::abi::*;

    const GREETER_ABI: &str = r#"[
        {"type":"function","name":"greet","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
        {"type":"function","name":"setGreeting","inputs":[{"name":"_greeting","type":"string"},{"name":"_count","type":"uint256"}],"outputs":[]},
        {"type":"function","name":"history","inputs":[],"outputs":[{"name":"","type":"string[]"},{"name":"","type":"int64[2]"}],"stateMutability":"view"},
        {"type":"event","name":"GreetingChanged","inputs":[{"name":"sender","type":"address","indexed":true},{"name":"greeting","type":"string","indexed":false}]},
        {"type":"event","name":"Tagged","inputs":[{"name":"tag","type":"string","indexed":true},{"name":"count","type":"uint8","indexed":false}],"anonymous":true}
    ]"#;

    fn index() -> ContractIndex {
        ContractIndex::from_json(GREETER_ABI).unwrap()
    }

    #[test]
    fn test_full_encode_decode_cycle() {
        let values = vec![
            AbiValue::Address([0xab; 20]),
            AbiValue::uint(1_000_000),
            AbiValue::Bool(true),
            AbiValue::string("Hello, World!"),
            AbiValue::int(-42),
            AbiValue::Bytes(vec![]),
        ];
        let types = vec![
            AbiType::Address,
            AbiType::UINT256,
            AbiType::Bool,
            AbiType::String,
            AbiType::int(16),
            AbiType::Bytes,
        ];

        let encoded = AbiEncoder::encode(&values, &types).unwrap();
        let decoded = AbiDecoder::decode(&encoded, &types).unwrap();
        assert_eq!(values, decoded);
    }

    #[test]
    fn test_set_greeting_round_trip() {
        let set = index().function("setGreeting").unwrap().clone();
        let args = vec![AbiValue::string("Greeting"), AbiValue::uint(10)];

        let call = set.encode(&args).unwrap();
        assert_eq!(&call[..4], &set.selector());

        let decoded = AbiDecoder::decode_call_arguments(&set, &call[4..]).unwrap();
        assert_eq!(decoded, args);
        assert_eq!(AbiDecoder::decode_call_data(&set, &call).unwrap(), args);
    }

    #[test]
    fn test_decode_result_with_nested_dynamic_output() {
        let history = index().constant_function("history").unwrap().clone();
        let strings = AbiValue::Array(vec![
            AbiValue::string("hi"),
            AbiValue::string(""),
            AbiValue::string("a much longer greeting that spans more than one word of data"),
        ]);
        let pair = AbiValue::Array(vec![AbiValue::int(-1), AbiValue::int(i64::MAX)]);

        let types: Vec<AbiType> = history.output_types().into_iter().cloned().collect();
        let encoded = AbiEncoder::encode(&[strings.clone(), pair.clone()], &types).unwrap();

        assert_eq!(history.decode_result(&encoded).unwrap(), vec![strings, pair]);
    }

    #[test]
    fn test_nested_string_arrays() {
        let ty = AbiType::parse("string[][]").unwrap();
        let value = AbiValue::Array(vec![
            AbiValue::Array(vec![AbiValue::string("a"), AbiValue::string("bc")]),
            AbiValue::Array(vec![]),
            AbiValue::Array(vec![AbiValue::string("")]),
        ]);

        let encoded = AbiEncoder::encode(&[value.clone()], &[ty.clone()]).unwrap();
        assert_eq!(AbiDecoder::decode(&encoded, &[ty]).unwrap(), vec![value]);
    }

    #[test]
    fn test_event_decode_indexed_and_data() {
        let event = index().event("GreetingChanged").unwrap().clone();
        let sender = [0x11u8; 20];

        let mut sender_topic = [0u8; 32];
        sender_topic[12..].copy_from_slice(&sender);
        let data = AbiEncoder::encode(&[AbiValue::string("hello")], &[AbiType::String]).unwrap();

        let decoded = AbiDecoder::decode_event(&event, &data, &[event.topic(), sender_topic]).unwrap();
        assert_eq!(decoded.name, "GreetingChanged");
        assert_eq!(decoded.params[0], ("sender".to_string(), AbiValue::Address(sender)));
        assert_eq!(decoded.get("greeting"), Some(&AbiValue::string("hello")));
    }

    #[test]
    fn test_event_topic_count_mismatch() {
        let event = index().event("GreetingChanged").unwrap().clone();
        let data = AbiEncoder::encode(&[AbiValue::string("x")], &[AbiType::String]).unwrap();

        let err = AbiDecoder::decode_event(&event, &data, &[event.topic()]).unwrap_err();
        assert!(err.is_decoding());
        assert!(AbiDecoder::decode_event(&event, &data, &[event.topic(), [0; 32], [0; 32]]).is_err());
    }

    #[test]
    fn test_anonymous_event_with_hashed_dynamic_index() {
        let event = index().event("Tagged").unwrap().clone();
        let tag_hash = crate::utils::crypto::keccak256(b"release");
        let data = AbiEncoder::encode(&[AbiValue::uint(3)], &[AbiType::uint(8)]).unwrap();

        // No signature topic for anonymous events
        let decoded = AbiDecoder::decode_event(&event, &data, &[tag_hash]).unwrap();
        assert_eq!(decoded.get("tag"), Some(&AbiValue::FixedBytes(tag_hash.to_vec())));
        assert_eq!(decoded.get("count"), Some(&AbiValue::uint(3)));
    }

    #[test]
    fn test_selector_determinism() {
        let a = FunctionDescriptor::parse_signature("transfer(address,uint256)").unwrap();
        let b = FunctionDescriptor::parse_signature("transfer(address,uint256)").unwrap();
        let c = FunctionDescriptor::parse_signature("transfer(address,uint128)").unwrap();

        assert_eq!(hex::encode(a.selector()), "a9059cbb");
        assert_eq!(a.selector(), b.selector());
        assert_ne!(a.selector(), c.selector());
    }

    #[test]
    fn test_negative_ints_round_trip_across_widths() {
        for (bits, v) in [(8u16, -128i64), (16, -1), (64, i64::MIN), (256, -7)] {
            let ty = AbiType::int(bits);
            let encoded = AbiEncoder::encode(&[AbiValue::int(v)], &[ty.clone()]).unwrap();
            assert_eq!(encoded[0], 0xff);
            assert_eq!(AbiDecoder::decode(&encoded, &[ty]).unwrap(), vec![AbiValue::int(v)]);
        }
    }
}
