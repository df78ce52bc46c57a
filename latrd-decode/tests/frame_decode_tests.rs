#![allow(clippy::unreadable_literal)]
use latrd_decode::{
    ByteOrder, CoarseTimestamps, ControlType, DataWord, DetectorConfig, FrameBuilder, FrameView,
    PacketHeader, WordClass,
};

fn config(order: ByteOrder) -> DetectorConfig {
    DetectorConfig::default()
        .with_num_primary_packets(3)
        .with_primary_packet_size(96)
        .with_byte_order(order)
}

// Walks a packet the way a decode worker does, returning (timestamp, id, energy).
fn decode_packet(words: &[u64]) -> Vec<(u64, u32, u16)> {
    let mut coarse = CoarseTimestamps::new();
    let mut events = Vec::new();
    for &word in words {
        match DataWord::new(word).classify() {
            WordClass::ExtendedTimestamp { coarse: value } => coarse.observe(value),
            WordClass::Control(_) => {}
            WordClass::Event { fine, id, energy } => {
                if let Ok(timestamp) = coarse.resolve(fine) {
                    events.push((timestamp, id, energy));
                }
            }
        }
    }
    events
}

#[test]
fn test_packet_payload_decodes_to_events() {
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let config = config(order);
        let payload = [
            DataWord::extended_timestamp(0x0000_0002_0080_0000).raw(),
            DataWord::event(0x00AB_CDEF, 0x0080_1000, 0x3FFF).raw(),
            DataWord::control(ControlType::Other(0x01), 0).raw(),
            DataWord::event(17, 0x00A0_0000, 5).raw(),
        ];
        let header = PacketHeader {
            packet_number: 3,
            time_slice_wrap: 12,
            time_slice_buffer: 1,
            ..PacketHeader::default()
        };
        let bytes = FrameBuilder::new(&config)
            .packet(1, header, &payload)
            .build()
            .unwrap();

        let frame = FrameView::parse(&bytes, &config).unwrap();
        assert_eq!(frame.valid_packet_count(), 1);
        let packet = frame.packet(1).unwrap();
        let header = packet.header().unwrap();
        assert_eq!(header.word_count, 6);

        let mut words = Vec::new();
        packet
            .read_payload(header.words_to_process(config.packet_header_words), &mut words)
            .unwrap();
        assert_eq!(words, payload);

        assert_eq!(
            decode_packet(&words),
            vec![
                (0x0000_0002_0080_1000, 0x00AB_CDEF, 0x3FFF),
                (0x0000_0002_00A0_0000, 17, 5),
            ]
        );
    }
}

#[test]
fn test_config_file_drives_frame_geometry() {
    let json = r#"{ "detector": { "frame": { "num_primary_packets": 2, "primary_packet_size": 64 } } }"#;
    let config = DetectorConfig::from_json(json).unwrap();
    let bytes = FrameBuilder::new(&config).build().unwrap();
    assert_eq!(bytes.len(), 24 + 2 * 64);
    assert!(FrameView::parse(&bytes, &config).is_ok());

    // A word count beyond the packet is left for the caller to clamp.
    let header = PacketHeader {
        word_count: 50,
        ..PacketHeader::default()
    };
    assert_eq!(header.words_to_process(config.packet_header_words), 48);
    assert_eq!(config.payload_words(), 5);
}
