#![allow(
    clippy::cast_possible_truncation,
    clippy::unreadable_literal,
    clippy::uninlined_format_args
)]
use latrd_core::{Channel, DataType, OutputFrame};
use latrd_decode::{DataWord, DetectorConfig, FrameBuilder, PacketHeader};
use latrd_process::ProcessCoordinator;

// Match code 1, high bits 0x1_0000_0000.
const COARSE: u64 = 0x0000_0001_0020_0000;
const HIGH_BITS: u64 = 0x0000_0001_0000_0000;

fn config(threads: usize) -> DetectorConfig {
    DetectorConfig::default()
        .with_num_primary_packets(4)
        .with_primary_packet_size(128)
        .with_time_slice_buffers(4)
        .with_output_frame_capacity(10_000)
        .with_processing_threads(threads)
}

fn header(number: u32, wrap: u32, buffer: u32) -> PacketHeader {
    PacketHeader {
        packet_number: number,
        time_slice_wrap: wrap,
        time_slice_buffer: buffer,
        ..PacketHeader::default()
    }
}

// One extended timestamp followed by an event per fine value; ids count up from `first_id`.
fn payload(fines: &[u64], first_id: u32) -> Vec<u64> {
    let mut words = vec![DataWord::extended_timestamp(COARSE).raw()];
    for (offset, &fine) in fines.iter().enumerate() {
        let id = first_id + offset as u32;
        words.push(DataWord::event(id, fine, (id % 0x3FFF) as u16).raw());
    }
    words
}

fn idle(config: &DetectorConfig) -> Vec<u8> {
    FrameBuilder::idle(config).build().unwrap()
}

fn channel_values(frames: &[OutputFrame], channel: Channel) -> Vec<u64> {
    frames
        .iter()
        .filter(|frame| frame.channel == channel)
        .flat_map(|frame| match channel {
            Channel::EventTimeOffset => frame.data.as_u64().unwrap().to_vec(),
            _ => frame
                .data
                .as_u32()
                .unwrap()
                .iter()
                .map(|&v| u64::from(v))
                .collect(),
        })
        .collect()
}

fn run(coordinator: &mut ProcessCoordinator, frames: &[Vec<u8>]) -> Vec<OutputFrame> {
    let mut output = Vec::new();
    for frame in frames {
        output.extend(coordinator.process_frame(frame).unwrap());
    }
    output
}

#[test]
fn test_round_trip_in_time_order() {
    let config = config(4);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    let mut frames = Vec::new();
    let mut expected = Vec::new();
    for buffer in 0..4u32 {
        let fines: Vec<u64> = (0..5).map(|k| 0x0020_0000 + u64::from(buffer) * 16 + k).collect();
        expected.extend(fines.iter().map(|&fine| HIGH_BITS + fine));
        frames.push(
            FrameBuilder::new(&config)
                .packet(0, header(buffer, 0, buffer), &payload(&fines, buffer * 5))
                .build()
                .unwrap(),
        );
    }
    frames.push(idle(&config));

    let output = run(&mut coordinator, &frames);
    assert_eq!(channel_values(&output, Channel::EventTimeOffset), expected);
    assert_eq!(
        channel_values(&output, Channel::EventId),
        (0..20).collect::<Vec<u64>>()
    );
    assert_eq!(coordinator.statistics().events_decoded, 20);
}

fn interleaved_acquisition(config: &DetectorConfig) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut id = 0;
    for wrap in 0..4u32 {
        let mut builder = FrameBuilder::new(config).frame_number(u64::from(wrap));
        // Buffers arrive out of order within each frame.
        for (slot, buffer) in [2u32, 0, 3, 1].into_iter().enumerate() {
            let fines: Vec<u64> = (0..8).map(|k| 0x0020_0000 + u64::from(id) + k).collect();
            builder = builder.packet(slot, header(id, wrap, buffer), &payload(&fines, id));
            id += 8;
        }
        frames.push(builder.build().unwrap());
    }
    frames.push(idle(config));
    frames
}

#[test]
fn test_round_trip_independent_of_thread_count() {
    let single = config(1);
    let mut coordinator = ProcessCoordinator::new(single.clone()).unwrap();
    let serial = run(&mut coordinator, &interleaved_acquisition(&single));

    let parallel = config(8);
    let mut coordinator = ProcessCoordinator::new(parallel.clone()).unwrap();
    let threaded = run(&mut coordinator, &interleaved_acquisition(&parallel));

    assert_eq!(serial, threaded);

    let mut timestamps = channel_values(&threaded, Channel::EventTimeOffset);
    timestamps.sort_unstable();
    let expected: Vec<u64> = (0..128).map(|k| HIGH_BITS + 0x0020_0000 + k).collect();
    assert_eq!(timestamps, expected);
}

#[test]
fn test_next_period_resolves_against_current() {
    let config = config(2);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    // Coarse match code 1, fine match code 2.
    let frame = FrameBuilder::new(&config)
        .packet(0, header(0, 0, 0), &payload(&[0x0040_0005], 1))
        .build()
        .unwrap();
    let output = run(&mut coordinator, &[frame, idle(&config)]);

    assert_eq!(
        channel_values(&output, Channel::EventTimeOffset),
        vec![HIGH_BITS + 0x0040_0005]
    );
    assert_eq!(coordinator.statistics().timestamp_mismatches, 0);
}

#[test]
fn test_match_code_ignores_bit_23() {
    let config = config(2);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    // Both fine values carry match code 1 (bits 21..23); only one has bit 23 set.
    // A code 0 event falls back to the synthesised previous coarse value.
    let frame = FrameBuilder::new(&config)
        .packet(0, header(0, 0, 0), &payload(&[0x0020_0004, 0x00A0_0007, 0x0000_0009], 1))
        .build()
        .unwrap();
    let output = run(&mut coordinator, &[frame, idle(&config)]);

    assert_eq!(
        channel_values(&output, Channel::EventTimeOffset),
        vec![HIGH_BITS + 0x0020_0004, HIGH_BITS + 0x00A0_0007, HIGH_BITS + 0x0000_0009]
    );
    assert_eq!(coordinator.statistics().timestamp_mismatches, 0);
}

#[test]
fn test_mismatched_event_is_dropped() {
    let config = config(2);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    // Fine match code 3 against mc = 1, mp = 0.
    let frame = FrameBuilder::new(&config)
        .packet(0, header(0, 0, 0), &payload(&[0x0020_0001, 0x0060_0002, 0x0020_0003], 10))
        .build()
        .unwrap();
    let output = run(&mut coordinator, &[frame, idle(&config)]);

    assert_eq!(channel_values(&output, Channel::EventId), vec![10, 12]);
    let stats = coordinator.statistics();
    assert_eq!(stats.timestamp_mismatches, 1);
    assert_eq!(stats.events_decoded, 2);
}

#[test]
fn test_stale_generation_is_dropped() {
    let config = config(2);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    let mut frames: Vec<Vec<u8>> = (0..3u32)
        .map(|wrap| {
            FrameBuilder::new(&config)
                .packet(0, header(wrap, wrap, 0), &payload(&[0x0020_0000], wrap + 1))
                .build()
                .unwrap()
        })
        .collect();
    // current_wrap is now 2; wrap 0 is two generations behind.
    frames.push(
        FrameBuilder::new(&config)
            .packet(0, header(99, 0, 1), &payload(&[0x0020_0000], 99))
            .build()
            .unwrap(),
    );
    frames.push(idle(&config));

    let output = run(&mut coordinator, &frames);
    assert_eq!(channel_values(&output, Channel::EventId), vec![1, 2, 3]);
    assert_eq!(coordinator.statistics().stale_packets, 1);
}

#[test]
fn test_idle_frame_resets_session() {
    let config = config(2).with_output_frame_capacity(4);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    let frame = FrameBuilder::new(&config)
        .packet(0, header(0, 3, 2), &payload(&[0x0020_0001, 0x0020_0002], 0))
        .build()
        .unwrap();
    coordinator.process_frame(&frame).unwrap();
    assert_eq!(coordinator.current_wrap(), 3);
    assert_eq!(coordinator.current_buffer(), 2);

    let flushed = coordinator.process_frame(&idle(&config)).unwrap();
    assert_eq!(flushed.len(), 3);
    assert!(flushed.iter().all(|frame| frame.len() == 2));
    assert!(flushed.iter().all(|frame| frame.frame_number == 0));
    assert_eq!(coordinator.current_wrap(), 0);
    assert_eq!(coordinator.current_buffer(), 0);
    assert!(coordinator.resident_generations().is_empty());

    // A new session starting at wrap 0 is accepted.
    let frame = FrameBuilder::new(&config)
        .packet(0, header(1, 0, 0), &payload(&[0x0020_0003], 5))
        .build()
        .unwrap();
    coordinator.process_frame(&frame).unwrap();
    assert_eq!(coordinator.resident_generations(), vec![0]);

    let flushed = coordinator.process_frame(&idle(&config)).unwrap();
    assert_eq!(channel_values(&flushed, Channel::EventId), vec![5]);
    assert_eq!(flushed[0].frame_number, 0);

    let stats = coordinator.statistics();
    assert_eq!(stats.idle_frames, 2);
    assert_eq!(stats.stale_packets, 0);
}

#[test]
fn test_dropped_slots_are_not_submitted() {
    let config = config(3);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    let frame = FrameBuilder::new(&config)
        .packet(0, header(0, 0, 0), &payload(&[0x0020_0000; 3], 0))
        .packet(2, header(1, 0, 1), &payload(&[0x0020_0000; 2], 3))
        .build()
        .unwrap();
    coordinator.process_frame(&frame).unwrap();

    let stats = coordinator.statistics();
    assert_eq!(stats.packets_submitted, 2);
    assert_eq!(stats.dropped_packets, 2);
    assert_eq!(stats.events_decoded, 5);
    assert_eq!(coordinator.pending_jobs(), 2);
}

#[test]
fn test_output_order_and_process_numbering() {
    let config = config(2).with_output_frame_capacity(3);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();
    coordinator.configure_process(2, 1).unwrap();

    let fines: Vec<u64> = (0..5).map(|k| 0x0020_0000 + k).collect();
    let frame = FrameBuilder::new(&config)
        .packet(0, header(0, 0, 0), &payload(&fines, 0))
        .build()
        .unwrap();
    let output = run(&mut coordinator, &[frame, idle(&config)]);

    let channels: Vec<Channel> = output.iter().map(|frame| frame.channel).collect();
    assert_eq!(
        channels,
        [Channel::ALL, Channel::ALL].concat(),
        "frames are emitted timestamp, id, energy"
    );
    let numbers: Vec<u64> = output.iter().map(|frame| frame.frame_number).collect();
    assert_eq!(numbers, vec![1, 1, 1, 3, 3, 3]);
    let sizes: Vec<usize> = output.iter().map(OutputFrame::len).collect();
    assert_eq!(sizes, vec![3, 3, 3, 2, 2, 2]);

    assert_eq!(output[0].dataset_name(), "event_time_offset");
    assert_eq!(output[0].data_type(), DataType::Uint64);
    assert_eq!(output[1].data_type(), DataType::Uint32);
    assert!(output[2].dimensions.is_empty());
    assert_eq!(coordinator.statistics().output_frames, 6);
}

#[test]
fn test_pool_does_not_grow_on_repeat() {
    let config = config(4);
    let mut coordinator = ProcessCoordinator::new(config.clone()).unwrap();

    run(&mut coordinator, &interleaved_acquisition(&config));
    let after_first = coordinator.statistics().pool_allocated;
    assert!(after_first >= 8);

    run(&mut coordinator, &interleaved_acquisition(&config));
    assert_eq!(coordinator.statistics().pool_allocated, after_first);
    assert_eq!(coordinator.pending_jobs(), 0);
}
